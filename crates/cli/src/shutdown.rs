//! Ctrl+C / SIGTERM handling
//!
//! The signal is published on a watch channel; loops stop before their next
//! step and the in-flight batch is abandoned.

use tokio::sync::watch;
use tracing::warn;

/// Spawn the signal listener and return the receiver side
pub fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("Received shutdown signal, stopping...");
        let _ = tx.send(true);
    });
    rx
}

/// Resolves on Ctrl+C or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
