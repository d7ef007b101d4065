//! `relay` command implementation.

use anyhow::{Context, Result};
use config_loader::{validate_relay, ConnectionNeeds};
use contracts::{HandlerResponse, StreamEvent};
use dispatcher::create_storage_sink;
use emitter::StreamRelay;
use std::path::Path;
use tracing::{info, warn};

use super::{bootstrap, load_profile};
use crate::cli::RelayArgs;
use crate::error::CliError;
use crate::report::print_relay_summary;

/// Execute the `relay` command
pub async fn run_relay(args: &RelayArgs) -> Result<HandlerResponse> {
    let profile = load_profile(&args.config)?;
    let relay_config = profile
        .relay
        .clone()
        .ok_or_else(|| CliError::missing_section("relay", "relay"))?;
    validate_relay(&profile).context("Invalid relay configuration")?;

    let event = read_event(&args.event)?;
    info!(
        records = event.records.len(),
        collection = %relay_config.collection,
        batch_size = relay_config.batch_size,
        "Stream event loaded"
    );

    let context = bootstrap(profile, ConnectionNeeds::mongo_only())?;
    let sink = create_storage_sink("relay", &relay_config.collection, &context)
        .await
        .context("Failed to create storage sink")?;

    let mut relay = StreamRelay::new(sink, relay_config.batch_size);
    let summary = relay.relay(&event).await;
    if let Err(e) = relay.close().await {
        warn!(error = %e, "Relay sink close failed");
    }
    print_relay_summary(&summary);

    Ok(HandlerResponse::ok(serde_json::to_string("Done")?))
}

fn read_event(path: &Path) -> Result<StreamEvent> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::event_read(path.display().to_string(), e.to_string()))?;
    let event = serde_json::from_str(&content)
        .map_err(|e| CliError::event_read(path.display().to_string(), e.to_string()))?;
    Ok(event)
}
