//! Command implementations.

mod info;
mod query;
mod relay;
mod run;
mod validate;

pub use info::run_info;
pub use query::run_query;
pub use relay::run_relay;
pub use run::run_emitter;
pub use validate::run_validate;

use anyhow::{Context, Result};
use config_loader::{secret_source_from_config, ConnectionNeeds, LoadProfile, RuntimeContext};
use std::path::Path;
use tracing::info;

use crate::error::CliError;

/// Load, overlay and validate the profile at `path`
fn load_profile(path: &Path) -> Result<LoadProfile> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Parse and overlay the profile at `path`, leaving validation to the caller
fn read_profile(path: &Path) -> Result<LoadProfile> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::parse_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Resolve secrets and connections once for this process
fn bootstrap(profile: LoadProfile, needs: ConnectionNeeds) -> Result<RuntimeContext> {
    let secrets = secret_source_from_config(&profile.secrets)
        .context("Failed to configure secret source")?;
    RuntimeContext::bootstrap(profile, secrets.as_ref(), needs)
        .context("Failed to bootstrap runtime context")
}

/// Start the Prometheus listener when a port is given
fn init_metrics(port: u16) -> Result<()> {
    if port != 0 {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }
    Ok(())
}
