//! `query` command implementation.

use anyhow::{Context, Result};
use config_loader::{validate_query, ConnectionNeeds, MongoCredentials};
use contracts::HandlerResponse;
use query::{MongoSpeedSource, QueryRunner};
use tracing::info;

use super::{bootstrap, init_metrics, load_profile};
use crate::cli::QueryArgs;
use crate::error::CliError;
use crate::report::print_query_summary;
use crate::shutdown::shutdown_channel;

/// Execute the `query` command
pub async fn run_query(args: &QueryArgs) -> Result<HandlerResponse> {
    let profile = load_profile(&args.config)?;
    let mut query_config = profile
        .query_config()
        .ok_or_else(|| CliError::missing_section("query", "query"))?;
    validate_query(&profile).context("Invalid query configuration")?;

    if let Some(executions) = args.executions {
        info!(executions, "Overriding executions from CLI");
        query_config.executions = executions;
    }

    init_metrics(args.metrics_port)?;

    let context = bootstrap(profile, ConnectionNeeds::mongo_only())?;
    let credentials: &MongoCredentials = context
        .mongo
        .as_ref()
        .ok_or_else(|| CliError::missing_section("query", "mongo"))?;

    let source = MongoSpeedSource::connect(
        credentials,
        &query_config.collection,
        query_config.mode,
        query_config.join.clone(),
    )
    .await
    .context("Failed to connect query source")?;

    info!(
        collection = %query_config.collection,
        vehicle_id = ?query_config.vehicle_id,
        window_minutes = query_config.window_minutes,
        mode = ?query_config.mode,
        "Starting query runner..."
    );

    let summary = QueryRunner::new(source, query_config)
        .with_shutdown(shutdown_channel())
        .run()
        .await;
    print_query_summary(&summary);

    Ok(HandlerResponse::ok(format!(
        "Completed {} queries ({} failed)",
        summary.executions, summary.failures
    )))
}
