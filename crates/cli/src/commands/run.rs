//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConnectionNeeds, LoadProfile};
use contracts::{HandlerResponse, SinkConfig, SinkType, StopCondition};
use dispatcher::create_sink;
use emitter::Emitter;
use generator::TelemetryGenerator;
use tracing::info;

use super::{bootstrap, init_metrics, read_profile};
use crate::cli::RunArgs;
use crate::report::print_run_summary;
use crate::shutdown::shutdown_channel;

/// Execute the `run` command
pub async fn run_emitter(args: &RunArgs) -> Result<HandlerResponse> {
    let profile = prepare_profile(args)?;

    info!(
        sink = %profile.sink.name,
        sink_type = ?profile.sink.sink_type,
        target = %profile.sink.target,
        stop = ?profile.emitter.stop,
        "Configuration loaded"
    );

    init_metrics(args.metrics_port)?;

    let sink_type = profile.sink.sink_type;
    let context = bootstrap(profile, ConnectionNeeds::for_sink(sink_type))?;

    let sink = create_sink(&context.profile.sink, &context)
        .await
        .context("Failed to create sink")?;

    let generator = TelemetryGenerator::new(&context.profile.generator);
    let emitter = Emitter::new(
        generator,
        sink,
        context.profile.emitter.clone(),
        context.run_id.clone(),
    )
    .with_shutdown(shutdown_channel());

    info!(run_id = %context.run_id, "Starting emitter...");
    let summary = emitter.run().await;

    info!(
        records_sent = summary.records_sent,
        batches_sent = summary.batches_sent,
        duration_secs = summary.duration.as_secs_f64(),
        records_per_sec = format!("{:.1}", summary.records_per_sec()),
        "Emitter completed"
    );
    print_run_summary(&summary);

    Ok(HandlerResponse::ok(response_body(sink_type)))
}

/// CLI overrides go in before validation so `--dry-run` drops the
/// connection requirements of the configured sink
fn prepare_profile(args: &RunArgs) -> Result<LoadProfile> {
    let mut profile = read_profile(&args.config)?;
    apply_cli_overrides(&mut profile, args);
    config_loader::validate(&profile).context("Invalid configuration")?;
    Ok(profile)
}

fn apply_cli_overrides(profile: &mut LoadProfile, args: &RunArgs) {
    if let Some(ref run_id) = args.run_id {
        info!(run_id = %run_id, "Overriding run id from CLI");
        profile.run_id = Some(run_id.clone());
    }

    let stop = match (args.batches, args.records, args.duration_secs) {
        (Some(count), _, _) => Some(StopCondition::Batches { count }),
        (_, Some(count), _) => Some(StopCondition::Records { count }),
        (_, _, Some(seconds)) => Some(StopCondition::Duration { seconds }),
        _ => None,
    };
    if let Some(stop) = stop {
        info!(stop = ?stop, "Overriding stop condition from CLI");
        profile.emitter.stop = stop;
    }

    if args.dry_run {
        info!(sink = %profile.sink.name, "Dry run mode - batches are logged, not sent");
        profile.sink = SinkConfig {
            name: format!("{}-dry-run", profile.sink.name),
            sink_type: SinkType::Log,
            target: String::new(),
        };
    }
}

fn response_body(sink_type: SinkType) -> &'static str {
    match sink_type {
        SinkType::Mqtt => "Successfully sent messages",
        SinkType::Mongo => "Successfully inserted documents!",
        SinkType::File | SinkType::Log => "Successfully generated records",
    }
}
