//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Agri Loadgen - synthetic agricultural telemetry load generator
#[derive(Parser, Debug)]
#[command(
    name = "agri-loadgen",
    author,
    version,
    about = "Synthetic agricultural vehicle telemetry load generator",
    long_about = "Generates synthetic tractor telemetry and pushes it in paced batches to an \n\
                  MQTT broker or a MongoDB collection. Also relays stream payloads into \n\
                  MongoDB and runs trailing-window aggregation read load."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AGRI_LOADGEN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "AGRI_LOADGEN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and send telemetry batches until the stop condition holds
    Run(RunArgs),

    /// Relay a stream event's payloads into the document store
    Relay(RelayArgs),

    /// Run trailing-window average speed queries
    Query(QueryArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "AGRI_LOADGEN_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the run id used as record id suffix
    #[arg(long, env = "AGRI_LOADGEN_RUN_ID")]
    pub run_id: Option<String>,

    /// Stop after exactly N batches
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), conflicts_with_all = ["records", "duration_secs"])]
    pub batches: Option<u64>,

    /// Stop after exactly N records
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), conflicts_with = "duration_secs")]
    pub records: Option<u64>,

    /// Stop after S seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration_secs: Option<u64>,

    /// Log batches instead of sending them (no connections are opened)
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "AGRI_LOADGEN_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `relay` command
#[derive(Parser, Debug)]
pub struct RelayArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "AGRI_LOADGEN_CONFIG"
    )]
    pub config: PathBuf,

    /// Stream event JSON file (`{"Records":[{"kinesis":{"data":"..."}}]}`)
    #[arg(short, long)]
    pub event: PathBuf,
}

/// Arguments for the `query` command
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "AGRI_LOADGEN_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the number of executions
    #[arg(long)]
    pub executions: Option<u32>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "AGRI_LOADGEN_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
