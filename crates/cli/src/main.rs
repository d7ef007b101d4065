//! # Agri Loadgen CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 写负载 (run)、流转发 (relay)、读负载 (query)
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod report;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use contracts::HandlerResponse;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_emitter, run_info, run_query, run_relay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Agri Loadgen CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_emitter(args).await.and_then(print_response),
        Commands::Relay(args) => run_relay(args).await.and_then(print_response),
        Commands::Query(args) => run_query(args).await.and_then(print_response),
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}

/// Every workload command ends with the fixed response shape on stdout
fn print_response(response: HandlerResponse) -> Result<()> {
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
