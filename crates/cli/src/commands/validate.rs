//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::LoadProfile;
use contracts::{SinkType, StopCondition};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sink: String,
    sink_type: String,
    stop: String,
    has_query: bool,
    has_relay: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(profile) => {
            let warnings = collect_warnings(&profile);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", profile.version),
                    sink: profile.sink.name.clone(),
                    sink_type: format!("{:?}", profile.sink.sink_type),
                    stop: format!("{:?}", profile.emitter.stop),
                    has_query: profile.query.is_some(),
                    has_relay: profile.relay.is_some(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(profile: &LoadProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    if let StopCondition::Duration { seconds } = profile.emitter.stop {
        if seconds > 900 {
            warnings.push(format!(
                "emitter.stop runs {seconds}s - hosts with a 15 minute limit will kill the run"
            ));
        }
    }

    if profile.emitter.pacing.max_ms == 0 {
        warnings.push("emitter.pacing is 0 ms - batches are sent back to back".to_string());
    }

    if profile
        .generator
        .dropout
        .as_ref()
        .is_some_and(|rules| rules.is_empty())
    {
        warnings.push("generator.dropout is empty - every record carries every field".to_string());
    }

    if profile.sink.sink_type == SinkType::Mqtt && profile.mqtt.as_ref().is_some_and(|m| !m.tls) {
        warnings.push("mqtt.tls is disabled - broker connection is unauthenticated".to_string());
    }

    if profile.sink.sink_type != SinkType::Mongo && profile.query.is_some() && profile.mongo.is_none() {
        warnings.push("[query] is configured without [mongo] - `query` will fail".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sink: {} ({})", summary.sink, summary.sink_type);
            println!("  Stop: {}", summary.stop);
            println!("  Query section: {}", summary.has_query);
            println!("  Relay section: {}", summary.has_relay);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DelayRange;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_warnings_for_long_run_and_no_pacing() {
        let mut profile = LoadProfile::default();
        profile.emitter.stop = StopCondition::Duration { seconds: 3600 };
        profile.emitter.pacing = DelayRange::fixed(0);

        let warnings = collect_warnings(&profile);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("3600s"));
    }

    #[test]
    fn test_default_profile_has_no_warnings() {
        assert!(collect_warnings(&LoadProfile::default()).is_empty());
    }

    #[test]
    fn test_validate_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/profile.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_validate_reports_invalid_range() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[emitter]
batch_size = {{ min = 300, max = 100 }}
"#
        )
        .unwrap();

        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("emitter.batch_size"));
    }
}
