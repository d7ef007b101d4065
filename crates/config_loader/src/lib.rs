//! # Config Loader
//!
//! Configuration loading and bootstrap module.
//!
//! Responsibilities:
//! - Parse TOML/JSON profile files
//! - Overlay deployment environment variables
//! - Validate configuration legality
//! - Resolve secrets once into a `RuntimeContext`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let profile = ConfigLoader::load_from_path(Path::new("profile.toml")).unwrap();
//! println!("Sink: {}", profile.sink.name);
//! ```

mod context;
mod env;
mod parser;
mod secrets;
mod validator;

pub use context::{ConnectionNeeds, MongoCredentials, MqttConnection, MqttIdentity, RuntimeContext};
pub use contracts::LoadProfile;
pub use env::{apply_overrides, apply_process_env};
pub use parser::ConfigFormat;
pub use secrets::{
    fetch_password, password_from_secret, secret_source_from_config, EnvSecretSource,
    FileSecretSource, SecretSource, StaticSecretSource,
};
pub use validator::{validate, validate_query, validate_relay};

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json) and
    /// applies overrides from the process environment.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Invalid environment override
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<LoadProfile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str_with_env(&content, format, |name| std::env::var(name).ok())
    }

    /// Parse a file and apply the environment overlay without validating
    ///
    /// For callers that adjust the profile before calling [`validate`].
    pub fn parse_from_path(path: &Path) -> Result<LoadProfile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::parse_with_env(&content, format, |name| std::env::var(name).ok())
    }

    /// Load configuration from string (no environment overlay)
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<LoadProfile, ContractError> {
        Self::parse_and_validate(content, format, |_| None)
    }

    /// Load configuration from string with an explicit environment lookup
    pub fn load_from_str_with_env<F>(
        content: &str,
        format: ConfigFormat,
        lookup: F,
    ) -> Result<LoadProfile, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::parse_and_validate(content, format, lookup)
    }

    /// Serialize LoadProfile to TOML string
    pub fn to_toml(profile: &LoadProfile) -> Result<String, ContractError> {
        toml::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize LoadProfile to JSON string
    pub fn to_json(profile: &LoadProfile) -> Result<String, ContractError> {
        serde_json::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse, overlay and validate configuration content
    fn parse_and_validate<F>(
        content: &str,
        format: ConfigFormat,
        lookup: F,
    ) -> Result<LoadProfile, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = Self::parse_with_env(content, format, lookup)?;
        validator::validate(&profile)?;
        Ok(profile)
    }

    fn parse_with_env<F>(
        content: &str,
        format: ConfigFormat,
        lookup: F,
    ) -> Result<LoadProfile, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut profile = parser::parse(content, format)?;
        let applied = env::apply_overrides(&mut profile, lookup)?;
        if !applied.is_empty() {
            debug!(overrides = ?applied, "Environment overrides applied");
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkType, StopCondition};
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
run_id = "bench-1"

[generator]
seed = 7

[emitter]
batch_size = { min = 180, max = 220 }
stop = { mode = "batches", count = 100 }

[sink]
name = "iot"
sink_type = "mqtt"
target = "agri/telemetry"

[mqtt]
endpoint = "broker.local"
ca_path = "certs/root-ca.pem"
certificate_path = "certs/device.pem.crt"
private_key_secret = "IOT_PRIVATE_KEY"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let profile = result.unwrap();
        assert_eq!(profile.sink.sink_type, SinkType::Mqtt);
        assert_eq!(profile.emitter.stop, StopCondition::Batches { count: 100 });
        assert_eq!(profile.generator.seed, Some(7));
    }

    #[test]
    fn test_round_trip_toml() {
        let profile = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&profile).unwrap();
        let profile2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(profile.run_id, profile2.run_id);
        assert_eq!(profile.emitter.batch_size, profile2.emitter.batch_size);
    }

    #[test]
    fn test_round_trip_json() {
        let profile = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&profile).unwrap();
        let profile2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(profile.sink.target, profile2.sink.target);
    }

    #[test]
    fn test_env_overlay_runs_before_validation() {
        // topic missing in file, supplied by environment
        let content = r#"
[sink]
name = "iot"
sink_type = "mqtt"

[mqtt]
tls = false
"#;
        assert!(ConfigLoader::load_from_str(content, ConfigFormat::Toml).is_err());

        let profile = ConfigLoader::load_from_str_with_env(content, ConfigFormat::Toml, |name| {
            match name {
                "IOT_TOPIC" => Some("agri/telemetry".to_string()),
                "IOT_ENDPOINT" => Some("localhost".to_string()),
                _ => None,
            }
        })
        .unwrap();
        assert_eq!(profile.sink.target, "agri/telemetry");
        assert_eq!(profile.mqtt.unwrap().endpoint, "localhost");
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[sink]\nname = \"log\"\nsink_type = \"log\"\n")
            .unwrap();
        let profile = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(profile.sink.sink_type, SinkType::Log);

        let unknown = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(unknown.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_parse_from_path_defers_validation() {
        // mqtt sink with no [mqtt] section
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[sink]\nname = \"iot\"\nsink_type = \"mqtt\"\ntarget = \"t\"\n")
            .unwrap();

        assert!(ConfigLoader::load_from_path(file.path()).is_err());

        let mut profile = ConfigLoader::parse_from_path(file.path()).unwrap();
        assert!(validate(&profile).is_err());

        profile.sink.sink_type = SinkType::Log;
        assert!(validate(&profile).is_ok());
    }
}
