//! Secret retrieval
//!
//! One blocking fetch per secret at process start. The result is copied
//! into the `RuntimeContext` and never fetched again.

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::{ContractError, SecretSourceKind, SecretsConfig};
use tracing::{debug, instrument};

/// Backend that resolves a secret id to its secret string
pub trait SecretSource: Send + Sync {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// Fetch the raw secret string
    fn fetch(&self, secret_id: &str) -> Result<String, ContractError>;
}

/// Secret id names an environment variable
#[derive(Debug, Default)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn name(&self) -> &str {
        "env"
    }

    fn fetch(&self, secret_id: &str) -> Result<String, ContractError> {
        std::env::var(secret_id).map_err(|e| ContractError::secret(secret_id, e.to_string()))
    }
}

/// Secret id names a file inside a directory (e.g. mounted secrets)
///
/// Characters that are not valid in file names (`/`, `:`) are replaced
/// with `_`, so ARN-style ids map to flat file names.
#[derive(Debug)]
pub struct FileSecretSource {
    dir: PathBuf,
}

impl FileSecretSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, secret_id: &str) -> PathBuf {
        let file_name: String = secret_id
            .chars()
            .map(|c| if c == '/' || c == ':' { '_' } else { c })
            .collect();
        self.dir.join(file_name)
    }
}

impl SecretSource for FileSecretSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, secret_id: &str) -> Result<String, ContractError> {
        let path = self.path_for(secret_id);
        std::fs::read_to_string(&path)
            .map(|s| s.trim_end_matches(['\n', '\r']).to_string())
            .map_err(|e| ContractError::secret(secret_id, format!("{}: {e}", path.display())))
    }
}

/// Fixed secrets held in memory
#[derive(Debug, Default)]
pub struct StaticSecretSource {
    secrets: HashMap<String, String>,
}

impl StaticSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecretSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, secret_id: &str) -> Result<String, ContractError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| ContractError::secret(secret_id, "not found"))
    }
}

/// Build the configured secret backend
pub fn secret_source_from_config(
    config: &SecretsConfig,
) -> Result<Box<dyn SecretSource>, ContractError> {
    match config.source {
        SecretSourceKind::Env => Ok(Box::new(EnvSecretSource)),
        SecretSourceKind::File => {
            let dir = config.dir.clone().ok_or_else(|| {
                ContractError::config_validation("secrets.dir", "required for file secrets")
            })?;
            Ok(Box::new(FileSecretSource::new(dir)))
        }
    }
}

/// Fetch a JSON secret and extract its `password` field
#[instrument(name = "secrets_fetch_password", skip(source), fields(backend = source.name()))]
pub fn fetch_password(source: &dyn SecretSource, secret_id: &str) -> Result<String, ContractError> {
    let raw = source.fetch(secret_id)?;
    let password = password_from_secret(secret_id, &raw)?;
    debug!(secret_id, "Password secret resolved");
    Ok(password)
}

/// Extract the `password` field from a JSON secret string
pub fn password_from_secret(secret_id: &str, raw: &str) -> Result<String, ContractError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ContractError::secret(secret_id, format!("not a JSON object: {e}")))?;

    value
        .get("password")
        .and_then(|p| p.as_str())
        .map(str::to_string)
        .ok_or_else(|| ContractError::secret(secret_id, "missing 'password' field"))
}
