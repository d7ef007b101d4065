//! RuntimeContext - one-time process bootstrap
//!
//! Resolves the run id, reads TLS material and fetches credentials exactly
//! once. The resulting context is immutable and is handed to sinks and
//! runners explicitly.

use std::fmt;
use std::path::Path;

use contracts::{ContractError, LoadProfile, MongoConfig, MqttConfig, SinkType};
use tracing::{info, instrument};

use crate::secrets::{fetch_password, SecretSource};

/// Connections a command needs credentials for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionNeeds {
    pub mqtt: bool,
    pub mongo: bool,
}

impl ConnectionNeeds {
    /// Needs implied by the configured sink
    pub fn for_sink(sink_type: SinkType) -> Self {
        Self {
            mqtt: sink_type == SinkType::Mqtt,
            mongo: sink_type == SinkType::Mongo,
        }
    }

    /// Storage connection only (query and relay)
    pub fn mongo_only() -> Self {
        Self {
            mqtt: false,
            mongo: true,
        }
    }
}

/// TLS client identity for the broker
#[derive(Clone)]
pub struct MqttIdentity {
    pub ca: Vec<u8>,
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl fmt::Debug for MqttIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttIdentity")
            .field("ca_bytes", &self.ca.len())
            .field("certificate_bytes", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Resolved broker connection settings
#[derive(Debug, Clone)]
pub struct MqttConnection {
    pub config: MqttConfig,
    pub client_id: String,
    /// `None` when TLS is disabled
    pub identity: Option<MqttIdentity>,
}

/// Resolved document store credentials
#[derive(Clone)]
pub struct MongoCredentials {
    pub scheme: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl MongoCredentials {
    /// Connection string without user info; credentials are passed separately
    pub fn connection_uri(&self) -> String {
        format!("{}://{}/{}", self.scheme, self.host, self.database)
    }
}

impl fmt::Debug for MongoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoCredentials")
            .field("uri", &self.connection_uri())
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable per-process context
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub run_id: String,
    pub profile: LoadProfile,
    pub mqtt: Option<MqttConnection>,
    pub mongo: Option<MongoCredentials>,
}

impl RuntimeContext {
    /// Build the context, fetching only what `needs` asks for
    ///
    /// # Errors
    /// Any missing section, unreadable file or unavailable secret is fatal.
    #[instrument(name = "runtime_context_bootstrap", skip(profile, secrets))]
    pub fn bootstrap(
        profile: LoadProfile,
        secrets: &dyn SecretSource,
        needs: ConnectionNeeds,
    ) -> Result<Self, ContractError> {
        let run_id = profile
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mqtt = if needs.mqtt {
            let config = profile
                .mqtt
                .as_ref()
                .ok_or_else(|| ContractError::config_validation("mqtt", "section is required"))?;
            Some(resolve_mqtt(config, &run_id, secrets)?)
        } else {
            None
        };

        let mongo = if needs.mongo {
            let config = profile
                .mongo
                .as_ref()
                .ok_or_else(|| ContractError::config_validation("mongo", "section is required"))?;
            Some(resolve_mongo(config, secrets)?)
        } else {
            None
        };

        info!(
            run_id = %run_id,
            mqtt = mqtt.is_some(),
            mongo = mongo.is_some(),
            "Runtime context initialized"
        );

        Ok(Self {
            run_id,
            profile,
            mqtt,
            mongo,
        })
    }
}

fn resolve_mqtt(
    config: &MqttConfig,
    run_id: &str,
    secrets: &dyn SecretSource,
) -> Result<MqttConnection, ContractError> {
    let client_id = config
        .client_id
        .clone()
        .unwrap_or_else(|| run_id.to_string());

    let identity = if config.tls {
        let ca = read_required(config.ca_path.as_deref(), "mqtt.ca_path")?;
        let certificate = read_required(config.certificate_path.as_deref(), "mqtt.certificate_path")?;
        let key_id = config.private_key_secret.as_deref().ok_or_else(|| {
            ContractError::config_validation("mqtt.private_key_secret", "required when tls = true")
        })?;
        let private_key = secrets.fetch(key_id)?.into_bytes();
        Some(MqttIdentity {
            ca,
            certificate,
            private_key,
        })
    } else {
        None
    };

    Ok(MqttConnection {
        config: config.clone(),
        client_id,
        identity,
    })
}

fn resolve_mongo(
    config: &MongoConfig,
    secrets: &dyn SecretSource,
) -> Result<MongoCredentials, ContractError> {
    let password = fetch_password(secrets, &config.password_secret)?;
    Ok(MongoCredentials {
        scheme: config.scheme.clone(),
        host: config.host.clone(),
        user: config.user.clone(),
        password,
        database: config.database.clone(),
    })
}

fn read_required(path: Option<&Path>, field: &str) -> Result<Vec<u8>, ContractError> {
    let path =
        path.ok_or_else(|| ContractError::config_validation(field, "required when tls = true"))?;
    std::fs::read(path).map_err(|e| {
        ContractError::config_validation(field, format!("cannot read {}: {e}", path.display()))
    })
}
