//! Environment overlay
//!
//! Deployed instances receive their targets and credential references
//! through environment variables. Values found here override the profile
//! file; absent variables leave the file value untouched.

use std::path::PathBuf;

use contracts::{ContractError, LoadProfile, SinkType};
use tracing::debug;

pub const IOT_TOPIC: &str = "IOT_TOPIC";
pub const IOT_ENDPOINT: &str = "IOT_ENDPOINT";
pub const CERTIFICATE_PATH: &str = "CERTIFICATE_PATH";
pub const ROOT_CA_PATH: &str = "ROOT_CA_PATH";
pub const PRIVATE_KEY_SECRET_ARN: &str = "PRIVATE_KEY_SECRET_ARN";
pub const MONGODB_SECRET_ARN: &str = "MONGODB_SECRET_ARN";
pub const MONGODB_HOST: &str = "MONGODB_HOST";
pub const MONGODB_USER: &str = "MONGODB_USER";
pub const MONGODB_DB: &str = "MONGODB_DB";
pub const MONGODB_COLLECTION: &str = "MONGODB_COLLECTION";
pub const VEHICLE_ID: &str = "VEHICLE_ID";

/// Apply overrides from the process environment
pub fn apply_process_env(profile: &mut LoadProfile) -> Result<Vec<&'static str>, ContractError> {
    apply_overrides(profile, |name| std::env::var(name).ok())
}

/// Apply overrides from an arbitrary lookup
///
/// Returns the names of the variables that were applied.
pub fn apply_overrides<F>(
    profile: &mut LoadProfile,
    lookup: F,
) -> Result<Vec<&'static str>, ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let mut get = |name: &'static str| {
        let value = lookup(name).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            debug!(var = name, "Environment override applied");
            applied.push(name);
        }
        value
    };

    if let Some(topic) = get(IOT_TOPIC) {
        if profile.sink.sink_type == SinkType::Mqtt {
            profile.sink.target = topic;
        }
    }
    if let Some(endpoint) = get(IOT_ENDPOINT) {
        profile.mqtt.get_or_insert_with(Default::default).endpoint = endpoint;
    }
    if let Some(path) = get(CERTIFICATE_PATH) {
        profile.mqtt.get_or_insert_with(Default::default).certificate_path =
            Some(PathBuf::from(path));
    }
    if let Some(path) = get(ROOT_CA_PATH) {
        profile.mqtt.get_or_insert_with(Default::default).ca_path = Some(PathBuf::from(path));
    }
    if let Some(secret) = get(PRIVATE_KEY_SECRET_ARN) {
        profile.mqtt.get_or_insert_with(Default::default).private_key_secret = Some(secret);
    }

    if let Some(secret) = get(MONGODB_SECRET_ARN) {
        profile.mongo.get_or_insert_with(Default::default).password_secret = secret;
    }
    if let Some(host) = get(MONGODB_HOST) {
        profile.mongo.get_or_insert_with(Default::default).host = host;
    }
    if let Some(user) = get(MONGODB_USER) {
        profile.mongo.get_or_insert_with(Default::default).user = user;
    }
    if let Some(database) = get(MONGODB_DB) {
        profile.mongo.get_or_insert_with(Default::default).database = database;
    }
    if let Some(collection) = get(MONGODB_COLLECTION) {
        if profile.sink.sink_type == SinkType::Mongo {
            profile.sink.target = collection.clone();
        }
        if let Some(query) = profile.query.as_mut() {
            query.collection = collection.clone();
        }
        if let Some(relay) = profile.relay.as_mut() {
            relay.collection = collection;
        }
    }

    if let Some(raw) = get(VEHICLE_ID) {
        let vehicle_id: i32 = raw.trim().parse().map_err(|_| {
            ContractError::config_validation(VEHICLE_ID, format!("not an integer: '{raw}'"))
        })?;
        if let Some(query) = profile.query.as_mut() {
            query.vehicle_id = Some(vehicle_id);
        }
    }

    Ok(applied)
}
