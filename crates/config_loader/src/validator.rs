//! 配置校验模块
//!
//! 校验规则：
//! - vehicle_ids / batch_size / pacing / start_jitter 范围有序
//! - batch_size.min >= 1
//! - dropout 概率在 [0, 1] 内
//! - sink 名称与目标齐全，所需连接段存在
//! - TLS 开启时证书路径与私钥密钥 ID 齐全
//! - query / relay 段的集合与数值合法

use contracts::{
    ContractError, DelayRange, LoadProfile, MongoConfig, QueryConfig, RelayConfig, SinkType,
    StopCondition,
};

/// 校验 LoadProfile 配置 (写负载)
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(profile: &LoadProfile) -> Result<(), ContractError> {
    validate_generator(profile)?;
    validate_emitter(profile)?;
    validate_sink(profile)?;
    validate_connections(profile)?;
    if let Some(query) = profile.query_config() {
        validate_query_section(&query)?;
    }
    if let Some(relay) = &profile.relay {
        validate_relay_section(relay)?;
    }
    Ok(())
}

/// 校验查询命令所需配置
pub fn validate_query(profile: &LoadProfile) -> Result<(), ContractError> {
    let query = profile
        .query_config()
        .ok_or_else(|| ContractError::config_validation("query", "section is required"))?;
    validate_query_section(&query)?;
    require_mongo(profile.mongo.as_ref())
}

/// 校验流转发命令所需配置
pub fn validate_relay(profile: &LoadProfile) -> Result<(), ContractError> {
    let relay = profile
        .relay
        .as_ref()
        .ok_or_else(|| ContractError::config_validation("relay", "section is required"))?;
    validate_relay_section(relay)?;
    require_mongo(profile.mongo.as_ref())
}

/// 校验记录生成配置
fn validate_generator(profile: &LoadProfile) -> Result<(), ContractError> {
    let ids = &profile.generator.vehicle_ids;
    if ids.min > ids.max {
        return Err(ContractError::config_validation(
            "generator.vehicle_ids",
            format!("min ({}) must be <= max ({})", ids.min, ids.max),
        ));
    }

    if let Some(rules) = &profile.generator.dropout {
        for (idx, rule) in rules.iter().enumerate() {
            if !(0.0..=1.0).contains(&rule.probability) {
                return Err(ContractError::config_validation(
                    format!("generator.dropout[{idx}].probability"),
                    format!("must be within [0, 1], got {}", rule.probability),
                ));
            }
            if rule.fields.is_empty() {
                return Err(ContractError::config_validation(
                    format!("generator.dropout[{idx}].fields"),
                    "at least one field is required",
                ));
            }
        }
    }
    Ok(())
}

/// 校验发送节奏
fn validate_emitter(profile: &LoadProfile) -> Result<(), ContractError> {
    let emitter = &profile.emitter;

    if emitter.batch_size.min == 0 {
        return Err(ContractError::config_validation(
            "emitter.batch_size.min",
            "batch size must be >= 1",
        ));
    }
    if emitter.batch_size.min > emitter.batch_size.max {
        return Err(ContractError::config_validation(
            "emitter.batch_size",
            format!(
                "min ({}) must be <= max ({})",
                emitter.batch_size.min, emitter.batch_size.max
            ),
        ));
    }

    validate_delay("emitter.pacing", &emitter.pacing)?;
    if let Some(jitter) = &emitter.start_jitter {
        validate_delay("emitter.start_jitter", jitter)?;
    }

    if let StopCondition::Records { count } | StopCondition::Batches { count } = emitter.stop {
        if count == 0 {
            return Err(ContractError::config_validation(
                "emitter.stop.count",
                "count must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_delay(field: &str, delay: &DelayRange) -> Result<(), ContractError> {
    if delay.min_ms > delay.max_ms {
        return Err(ContractError::config_validation(
            field,
            format!(
                "min_ms ({}) must be <= max_ms ({})",
                delay.min_ms, delay.max_ms
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(profile: &LoadProfile) -> Result<(), ContractError> {
    let sink = &profile.sink;
    if sink.name.is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    let needs_target = matches!(
        sink.sink_type,
        SinkType::File | SinkType::Mqtt | SinkType::Mongo
    );
    if needs_target && sink.target.trim().is_empty() {
        let what = match sink.sink_type {
            SinkType::File => "file path",
            SinkType::Mqtt => "topic",
            _ => "collection",
        };
        return Err(ContractError::config_validation(
            "sink.target",
            format!("{what} is required for {:?} sink", sink.sink_type),
        ));
    }
    Ok(())
}

/// 校验 sink 所需的连接段
fn validate_connections(profile: &LoadProfile) -> Result<(), ContractError> {
    match profile.sink.sink_type {
        SinkType::Mqtt => {
            let mqtt = profile
                .mqtt
                .as_ref()
                .ok_or_else(|| ContractError::config_validation("mqtt", "section is required"))?;
            if mqtt.endpoint.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "mqtt.endpoint",
                    "endpoint cannot be empty",
                ));
            }
            if mqtt.max_packet_bytes == 0 {
                return Err(ContractError::config_validation(
                    "mqtt.max_packet_bytes",
                    "must be > 0",
                ));
            }
            if mqtt.tls {
                if mqtt.ca_path.is_none() {
                    return Err(ContractError::config_validation(
                        "mqtt.ca_path",
                        "required when tls = true",
                    ));
                }
                if mqtt.certificate_path.is_none() {
                    return Err(ContractError::config_validation(
                        "mqtt.certificate_path",
                        "required when tls = true",
                    ));
                }
                if mqtt.private_key_secret.as_deref().is_none_or(str::is_empty) {
                    return Err(ContractError::config_validation(
                        "mqtt.private_key_secret",
                        "required when tls = true",
                    ));
                }
            }
            Ok(())
        }
        SinkType::Mongo => require_mongo(profile.mongo.as_ref()),
        SinkType::Log | SinkType::File => Ok(()),
    }
}

fn require_mongo(mongo: Option<&MongoConfig>) -> Result<(), ContractError> {
    let mongo =
        mongo.ok_or_else(|| ContractError::config_validation("mongo", "section is required"))?;

    for (field, value) in [
        ("mongo.host", &mongo.host),
        ("mongo.user", &mongo.user),
        ("mongo.password_secret", &mongo.password_secret),
        ("mongo.database", &mongo.database),
    ] {
        if value.trim().is_empty() {
            return Err(ContractError::config_validation(field, "cannot be empty"));
        }
    }
    Ok(())
}

fn validate_query_section(query: &QueryConfig) -> Result<(), ContractError> {
    if query.collection.trim().is_empty() {
        return Err(ContractError::config_validation(
            "query.collection",
            "collection cannot be empty",
        ));
    }
    if query.window_minutes == 0 {
        return Err(ContractError::config_validation(
            "query.window_minutes",
            "window must be > 0",
        ));
    }
    if let Some(join) = &query.join {
        if join.collection.trim().is_empty() {
            return Err(ContractError::config_validation(
                "query.join.collection",
                "collection cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_relay_section(relay: &RelayConfig) -> Result<(), ContractError> {
    if relay.collection.trim().is_empty() {
        return Err(ContractError::config_validation(
            "relay.collection",
            "collection cannot be empty",
        ));
    }
    if relay.batch_size == 0 {
        return Err(ContractError::config_validation(
            "relay.batch_size",
            "batch size must be >= 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BatchSizeRange, DropRule, DroppableField, JoinConfig, MqttConfig, SinkConfig,
        VehicleIdRange,
    };
    use std::path::PathBuf;

    fn mongo_profile() -> LoadProfile {
        LoadProfile {
            sink: SinkConfig {
                name: "store".into(),
                sink_type: SinkType::Mongo,
                target: "telemetry".into(),
            },
            mongo: Some(MongoConfig {
                host: "cluster0".into(),
                user: "loader".into(),
                password_secret: "S".into(),
                database: "agri".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mqtt_profile() -> LoadProfile {
        LoadProfile {
            sink: SinkConfig {
                name: "iot".into(),
                sink_type: SinkType::Mqtt,
                target: "agri/telemetry".into(),
            },
            mqtt: Some(MqttConfig {
                endpoint: "broker".into(),
                ca_path: Some(PathBuf::from("ca.pem")),
                certificate_path: Some(PathBuf::from("cert.pem")),
                private_key_secret: Some("KEY".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&LoadProfile::default()).is_ok());
        assert!(validate(&mongo_profile()).is_ok());
        assert!(validate(&mqtt_profile()).is_ok());
    }

    #[test]
    fn test_vehicle_range_inverted() {
        let mut profile = LoadProfile::default();
        profile.generator.vehicle_ids = VehicleIdRange { min: 10, max: 1 };
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("generator.vehicle_ids"));
    }

    #[test]
    fn test_dropout_probability_out_of_range() {
        let mut profile = LoadProfile::default();
        profile.generator.dropout = Some(vec![DropRule::single(
            DroppableField::Temperature,
            1.5,
        )]);
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("[0, 1]"));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut profile = LoadProfile::default();
        profile.emitter.batch_size = BatchSizeRange::fixed(0);
        assert!(validate(&profile).is_err());
    }

    #[test]
    fn test_pacing_inverted() {
        let mut profile = LoadProfile::default();
        profile.emitter.pacing = DelayRange {
            min_ms: 100,
            max_ms: 10,
        };
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("emitter.pacing"));
    }

    #[test]
    fn test_mqtt_requires_topic() {
        let mut profile = mqtt_profile();
        profile.sink.target.clear();
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn test_mqtt_tls_requires_private_key() {
        let mut profile = mqtt_profile();
        profile.mqtt.as_mut().unwrap().private_key_secret = None;
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("private_key_secret"));

        profile.mqtt.as_mut().unwrap().tls = false;
        assert!(validate(&profile).is_ok());
    }

    #[test]
    fn test_mongo_sink_requires_section() {
        let mut profile = mongo_profile();
        profile.mongo = None;
        let err = validate(&profile).unwrap_err();
        assert!(err.to_string().contains("mongo"));
    }

    #[test]
    fn test_validate_query_requires_section_and_mongo() {
        let mut profile = mongo_profile();
        assert!(validate_query(&profile).is_err());

        profile.query = Some(QueryConfig::default());
        assert!(validate_query(&profile).is_ok());

        profile.mongo = None;
        assert!(validate_query(&profile).is_err());
    }

    #[test]
    fn test_query_join_needs_collection() {
        let mut profile = mongo_profile();
        profile.query = Some(QueryConfig {
            join: Some(JoinConfig {
                collection: String::new(),
                local_field: "vehicleid".into(),
                foreign_field: "vehicleid".into(),
                as_field: "vehicle".into(),
            }),
            ..Default::default()
        });
        let err = validate_query(&profile).unwrap_err();
        assert!(err.to_string().contains("query.join.collection"));
    }

    #[test]
    fn test_validate_relay() {
        let mut profile = mongo_profile();
        profile.relay = Some(RelayConfig {
            collection: "telemetry".into(),
            batch_size: 0,
        });
        assert!(validate_relay(&profile).is_err());

        profile.relay.as_mut().unwrap().batch_size = 50;
        assert!(validate_relay(&profile).is_ok());
    }
}
