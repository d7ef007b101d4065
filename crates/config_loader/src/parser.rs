//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, LoadProfile};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<LoadProfile, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<LoadProfile, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<LoadProfile, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DroppableField, SinkType, StopCondition};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[sink]
name = "iot"
sink_type = "mqtt"
target = "topic"

[mqtt]
endpoint = "broker.local"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let profile = result.unwrap();
        assert_eq!(profile.sink.sink_type, SinkType::Mqtt);
        assert_eq!(profile.mqtt.unwrap().port, 8883);
        assert_eq!(profile.emitter.stop, StopCondition::Duration { seconds: 900 });
    }

    #[test]
    fn test_parse_toml_dropout_override() {
        let content = r#"
[[generator.dropout]]
fields = ["front_pme_shaft"]
probability = 0.9

[[generator.dropout]]
fields = ["front_linkage_position", "rear_linkage_position"]
probability = 0.1
"#;
        let profile = parse_toml(content).unwrap();
        let rules = profile.generator.dropout.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].fields, vec![DroppableField::FrontPmeShaft]);
        assert_eq!(rules[1].fields.len(), 2);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "run_id": "json-run",
            "emitter": { "stop": { "mode": "records", "count": 5900 } },
            "sink": { "name": "store", "sink_type": "mongo", "target": "telemetry" },
            "mongo": { "host": "cluster0", "user": "u", "password_secret": "S", "database": "agri" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let profile = result.unwrap();
        assert_eq!(profile.run_id.as_deref(), Some("json-run"));
        assert_eq!(profile.mongo.unwrap().scheme, "mongodb+srv");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
