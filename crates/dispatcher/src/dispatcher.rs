//! Sink construction from configuration

use config_loader::RuntimeContext;
use contracts::{Batch, ContractError, RecordSink, SendReport, SinkConfig, SinkType};
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::sinks::{FileSink, LogSink, MongoSink, MqttSink, MqttSinkConfig};

/// Sink selected at startup from `SinkConfig::sink_type`
pub enum ConfiguredSink {
    Log(LogSink),
    File(FileSink),
    Mqtt(MqttSink),
    Mongo(MongoSink),
}

impl ConfiguredSink {
    pub fn sink_type(&self) -> SinkType {
        match self {
            Self::Log(_) => SinkType::Log,
            Self::File(_) => SinkType::File,
            Self::Mqtt(_) => SinkType::Mqtt,
            Self::Mongo(_) => SinkType::Mongo,
        }
    }
}

impl RecordSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Mqtt(sink) => sink.name(),
            Self::Mongo(sink) => sink.name(),
        }
    }

    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
        match self {
            Self::Log(sink) => sink.send(batch).await,
            Self::File(sink) => sink.send(batch).await,
            Self::Mqtt(sink) => sink.send(batch).await,
            Self::Mongo(sink) => sink.send(batch).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.close().await,
            Self::File(sink) => sink.close().await,
            Self::Mqtt(sink) => sink.close().await,
            Self::Mongo(sink) => sink.close().await,
        }
    }
}

/// Create the configured sink
///
/// Network sinks take their resolved connection from `context`; a missing
/// connection is a startup error.
#[instrument(
    name = "dispatcher_create_sink",
    skip(config, context),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(
    config: &SinkConfig,
    context: &RuntimeContext,
) -> Result<ConfiguredSink, DispatcherError> {
    let sink = match config.sink_type {
        SinkType::Log => ConfiguredSink::Log(LogSink::new(&config.name)),
        SinkType::File => ConfiguredSink::File(
            FileSink::create(&config.name, &config.target)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?,
        ),
        SinkType::Mqtt => {
            let connection = context
                .mqtt
                .as_ref()
                .ok_or_else(|| DispatcherError::missing_connection(&config.name, "mqtt"))?;
            let sink_config = MqttSinkConfig::from_connection(&config.target, connection);
            ConfiguredSink::Mqtt(MqttSink::connect(config.name.clone(), sink_config).await?)
        }
        SinkType::Mongo => ConfiguredSink::Mongo(
            create_storage_sink(&config.name, &config.target, context).await?,
        ),
    };

    info!(sink = %config.name, target = %config.target, "Sink created");
    Ok(sink)
}

/// Create a document store sink bound to `collection`
pub async fn create_storage_sink(
    name: &str,
    collection: &str,
    context: &RuntimeContext,
) -> Result<MongoSink, DispatcherError> {
    let credentials = context
        .mongo
        .as_ref()
        .ok_or_else(|| DispatcherError::missing_connection(name, "mongo"))?;
    Ok(MongoSink::connect(name.to_string(), credentials, collection).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeneratorConfig, LoadProfile};
    use generator::TelemetryGenerator;
    use tempfile::tempdir;

    fn context() -> RuntimeContext {
        RuntimeContext {
            run_id: "run-7".into(),
            profile: LoadProfile::default(),
            mqtt: None,
            mongo: None,
        }
    }

    fn sink_config(sink_type: SinkType, target: &str) -> SinkConfig {
        SinkConfig {
            name: "out".into(),
            sink_type,
            target: target.into(),
        }
    }

    #[tokio::test]
    async fn test_create_log_sink() {
        let mut sink = create_sink(&sink_config(SinkType::Log, ""), &context())
            .await
            .unwrap();
        assert_eq!(sink.sink_type(), SinkType::Log);
        assert_eq!(sink.name(), "out");

        let records = TelemetryGenerator::new(&GeneratorConfig::default()).generate(4, "run-7");
        let report = sink.send(&Batch::new(1, records)).await.unwrap();
        assert_eq!(report.inserted, 4);
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batches.jsonl");
        let sink = create_sink(
            &sink_config(SinkType::File, path.to_str().unwrap()),
            &context(),
        )
        .await
        .unwrap();
        assert_eq!(sink.sink_type(), SinkType::File);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_network_sinks_require_connection() {
        let err = create_sink(&sink_config(SinkType::Mqtt, "topic"), &context())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DispatcherError::MissingConnection {
                connection: "mqtt",
                ..
            }
        ));

        let err = create_sink(&sink_config(SinkType::Mongo, "telemetry"), &context())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DispatcherError::MissingConnection {
                connection: "mongo",
                ..
            }
        ));
    }
}
