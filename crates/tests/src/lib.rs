//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 → 生成 → 发送 的 e2e 测试 (无需 broker / 数据库)
//! - 流转发与查询窗口的跨 crate 测试

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{HandlerResponse, SinkType, StopCondition};

    const PROFILE: &str = r#"
run_id = "local-run"

[generator]
vehicle_ids = { min = 1, max = 10 }
seed = 42

[emitter]
batch_size = { min = 180, max = 220 }
stop = { mode = "batches", count = 3 }
pacing = { min_ms = 50, max_ms = 100 }

[sink]
name = "store"
sink_type = "mongo"
target = "telemetry"

[mongo]
host = "cluster0.example.net"
user = "loader"
password_secret = "MONGODB_SECRET"
database = "agri"

[query]
vehicle_id = 1
join = { collection = "vehicles" }

[relay]
collection = "telemetry"
"#;

    #[test]
    fn test_handler_response_shape() {
        let json = serde_json::to_value(HandlerResponse::ok("Successfully sent messages")).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "Successfully sent messages");
    }

    #[test]
    fn test_full_profile_parses() {
        let profile = ConfigLoader::load_from_str(PROFILE, ConfigFormat::Toml).unwrap();

        assert_eq!(profile.run_id.as_deref(), Some("local-run"));
        assert_eq!(profile.sink.sink_type, SinkType::Mongo);
        assert_eq!(profile.emitter.stop, StopCondition::Batches { count: 3 });

        let query = profile.query_config().unwrap();
        assert_eq!(query.collection, "telemetry");
        assert_eq!(query.window_minutes, 5);
        let join = query.join.unwrap();
        assert_eq!(join.local_field, "vehicleid");
        assert_eq!(join.as_field, "vehicle");

        assert_eq!(profile.relay.unwrap().batch_size, 50);
    }

    #[test]
    fn test_env_overlay_wins_over_file() {
        let profile = ConfigLoader::load_from_str_with_env(PROFILE, ConfigFormat::Toml, |name| {
            match name {
                "MONGODB_COLLECTION" => Some("overlay".to_string()),
                "VEHICLE_ID" => Some("7".to_string()),
                _ => None,
            }
        })
        .unwrap();

        assert_eq!(profile.sink.target, "overlay");
        assert_eq!(profile.query.unwrap().vehicle_id, Some(7));
    }

    #[test]
    fn test_profile_toml_roundtrip() {
        let profile = ConfigLoader::load_from_str(PROFILE, ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&profile).unwrap();
        let reparsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reparsed.emitter.stop, profile.emitter.stop);
        assert_eq!(reparsed.generator.vehicle_ids, profile.generator.vehicle_ids);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConnectionNeeds, RuntimeContext, StaticSecretSource};
    use contracts::{
        Batch, ContractError, EmitterConfig, GeneratorConfig, LoadProfile, RecordSink,
        SendReport, SinkConfig, SinkType, StopCondition, StreamEvent, StreamPayload,
        StreamRecord, TelemetryRecord,
    };
    use dispatcher::{create_sink, FileSink};
    use emitter::{encode_payload, Emitter, StopReason, StreamRelay};
    use generator::TelemetryGenerator;
    use tempfile::tempdir;

    /// Fails every second batch
    #[derive(Clone, Default)]
    struct FlakySink {
        attempts: Arc<Mutex<Vec<usize>>>,
    }

    impl RecordSink for FlakySink {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(batch.len());
            if attempts.len() % 2 == 0 {
                return Err(ContractError::sink_write("flaky", "broker unavailable"));
            }
            Ok(SendReport::accepted(batch.len()))
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn profile_with_file_sink(path: &str) -> LoadProfile {
        LoadProfile {
            run_id: Some("req-1".into()),
            generator: GeneratorConfig {
                seed: Some(7),
                ..Default::default()
            },
            emitter: EmitterConfig {
                stop: StopCondition::Batches { count: 4 },
                ..Default::default()
            },
            sink: SinkConfig {
                name: "file".into(),
                sink_type: SinkType::File,
                target: path.into(),
            },
            ..Default::default()
        }
    }

    /// Scenario: three records for request "req-1"
    #[test]
    fn test_generate_scenario() {
        let mut generator = TelemetryGenerator::new(&GeneratorConfig::default());
        let records = generator.generate(3, "req-1");

        assert_eq!(records.len(), 3);
        let mut ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(records.iter().all(|r| r.id.ends_with("-req-1")));
        assert!(records.iter().all(|r| (0..=40).contains(&r.drivingspeed)));
    }

    /// Profile -> RuntimeContext -> FileSink -> Emitter
    #[tokio::test(start_paused = true)]
    async fn test_e2e_emitter_to_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let profile = profile_with_file_sink(path.to_str().unwrap());

        let context = RuntimeContext::bootstrap(
            profile,
            &StaticSecretSource::new(),
            ConnectionNeeds::for_sink(SinkType::File),
        )
        .unwrap();
        let sink = create_sink(&context.profile.sink, &context).await.unwrap();

        let summary = Emitter::new(
            TelemetryGenerator::new(&context.profile.generator),
            sink,
            context.profile.emitter.clone(),
            context.run_id.clone(),
        )
        .with_seed(3)
        .run()
        .await;

        assert_eq!(summary.batches_sent, 4);
        assert_eq!(summary.failed_batches, 0);
        assert_eq!(summary.stop_reason, StopReason::BatchLimit);
        assert_eq!(summary.records_acknowledged, summary.records_sent);

        let content = std::fs::read_to_string(&path).unwrap();
        let batches: Vec<Vec<TelemetryRecord>> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| (180..=220).contains(&b.len())));

        let total: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total as u64, summary.records_sent);
        assert!(batches.iter().flatten().all(|r| r.id.ends_with("-req-1")));
    }

    /// A failing sink never stops the run and every attempt is counted
    #[tokio::test(start_paused = true)]
    async fn test_e2e_flaky_sink_counts_failures() {
        let sink = FlakySink::default();
        let attempts = sink.attempts.clone();
        let config = EmitterConfig {
            stop: StopCondition::Batches { count: 6 },
            ..Default::default()
        };

        let summary = Emitter::new(
            TelemetryGenerator::new(&GeneratorConfig::default()),
            sink,
            config,
            "flaky-run",
        )
        .run()
        .await;

        assert_eq!(attempts.lock().unwrap().len(), 6);
        assert_eq!(summary.batches_sent, 6);
        assert_eq!(summary.failed_batches, 3);
        assert!(summary.records_acknowledged < summary.records_sent);
    }

    /// Duration stop never ends early and overshoots by at most one cycle
    #[tokio::test(start_paused = true)]
    async fn test_e2e_duration_bound() {
        let config = EmitterConfig {
            stop: StopCondition::Duration { seconds: 2 },
            pacing: contracts::DelayRange { min_ms: 50, max_ms: 100 },
            ..Default::default()
        };

        let summary = Emitter::new(
            TelemetryGenerator::new(&GeneratorConfig::default()),
            FlakySink::default(),
            config,
            "deadline",
        )
        .run()
        .await;

        assert_eq!(summary.stop_reason, StopReason::Deadline);
        assert!(summary.duration >= Duration::from_secs(2));
        assert!(summary.duration <= Duration::from_millis(2100));
    }

    /// Stream payloads -> relay -> file sink, re-batched by 50
    #[tokio::test]
    async fn test_e2e_relay_rebatches_into_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("relay.jsonl");
        let mut generator = TelemetryGenerator::new(&GeneratorConfig {
            seed: Some(11),
            ..Default::default()
        });

        let event = StreamEvent {
            records: [30usize, 40, 50]
                .iter()
                .map(|n| StreamRecord {
                    kinesis: StreamPayload {
                        data: encode_payload(&generator.generate(*n, "stream")).unwrap(),
                    },
                })
                .collect(),
        };

        let sink = FileSink::create("relay", &path).unwrap();
        let mut relay = StreamRelay::new(sink, 50);
        let summary = relay.relay(&event).await;
        relay.close().await.unwrap();

        assert_eq!(summary.documents, 120);
        assert_eq!(summary.inserted, 120);

        let sizes: Vec<usize> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<Vec<TelemetryRecord>>(line).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }
}

#[cfg(test)]
mod query_tests {
    use contracts::{ContractError, QueryConfig};
    use query::{average_speed, QueryRunner, QueryWindow, SpeedSource};

    /// Collection where nothing falls inside the window
    struct EmptyCollection;

    impl SpeedSource for EmptyCollection {
        fn collection(&self) -> &str {
            "telemetry"
        }

        async fn average_speed(&self, _window: &QueryWindow) -> Result<f64, ContractError> {
            Ok(average_speed(&[]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_window_averages_zero() {
        let config = QueryConfig {
            collection: "telemetry".into(),
            vehicle_id: Some(1),
            executions: 3,
            interval_ms: 10,
            ..Default::default()
        };

        let summary = QueryRunner::new(EmptyCollection, config).run().await;
        assert_eq!(summary.executions, 3);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.last_average, Some(0.0));
    }
}
