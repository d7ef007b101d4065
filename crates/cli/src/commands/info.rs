//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::LoadProfile;
use generator::DropTable;
use serde::Serialize;
use tracing::info;

use super::load_profile;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    generator: GeneratorInfo,
    emitter: EmitterInfo,
    sink: SinkInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    mqtt_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mongo_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<QueryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relay: Option<RelayInfo>,
}

#[derive(Serialize)]
struct GeneratorInfo {
    vehicle_ids: (i32, i32),
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    drop_rules: Vec<DropRuleInfo>,
}

#[derive(Serialize)]
struct DropRuleInfo {
    fields: Vec<String>,
    probability: f64,
}

#[derive(Serialize)]
struct EmitterInfo {
    batch_size: (usize, usize),
    pacing_ms: (u64, u64),
    stop: String,
    progress_every: u64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    target: String,
}

#[derive(Serialize)]
struct QueryInfo {
    collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    vehicle_id: Option<i32>,
    window_minutes: u32,
    executions: u32,
    interval_ms: u64,
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    join: Option<String>,
}

#[derive(Serialize)]
struct RelayInfo {
    collection: String,
    batch_size: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let profile = load_profile(&args.config)?;
    let info = build_config_info(&profile);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(profile: &LoadProfile) -> ConfigInfo {
    let drop_table = DropTable::from_config(profile.generator.dropout.as_deref());
    let drop_rules = drop_table
        .rules()
        .iter()
        .map(|rule| DropRuleInfo {
            fields: rule.fields.iter().map(|f| f.key().to_string()).collect(),
            probability: rule.probability,
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", profile.version),
        run_id: profile.run_id.clone(),
        generator: GeneratorInfo {
            vehicle_ids: (profile.generator.vehicle_ids.min, profile.generator.vehicle_ids.max),
            seed: profile.generator.seed,
            drop_rules,
        },
        emitter: EmitterInfo {
            batch_size: (profile.emitter.batch_size.min, profile.emitter.batch_size.max),
            pacing_ms: (profile.emitter.pacing.min_ms, profile.emitter.pacing.max_ms),
            stop: format!("{:?}", profile.emitter.stop),
            progress_every: profile.emitter.progress_every,
        },
        sink: SinkInfo {
            name: profile.sink.name.clone(),
            sink_type: format!("{:?}", profile.sink.sink_type),
            target: profile.sink.target.clone(),
        },
        mqtt_endpoint: profile
            .mqtt
            .as_ref()
            .map(|m| format!("{}:{}", m.endpoint, m.port)),
        mongo_host: profile.mongo.as_ref().map(|m| format!("{}://{}/{}", m.scheme, m.host, m.database)),
        query: profile.query_config().map(|q| QueryInfo {
            collection: q.collection,
            vehicle_id: q.vehicle_id,
            window_minutes: q.window_minutes,
            executions: q.executions,
            interval_ms: q.interval_ms,
            mode: format!("{:?}", q.mode),
            join: q.join.map(|j| j.collection),
        }),
        relay: profile.relay.as_ref().map(|r| RelayInfo {
            collection: r.collection.clone(),
            batch_size: r.batch_size,
        }),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Agri Loadgen Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🚜 Generator");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Run id: {}", info.run_id.as_deref().unwrap_or("(random)"));
    println!(
        "   ├─ Vehicle ids: {}..={}",
        info.generator.vehicle_ids.0, info.generator.vehicle_ids.1
    );
    match info.generator.seed {
        Some(seed) => println!("   ├─ Seed: {}", seed),
        None => println!("   ├─ Seed: (entropy)"),
    }
    println!("   └─ Drop rules ({})", info.generator.drop_rules.len());
    for (i, rule) in info.generator.drop_rules.iter().enumerate() {
        let prefix = if i == info.generator.drop_rules.len() - 1 { "└─" } else { "├─" };
        println!("      {} {} p={}", prefix, rule.fields.join(" + "), rule.probability);
    }

    println!("\n⚙️  Emitter");
    println!(
        "   ├─ Batch size: {}..={}",
        info.emitter.batch_size.0, info.emitter.batch_size.1
    );
    println!(
        "   ├─ Pacing: {}..={} ms",
        info.emitter.pacing_ms.0, info.emitter.pacing_ms.1
    );
    println!("   ├─ Stop: {}", info.emitter.stop);
    println!("   └─ Progress every: {} records", info.emitter.progress_every);

    println!("\n📤 Sink");
    println!("   ├─ {} ({})", info.sink.name, info.sink.sink_type);
    println!("   └─ Target: {}", info.sink.target);

    if let Some(ref endpoint) = info.mqtt_endpoint {
        println!("\n📡 MQTT: {}", endpoint);
    }
    if let Some(ref host) = info.mongo_host {
        println!("\n🗄  MongoDB: {}", host);
    }

    if let Some(ref query) = info.query {
        println!("\n🔎 Query");
        println!("   ├─ Collection: {}", query.collection);
        match query.vehicle_id {
            Some(id) => println!("   ├─ Vehicle: {}", id),
            None => println!("   ├─ Vehicle: (all)"),
        }
        println!("   ├─ Window: {} min", query.window_minutes);
        println!(
            "   ├─ Executions: {} every {} ms",
            query.executions, query.interval_ms
        );
        println!("   ├─ Mode: {}", query.mode);
        println!("   └─ Join: {}", query.join.as_deref().unwrap_or("(none)"));
    }

    if let Some(ref relay) = info.relay {
        println!("\n🔁 Relay");
        println!("   ├─ Collection: {}", relay.collection);
        println!("   └─ Batch size: {}", relay.batch_size);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{QueryConfig, SinkConfig, SinkType};

    #[test]
    fn test_info_lists_standard_drop_rules() {
        let info = build_config_info(&LoadProfile::default());
        assert_eq!(info.generator.drop_rules.len(), 6);
        assert_eq!(info.generator.drop_rules[0].fields, vec!["operatingtime"]);
        assert_eq!(info.generator.drop_rules[4].fields.len(), 4);
        assert!(info.query.is_none());
    }

    #[test]
    fn test_info_query_falls_back_to_sink_collection() {
        let mut profile = LoadProfile::default();
        profile.sink = SinkConfig {
            name: "store".into(),
            sink_type: SinkType::Mongo,
            target: "telemetry".into(),
        };
        profile.query = Some(QueryConfig::default());

        let info = build_config_info(&profile);
        assert_eq!(info.query.unwrap().collection, "telemetry");
    }
}
