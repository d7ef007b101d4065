//! Telemetry generator
//!
//! 每条记录的数值字段在各自闭区间内独立均匀取值，浮点字段按固定小数位
//! 四舍五入，随后按丢弃表移除部分字段。记录之间没有状态。

use chrono::{SecondsFormat, Utc};
use contracts::{
    ConnectionState, FourWheelDriveState, GeneratorConfig, LastErrorMessage, OperatingMode,
    TelemetryRecord, VehicleIdRange,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::drop_table::DropTable;

/// Synthetic telemetry source
///
/// Owns its RNG: seeded from config for reproducible field values, OS
/// entropy otherwise. Record ids never come from this RNG, so instances
/// sharing a seed still emit distinct `_id`s.
#[derive(Debug)]
pub struct TelemetryGenerator {
    rng: StdRng,
    vehicle_ids: VehicleIdRange,
    drop_table: DropTable,
}

impl TelemetryGenerator {
    /// Build from configuration
    pub fn new(config: &GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            vehicle_ids: config.vehicle_ids,
            drop_table: DropTable::from_config(config.dropout.as_deref()),
        }
    }

    /// Replace the dropout table
    pub fn with_drop_table(mut self, drop_table: DropTable) -> Self {
        self.drop_table = drop_table;
        self
    }

    /// Generate exactly `count` records tagged with `run_id`
    pub fn generate(&mut self, count: usize, run_id: &str) -> Vec<TelemetryRecord> {
        let records: Vec<_> = (0..count).map(|_| self.generate_one(run_id)).collect();
        trace!(count, run_id, "Generated telemetry records");
        records
    }

    /// Generate a single record
    pub fn generate_one(&mut self, run_id: &str) -> TelemetryRecord {
        let id = uuid::Uuid::new_v4();
        let rng = &mut self.rng;

        let mut record = TelemetryRecord {
            id: format!("{id}-{run_id}"),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            vehicleid: rng.random_range(self.vehicle_ids.min..=self.vehicle_ids.max),
            temperature: Some(uniform(rng, 5.0, 40.0, 2)),
            operatingtime: Some(rng.random_range(0..=1000)),
            fuelusage: uniform(rng, 0.0, 10.0, 2),
            front_linkage_position: Some(rng.random_range(0..=100)),
            drivingspeed: rng.random_range(0..=40),
            enginestate: Some(rng.random_range(0..=1)),
            autopilot_system_state: Some(rng.random_range(0..=1)),
            engine_load: uniform(rng, 0.0, 100.0, 2),
            latitude: uniform(rng, -90.0, 90.0, 6),
            longitude: uniform(rng, -180.0, 180.0, 6),
            altitude: uniform(rng, 0.0, 1000.0, 2),
            engine_rotation: Some(uniform(rng, 0.0, 3000.0, 2)),
            front_pme_shaft: Some(uniform(rng, 0.0, 100.0, 2)),
            rear_linkage_position: Some(rng.random_range(0..=100)),
            four_wheel_driving_state: Some(if rng.random_bool(0.5) {
                FourWheelDriveState::Engaged
            } else {
                FourWheelDriveState::Disengaged
            }),
            fuel_tank_level: rng.random_range(0..=100),
            last_error_msg: match rng.random_range(0..3) {
                0 => LastErrorMessage::NoError,
                1 => LastErrorMessage::LowFuelLevel,
                _ => LastErrorMessage::EngineOverheating,
            },
            engine_temperature: uniform(rng, 60.0, 110.0, 2),
            connection_state: if rng.random_bool(0.5) {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            },
            lte_connection_level: uniform(rng, 0.0, 100.0, 2),
            mode: match rng.random_range(0..3) {
                0 => OperatingMode::Normal,
                1 => OperatingMode::Eco,
                _ => OperatingMode::Work,
            },
        };

        self.drop_table.apply(&mut record, &mut self.rng);
        record
    }
}

/// Uniform draw in `[lo, hi]` rounded to `decimals`
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64, decimals: i32) -> f64 {
    round_to(rng.random_range(lo..=hi), decimals)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}


#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DroppableField;
    use std::collections::HashSet;

    fn seeded(seed: u64) -> TelemetryGenerator {
        TelemetryGenerator::new(&GeneratorConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn in_range(value: f64, lo: f64, hi: f64) -> bool {
        (lo..=hi).contains(&value)
    }

    fn decimals_at_most(value: f64, decimals: i32) -> bool {
        (round_to(value, decimals) - value).abs() < 1e-9
    }

    #[test]
    fn test_generate_exact_count() {
        let mut generator = seeded(1);
        assert!(generator.generate(0, "run").is_empty());
        assert_eq!(generator.generate(1, "run").len(), 1);
        assert_eq!(generator.generate(250, "run").len(), 250);
    }

    #[test]
    fn test_ids_unique_and_suffixed() {
        let mut generator = seeded(2);
        let records = generator.generate(3, "req-1");
        assert_eq!(records.len(), 3);

        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        for record in &records {
            assert!(record.id.ends_with("-req-1"), "bad id {}", record.id);
            let uuid_part = record.id.trim_end_matches("-req-1");
            let parsed = uuid::Uuid::parse_str(uuid_part).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
        }
    }

    #[test]
    fn test_timestamp_format() {
        let record = seeded(3).generate_one("run");
        let parsed = chrono::DateTime::parse_from_rfc3339(&record.ts).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(record.ts.ends_with('Z'));
        // 2024-01-01T00:00:00.000000Z
        assert_eq!(record.ts.len(), 27);
    }

    #[test]
    fn test_numeric_fields_within_ranges() {
        let mut generator = seeded(4);
        for r in generator.generate(5000, "run") {
            assert!((1..=50000).contains(&r.vehicleid));
            assert!(in_range(r.fuelusage, 0.0, 10.0) && decimals_at_most(r.fuelusage, 2));
            assert!((0..=40).contains(&r.drivingspeed));
            assert!(in_range(r.engine_load, 0.0, 100.0));
            assert!(in_range(r.latitude, -90.0, 90.0) && decimals_at_most(r.latitude, 6));
            assert!(in_range(r.longitude, -180.0, 180.0) && decimals_at_most(r.longitude, 6));
            assert!(in_range(r.altitude, 0.0, 1000.0));
            assert!((0..=100).contains(&r.fuel_tank_level));
            assert!(in_range(r.engine_temperature, 60.0, 110.0));
            assert!(in_range(r.lte_connection_level, 0.0, 100.0));

            if let Some(t) = r.temperature {
                assert!(in_range(t, 5.0, 40.0) && decimals_at_most(t, 2));
            }
            if let Some(v) = r.operatingtime {
                assert!((0..=1000).contains(&v));
            }
            if let Some(v) = r.front_linkage_position {
                assert!((0..=100).contains(&v));
            }
            if let Some(v) = r.rear_linkage_position {
                assert!((0..=100).contains(&v));
            }
            if let Some(v) = r.enginestate {
                assert!(v == 0 || v == 1);
            }
            if let Some(v) = r.autopilot_system_state {
                assert!(v == 0 || v == 1);
            }
            if let Some(v) = r.engine_rotation {
                assert!(in_range(v, 0.0, 3000.0));
            }
            if let Some(v) = r.front_pme_shaft {
                assert!(in_range(v, 0.0, 100.0));
            }
        }
    }

    #[test]
    fn test_configured_vehicle_range() {
        let mut generator = TelemetryGenerator::new(&GeneratorConfig {
            vehicle_ids: VehicleIdRange { min: 1, max: 100 },
            seed: Some(5),
            dropout: None,
        });
        assert!(generator
            .generate(2000, "run")
            .iter()
            .all(|r| (1..=100).contains(&r.vehicleid)));
    }

    #[test]
    fn test_drop_rates_converge() {
        const N: usize = 100_000;
        let mut generator = seeded(6);
        let records = generator.generate(N, "run");

        let rate = |field: DroppableField| {
            records.iter().filter(|r| !r.has_field(field)).count() as f64 / N as f64
        };

        for field in [
            DroppableField::OperatingTime,
            DroppableField::AutopilotSystemState,
            DroppableField::EngineState,
            DroppableField::Temperature,
        ] {
            let observed = rate(field);
            assert!((observed - 0.5).abs() < 0.01, "{}: {observed}", field.key());
        }
        assert!((rate(DroppableField::FrontLinkagePosition) - 0.3).abs() < 0.01);
        assert!((rate(DroppableField::FrontPmeShaft) - 0.4).abs() < 0.01);
    }

    #[test]
    fn test_group_drops_all_or_nothing() {
        let group = [
            DroppableField::FrontLinkagePosition,
            DroppableField::RearLinkagePosition,
            DroppableField::EngineRotation,
            DroppableField::FourWheelDrivingState,
        ];
        let mut generator = seeded(7);
        for record in generator.generate(10_000, "run") {
            let present = group.iter().filter(|f| record.has_field(**f)).count();
            assert!(present == 0 || present == group.len());
        }
    }

    #[test]
    fn test_same_seed_same_values() {
        let a = seeded(8).generate_one("run");
        let b = seeded(8).generate_one("run");
        assert_ne!(a.id, b.id);
        assert_eq!(a.vehicleid, b.vehicleid);
        assert_eq!(a.latitude, b.latitude);
        assert_eq!(a.drivingspeed, b.drivingspeed);
    }

    #[test]
    fn test_shared_seed_and_run_id_never_collide() {
        let first = seeded(42).generate(200, "local-run");
        let second = seeded(42).generate(200, "local-run");

        let ids: HashSet<_> = first.iter().map(|r| r.id.as_str()).collect();
        let collisions = second.iter().filter(|r| ids.contains(r.id.as_str())).count();
        assert_eq!(collisions, 0);
        assert_eq!(first[0].vehicleid, second[0].vehicleid);
    }

    #[test]
    fn test_dropped_fields_absent_from_json() {
        let table = DropTable::from_rules(vec![contracts::DropRule::single(
            DroppableField::FrontPmeShaft,
            1.0,
        )]);
        let record = seeded(9).with_drop_table(table).generate_one("run");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("front_pme_shaft").is_none());
        assert!(value.get("temperature").is_some());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.234567, 2), 1.23);
        assert_eq!(round_to(1.235, 1), 1.2);
        assert_eq!(round_to(-45.1234567, 6), -45.123457);
    }
}
