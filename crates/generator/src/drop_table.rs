//! 字段丢弃表
//!
//! 模拟传感器掉线：按固定顺序对每条规则做一次独立的伯努利试验，
//! 命中时同时移除规则内的全部字段。

use contracts::{DropRule, DroppableField, TelemetryRecord};
use rand::Rng;

/// Ordered list of independent dropout rules
#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    rules: Vec<DropRule>,
}

impl DropTable {
    /// Standard dropout table
    ///
    /// | order | fields | p |
    /// |---|---|---|
    /// | 1 | operatingtime | 0.5 |
    /// | 2 | autopilot_system_state | 0.5 |
    /// | 3 | enginestate | 0.5 |
    /// | 4 | temperature | 0.5 |
    /// | 5 | front/rear linkage, engine_rotation, four_wheel_driving_state | 0.3 |
    /// | 6 | front_pme_shaft | 0.4 |
    pub fn standard() -> Self {
        Self {
            rules: vec![
                DropRule::single(DroppableField::OperatingTime, 0.5),
                DropRule::single(DroppableField::AutopilotSystemState, 0.5),
                DropRule::single(DroppableField::EngineState, 0.5),
                DropRule::single(DroppableField::Temperature, 0.5),
                DropRule::group(
                    &[
                        DroppableField::FrontLinkagePosition,
                        DroppableField::RearLinkagePosition,
                        DroppableField::EngineRotation,
                        DroppableField::FourWheelDrivingState,
                    ],
                    0.3,
                ),
                DropRule::single(DroppableField::FrontPmeShaft, 0.4),
            ],
        }
    }

    /// Table from explicit rules, evaluated in the given order
    pub fn from_rules(rules: Vec<DropRule>) -> Self {
        Self { rules }
    }

    /// Configured override, or the standard table
    pub fn from_config(rules: Option<&[DropRule]>) -> Self {
        match rules {
            Some(rules) => Self::from_rules(rules.to_vec()),
            None => Self::standard(),
        }
    }

    /// A table that never drops anything
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[DropRule] {
        &self.rules
    }

    /// Roll every rule once against `record`
    ///
    /// Returns the number of rules that fired.
    pub fn apply<R: Rng + ?Sized>(&self, record: &mut TelemetryRecord, rng: &mut R) -> usize {
        let mut fired = 0;
        for rule in &self.rules {
            // 与 p 比较而不是 random_bool，越界概率不会 panic
            if rng.random::<f64>() < rule.probability {
                for field in &rule.fields {
                    record.drop_field(*field);
                }
                fired += 1;
            }
        }
        fired
    }
}

impl Default for DropTable {
    fn default() -> Self {
        Self::standard()
    }
}
