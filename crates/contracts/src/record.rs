//! TelemetryRecord - one simulated vehicle sample
//!
//! 字段名与下游消费者保持一致（`_id`, `ts`, `vehicleid` ...）。

use serde::{Deserialize, Serialize};

/// Four-wheel-drive engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FourWheelDriveState {
    Engaged,
    Disengaged,
}

/// Broker connection state reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Normal,
    Eco,
    Work,
}

/// Last error message reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastErrorMessage {
    #[serde(rename = "No Error")]
    NoError,
    #[serde(rename = "Warning: Low Fuel Level")]
    LowFuelLevel,
    #[serde(rename = "Error: Engine Overheating")]
    EngineOverheating,
}

/// Simulated vehicle telemetry sample
///
/// `Option` fields are the droppable ones (sensor dropout). They are
/// skipped on serialization when `None`, so a dropped field is absent
/// from the document rather than `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// `<uuid>-<run_id>`
    #[serde(rename = "_id")]
    pub id: String,

    /// RFC 3339 UTC timestamp captured at generation time
    pub ts: String,

    pub vehicleid: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operatingtime: Option<i32>,

    pub fuelusage: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_linkage_position: Option<i32>,

    pub drivingspeed: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enginestate: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopilot_system_state: Option<i32>,

    pub engine_load: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_rotation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_pme_shaft: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_linkage_position: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub four_wheel_driving_state: Option<FourWheelDriveState>,

    pub fuel_tank_level: i32,
    pub last_error_msg: LastErrorMessage,
    pub engine_temperature: f64,
    pub connection_state: ConnectionState,
    pub lte_connection_level: f64,
    pub mode: OperatingMode,
}

/// Fields that may be removed from a record to simulate sensor dropout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppableField {
    #[serde(rename = "operatingtime")]
    OperatingTime,
    AutopilotSystemState,
    #[serde(rename = "enginestate")]
    EngineState,
    Temperature,
    FrontLinkagePosition,
    RearLinkagePosition,
    EngineRotation,
    FourWheelDrivingState,
    FrontPmeShaft,
}

impl DroppableField {
    /// All droppable fields
    pub const ALL: [DroppableField; 9] = [
        DroppableField::OperatingTime,
        DroppableField::AutopilotSystemState,
        DroppableField::EngineState,
        DroppableField::Temperature,
        DroppableField::FrontLinkagePosition,
        DroppableField::RearLinkagePosition,
        DroppableField::EngineRotation,
        DroppableField::FourWheelDrivingState,
        DroppableField::FrontPmeShaft,
    ];

    /// Document key of the field
    pub fn key(&self) -> &'static str {
        match self {
            DroppableField::OperatingTime => "operatingtime",
            DroppableField::AutopilotSystemState => "autopilot_system_state",
            DroppableField::EngineState => "enginestate",
            DroppableField::Temperature => "temperature",
            DroppableField::FrontLinkagePosition => "front_linkage_position",
            DroppableField::RearLinkagePosition => "rear_linkage_position",
            DroppableField::EngineRotation => "engine_rotation",
            DroppableField::FourWheelDrivingState => "four_wheel_driving_state",
            DroppableField::FrontPmeShaft => "front_pme_shaft",
        }
    }
}

impl TelemetryRecord {
    /// Remove a droppable field
    pub fn drop_field(&mut self, field: DroppableField) {
        match field {
            DroppableField::OperatingTime => self.operatingtime = None,
            DroppableField::AutopilotSystemState => self.autopilot_system_state = None,
            DroppableField::EngineState => self.enginestate = None,
            DroppableField::Temperature => self.temperature = None,
            DroppableField::FrontLinkagePosition => self.front_linkage_position = None,
            DroppableField::RearLinkagePosition => self.rear_linkage_position = None,
            DroppableField::EngineRotation => self.engine_rotation = None,
            DroppableField::FourWheelDrivingState => self.four_wheel_driving_state = None,
            DroppableField::FrontPmeShaft => self.front_pme_shaft = None,
        }
    }

    /// Whether a droppable field is still present
    pub fn has_field(&self, field: DroppableField) -> bool {
        match field {
            DroppableField::OperatingTime => self.operatingtime.is_some(),
            DroppableField::AutopilotSystemState => self.autopilot_system_state.is_some(),
            DroppableField::EngineState => self.enginestate.is_some(),
            DroppableField::Temperature => self.temperature.is_some(),
            DroppableField::FrontLinkagePosition => self.front_linkage_position.is_some(),
            DroppableField::RearLinkagePosition => self.rear_linkage_position.is_some(),
            DroppableField::EngineRotation => self.engine_rotation.is_some(),
            DroppableField::FourWheelDrivingState => self.four_wheel_driving_state.is_some(),
            DroppableField::FrontPmeShaft => self.front_pme_shaft.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryRecord {
        TelemetryRecord {
            id: "abc-run".into(),
            ts: "2024-01-01T00:00:00.000000Z".into(),
            vehicleid: 7,
            temperature: Some(21.5),
            operatingtime: Some(10),
            fuelusage: 3.2,
            front_linkage_position: Some(40),
            drivingspeed: 12,
            enginestate: Some(1),
            autopilot_system_state: Some(0),
            engine_load: 55.0,
            latitude: 12.345678,
            longitude: -45.5,
            altitude: 100.0,
            engine_rotation: Some(1500.0),
            front_pme_shaft: Some(20.0),
            rear_linkage_position: Some(60),
            four_wheel_driving_state: Some(FourWheelDriveState::Engaged),
            fuel_tank_level: 80,
            last_error_msg: LastErrorMessage::LowFuelLevel,
            engine_temperature: 90.0,
            connection_state: ConnectionState::Connected,
            lte_connection_level: 70.0,
            mode: OperatingMode::Eco,
        }
    }

    #[test]
    fn test_dropped_field_is_absent_from_json() {
        let mut record = sample();
        record.drop_field(DroppableField::Temperature);
        record.drop_field(DroppableField::FrontPmeShaft);

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("temperature"));
        assert!(!obj.contains_key("front_pme_shaft"));
        assert_eq!(obj["_id"], "abc-run");
        assert_eq!(obj["last_error_msg"], "Warning: Low Fuel Level");
        assert_eq!(obj["four_wheel_driving_state"], "Engaged");
    }

    #[test]
    fn test_missing_optional_fields_deserialize_as_none() {
        let mut record = sample();
        for field in DroppableField::ALL {
            record.drop_field(field);
        }
        let json = serde_json::to_string(&record).unwrap();
        let parsed: TelemetryRecord = serde_json::from_str(&json).unwrap();
        for field in DroppableField::ALL {
            assert!(!parsed.has_field(field), "{} should be absent", field.key());
        }
    }

    #[test]
    fn test_droppable_field_keys_match_serde_names() {
        let record = sample();
        let value = serde_json::to_value(&record).unwrap();
        for field in DroppableField::ALL {
            assert!(value.get(field.key()).is_some(), "missing {}", field.key());
            let name = serde_json::to_value(field).unwrap();
            assert_eq!(name, field.key());
        }
    }
}
