//! Batch - unit of delivery to a sink

use serde::{Deserialize, Serialize};

use crate::TelemetryRecord;

/// Ordered group of records flushed to a sink as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based sequence number within a run
    pub sequence: u64,

    /// Records in generation order
    pub records: Vec<TelemetryRecord>,
}

impl Batch {
    pub fn new(sequence: u64, records: Vec<TelemetryRecord>) -> Self {
        Self { sequence, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the records as one JSON array payload
    pub fn to_json_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.records)
    }
}

/// Outcome of a single sink send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReport {
    /// Whether the sink acknowledged the write
    pub acknowledged: bool,

    /// Number of records the sink reports as stored/published
    pub inserted: usize,
}

impl SendReport {
    /// Report for a sink that accepted every record
    pub fn accepted(count: usize) -> Self {
        Self {
            acknowledged: true,
            inserted: count,
        }
    }
}
