//! Stream event envelope consumed by the relay
//!
//! Shape of a stream-triggered invocation: a list of records whose `data`
//! field holds a base64-encoded JSON array of telemetry objects.

use serde::{Deserialize, Serialize};

/// Batch of stream records delivered in one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

/// One stream record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub kinesis: StreamPayload,
}

/// Encoded payload of a stream record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamPayload {
    /// Base64-encoded JSON array
    pub data: String,
}
