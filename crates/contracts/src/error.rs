//! Layered error definitions
//!
//! Categorized by source: config / secret / connection / sink / query

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Secret Errors =====
    /// Secret could not be retrieved or decoded
    #[error("secret '{secret_id}' unavailable: {message}")]
    Secret { secret_id: String, message: String },

    // ===== Sink Errors =====
    /// Sink send error
    #[error("sink '{sink_name}' send error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== Query Errors =====
    /// Aggregation query failed
    #[error("query on '{collection}' failed: {message}")]
    Query { collection: String, message: String },

    // ===== Stream Errors =====
    /// Stream payload could not be decoded
    #[error("payload decode error at record {index}: {message}")]
    PayloadDecode { index: usize, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create secret error
    pub fn secret(secret_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Secret {
            secret_id: secret_id.into(),
            message: message.into(),
        }
    }

    /// Create sink send error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create query error
    pub fn query(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            collection: collection.into(),
            message: message.into(),
        }
    }
}
