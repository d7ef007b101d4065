//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink type needs a connection the runtime context does not carry
    #[error("sink '{name}' requires a {connection} connection, none was bootstrapped")]
    MissingConnection {
        name: String,
        connection: &'static str,
    },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn missing_connection(name: impl Into<String>, connection: &'static str) -> Self {
        Self::MissingConnection {
            name: name.into(),
            connection,
        }
    }
}
