//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A command needs a profile section that is absent
    #[error("`{command}` requires a [{section}] section in the configuration")]
    MissingSection {
        command: &'static str,
        section: &'static str,
    },

    /// Stream event file could not be read or parsed
    #[error("Failed to read stream event {path}: {message}")]
    EventRead { path: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn missing_section(command: &'static str, section: &'static str) -> Self {
        Self::MissingSection { command, section }
    }

    pub fn event_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EventRead {
            path: path.into(),
            message: message.into(),
        }
    }
}
