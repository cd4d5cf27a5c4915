//! Error types for report fetching, configuration and serving
//!
//! The aggregation functions in [`crate::governor`] never fail; these errors
//! belong to the collaborators around them.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Relational report source failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Filesystem failure while loading documents or configuration
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A report source failed for a reason of its own
    #[error("Report source '{source_name}' failed: {message}")]
    SourceError {
        source_name: String,
        message: String,
    },

    /// Fetching reports did not complete in time
    #[error("Report fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// Every configured source failed, or none was configured
    #[error("No report source available")]
    NoSourcesAvailable,
}

impl Error {
    pub fn source_error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Short label used for metrics and API error codes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigError(_) => "config",
            Error::DatabaseError(_) => "database",
            Error::IoError(_) => "io",
            Error::SerializationError(_) => "serialization",
            Error::TomlError(_) => "toml",
            Error::SourceError { .. } => "source",
            Error::FetchTimeout(_) => "timeout",
            Error::NoSourcesAvailable => "unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
