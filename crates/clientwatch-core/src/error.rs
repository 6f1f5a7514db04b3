//! Error types for the client watcher
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for client watcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the client watcher
#[derive(Error, Debug)]
pub enum Error {
    /// The controller could not be reached, refused the login, or returned
    /// a body that could not be parsed
    #[error("Client source unavailable: {0}")]
    SourceUnavailable(String),

    /// Event delivery failed
    #[error("Event sink error: {0}")]
    Sink(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A MAC address that is not six hex octets
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// A controller record that cannot be turned into a snapshot
    #[error("Malformed client record: {0}")]
    MalformedRecord(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a source-unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create an event sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid MAC error
    pub fn invalid_mac(msg: impl Into<String>) -> Self {
        Self::InvalidMac(msg.into())
    }

    /// Create a malformed record error
    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Whether this error is a transient upstream failure the scheduler
    /// should ride out until the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::Sink(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
