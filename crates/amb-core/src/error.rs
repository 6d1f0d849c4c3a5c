//! Error types for amb-core

use thiserror::Error;

/// Main error type for the message bus
#[derive(Error, Debug)]
pub enum BusError {
    /// Outbound payload could not be represented as JSON
    #[error("Message serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Inbound frame was not JSON, or was tagged but lacked the envelope shape
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BusError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }
}

/// Result type alias for amb-core
pub type Result<T> = std::result::Result<T, BusError>;
