//! Error types for the bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bridge
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Session not yet authenticated; retry later
    #[error("WhatsApp client not ready")]
    ClientNotReady,

    /// Missing or malformed request fields
    #[error("validation error: {0}")]
    Validation(String),

    /// Media resource could not be read or fetched
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),

    /// Opaque failure reported by the session transport
    #[error("{0}")]
    Send(String),

    /// Webhook forwarding failed
    #[error("forward error: {0}")]
    Forward(String),

    /// Session sidecar error
    #[error("session error: {0}")]
    Session(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the caller may retry the same request later without changes
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ClientNotReady | Self::Session(_) | Self::Http(_))
    }
}
