//! Error types for the notification client
//!
//! Construction paths (configuration, session bootstrap, wire decoding)
//! return these errors. The running pipeline logs them and carries on.

use thiserror::Error;

/// Result type used across the crate
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors raised by the notification client
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Invalid or unparseable configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error while reading local storage
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored profile is missing a required field
    #[error("invalid profile: {0}")]
    Profile(String),

    /// Stored session token could not be decoded
    #[error("invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// WebSocket level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed Engine.IO / Socket.IO packet
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for NotifyError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        NotifyError::Transport(e.to_string())
    }
}
