//! Error types for the aim assistant

use thiserror::Error;

/// Result type alias for the aim assistant
pub type Result<T> = std::result::Result<T, AssistError>;

/// Errors raised by configuration loading and external collaborators
///
/// None of these terminate the engagement loop: a failed capture skips the
/// tick and a failed actuation is logged and counted.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("Actuation failed: {0}")]
    Actuation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid frame buffer: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AssistError {
    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Self::FrameUnavailable(msg.into())
    }

    pub fn actuation<S: Into<String>>(msg: S) -> Self {
        Self::Actuation(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }
}
