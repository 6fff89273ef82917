//! Error types for the handler.

use thiserror::Error;

/// Errors raised inside the handler. None of these reach the host as an error
/// response except a failed response serialization.
#[derive(Debug, Error)]
pub enum CfpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CfpError>;
