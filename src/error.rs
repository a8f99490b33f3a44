//! Error types for cogflux

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors that can occur during computation
///
/// Insufficient history is not represented here: every stage answers with a
/// documented neutral result instead.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse session payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid session: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate session id: {0}")]
    DuplicateSession(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to load trend model: {0}")]
    ModelLoad(String),

    #[error("Trend model shape mismatch: {0}")]
    ModelShape(String),

    #[error("Message failed safety check: {0}")]
    UnsafeMessage(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
