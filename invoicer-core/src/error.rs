//! Core error types for Invoicer.

use thiserror::Error;

/// Core error type for Invoicer operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A token record is malformed or lacks the fields expiry depends on.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Invalid data from an API response or a URL.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
