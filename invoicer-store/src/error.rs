//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required setting is not set.
    #[error("Missing required setting: {0}")]
    MissingVar(String),

    /// A setting is set but unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if this error comes from configuration rather than I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(self, StoreError::MissingVar(_) | StoreError::Config(_))
    }
}
