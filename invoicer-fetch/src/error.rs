//! Fetch error types.

use std::time::Duration;

use invoicer_core::CoreError;
use invoicer_store::StoreError;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for token lifecycle and remote call operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Stored token is missing or malformed.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An interactive wait ran past its deadline.
    #[error("Timed out after {after:?} waiting for {waiting_for}")]
    AuthenticationTimeout {
        /// What was being waited for.
        waiting_for: String,
        /// How long we waited.
        after: Duration,
    },

    /// A step of the scripted login failed.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Non-2xx response or network failure.
    #[error("{call} failed: {detail}")]
    RemoteCall {
        /// Name of the originating call.
        call: String,
        /// Response body or transport error.
        detail: String,
    },

    /// Missing or unusable configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credential store failure.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Core error not covered above.
    #[error("Core error: {0}")]
    Core(CoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Builds a [`FetchError::RemoteCall`].
    pub fn remote(call: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::RemoteCall {
            call: call.into(),
            detail: detail.into(),
        }
    }

    /// Wraps a transport error from `call`.
    pub fn transport(call: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::remote(call, err.to_string())
    }

    /// Whether this is a remote call failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCall { .. })
    }
}

impl From<CoreError> for FetchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials(msg) => Self::InvalidCredentials(msg),
            CoreError::InvalidData(msg) => Self::Configuration(msg),
            other => Self::Core(other),
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingVar(_) | StoreError::Config(_) => {
                Self::Configuration(err.to_string())
            }
            StoreError::Serialization(e) => {
                Self::InvalidCredentials(format!("stored token is malformed: {e}"))
            }
            other @ StoreError::Io(_) => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_errors_become_configuration() {
        let err: FetchError = StoreError::MissingVar("MISOCA_CLIENT_ID".into()).into();
        assert!(matches!(err, FetchError::Configuration(ref m) if m.contains("MISOCA_CLIENT_ID")));
    }

    #[test]
    fn test_corrupt_record_becomes_invalid_credentials() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FetchError = StoreError::Serialization(json_err).into();
        assert!(matches!(err, FetchError::InvalidCredentials(_)));
    }

    #[test]
    fn test_core_invalid_credentials_passthrough() {
        let err: FetchError = CoreError::InvalidCredentials("missing 'expires_in'".into()).into();
        assert!(matches!(err, FetchError::InvalidCredentials(ref m) if m.contains("expires_in")));
    }

    #[test]
    fn test_remote_display_names_call() {
        let err = FetchError::remote("misoca.token", "HTTP 500: boom");
        assert_eq!(err.to_string(), "misoca.token failed: HTTP 500: boom");
        assert!(err.is_remote());
    }
}
