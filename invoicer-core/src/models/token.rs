//! Persisted OAuth2 token records.
//!
//! A record is stored as the token endpoint returned it, so provider-specific
//! fields (`token_type`, `scope`, ...) survive a load/save cycle untouched.
//!
//! ```json
//! {
//!   "access_token": "...",
//!   "refresh_token": "...",
//!   "created_at": 1735000000,
//!   "expires_in": 3600,
//!   "token_type": "Bearer"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// OAuth2 token plus the fields needed to compute its expiry.
///
/// `created_at + expires_in` is the absolute expiry instant (Unix seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token sent with every API call.
    pub access_token: String,

    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the token was issued (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Any other fields the token endpoint returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    /// Creates a record holding only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            created_at: None,
            expires_in: None,
            extra: Map::new(),
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Sets issue time and lifetime.
    #[must_use]
    pub fn with_expiry(mut self, created_at: i64, expires_in: i64) -> Self {
        self.created_at = Some(created_at);
        self.expires_in = Some(expires_in);
        self
    }

    /// Absolute expiry instant in Unix seconds.
    ///
    /// Fails when either `created_at` or `expires_in` is absent; such a
    /// record can be neither trusted nor distrusted.
    pub fn expires_at(&self) -> Result<i64, CoreError> {
        let created_at = self.created_at.ok_or_else(|| {
            CoreError::InvalidCredentials("token record is missing 'created_at'".to_string())
        })?;
        let expires_in = self.expires_in.ok_or_else(|| {
            CoreError::InvalidCredentials("token record is missing 'expires_in'".to_string())
        })?;

        created_at.checked_add(expires_in).ok_or_else(|| {
            CoreError::InvalidCredentials(format!(
                "token expiry overflows: created_at={created_at}, expires_in={expires_in}"
            ))
        })
    }

    /// Whether the token has expired at `now` (Unix seconds).
    ///
    /// A token is still valid at exactly its expiry instant.
    pub fn is_expired_at(&self, now: i64) -> Result<bool, CoreError> {
        Ok(now > self.expires_at()?)
    }

    /// Stamps `created_at` with `now` when the token endpoint did not send one.
    #[must_use]
    pub fn stamped(mut self, now: i64) -> Self {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self
    }

    /// Keeps the previous refresh token when a refresh response omits it.
    #[must_use]
    pub fn inherit_refresh_token(mut self, previous: &TokenRecord) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token.clone_from(&previous.refresh_token);
        }
        self
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_expired_before_deadline() {
        let record = TokenRecord::new("A").with_expiry(1000, 3600);
        assert!(!record.is_expired_at(1000).unwrap());
        assert!(!record.is_expired_at(4599).unwrap());
    }

    #[test]
    fn test_not_expired_at_exact_deadline() {
        let record = TokenRecord::new("A").with_expiry(1000, 3600);
        assert!(!record.is_expired_at(4600).unwrap());
    }

    #[test]
    fn test_expired_after_deadline() {
        let record = TokenRecord::new("A").with_expiry(1000, 3600);
        assert!(record.is_expired_at(1000 + 3600 + 1).unwrap());
    }

    #[test]
    fn test_missing_expires_in_is_invalid() {
        let mut record = TokenRecord::new("A");
        record.created_at = Some(1000);
        let err = record.is_expired_at(0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials(msg) if msg.contains("expires_in")));
    }

    #[test]
    fn test_missing_created_at_is_invalid() {
        let mut record = TokenRecord::new("A");
        record.expires_in = Some(3600);
        let err = record.is_expired_at(i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials(msg) if msg.contains("created_at")));
    }

    #[test]
    fn test_stamped_keeps_existing_created_at() {
        let record = TokenRecord::new("A").with_expiry(1000, 60).stamped(5000);
        assert_eq!(record.created_at, Some(1000));

        let record = TokenRecord::new("A").stamped(5000);
        assert_eq!(record.created_at, Some(5000));
    }

    #[test]
    fn test_inherit_refresh_token() {
        let previous = TokenRecord::new("old").with_refresh_token("R");

        let refreshed = TokenRecord::new("new").inherit_refresh_token(&previous);
        assert_eq!(refreshed.refresh_token.as_deref(), Some("R"));

        let rotated = TokenRecord::new("new")
            .with_refresh_token("R2")
            .inherit_refresh_token(&previous);
        assert_eq!(rotated.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_bearer() {
        assert_eq!(TokenRecord::new("abc").bearer(), "Bearer abc");
    }
}
