//! Extension points the token lifecycle is generic over.
//!
//! A [`CredentialProvider`] knows how to talk to one service's OAuth
//! endpoints. An [`AuthorizationCodeSource`] knows how to get a fresh
//! authorization code out of a human or a scripted browser. The two are
//! independent so a provider's login style can be swapped per environment.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use invoicer_fetch::{CredentialProvider, FetchError};
//!
//! struct MyProvider { /* ... */ }
//!
//! #[async_trait]
//! impl CredentialProvider for MyProvider {
//!     fn kind(&self) -> ProviderKind {
//!         ProviderKind::Misoca
//!     }
//!
//!     fn authorization_request(&self) -> AuthorizationRequest {
//!         AuthorizationRequest::new(authorize_url, client_id, redirect_uri, "write")
//!     }
//!
//!     async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenRecord, FetchError> {
//!         self.endpoint.exchange_code(code).await
//!     }
//!
//!     async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, FetchError> {
//!         // ...
//!     }
//! }
//! ```

use async_trait::async_trait;
use invoicer_core::{AuthorizationCode, AuthorizationRequest, ProviderKind, TokenRecord};
use url::Url;

use crate::error::FetchError;

// ============================================================================
// Credential Provider
// ============================================================================

/// OAuth endpoints of one remote service.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Which service this is.
    fn kind(&self) -> ProviderKind;

    /// The authorization request the operator or browser must complete.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Full authorization URL.
    fn authorization_url(&self) -> Result<Url, FetchError> {
        Ok(self.authorization_request().url()?)
    }

    /// Exchanges a one-shot authorization code for a token record.
    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenRecord, FetchError>;

    /// Obtains a new token record from `record`'s refresh token.
    ///
    /// Callers guarantee `record.refresh_token` is present.
    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, FetchError>;
}

// ============================================================================
// Authorization Code Source
// ============================================================================

/// Produces an authorization code for a request.
///
/// Implementations may block for a long time (waiting on an operator) and
/// report deadline overruns as [`FetchError::AuthenticationTimeout`].
#[async_trait]
pub trait AuthorizationCodeSource: Send + Sync {
    /// Short identifier for logs (e.g., "handshake", "browser").
    fn id(&self) -> &str;

    /// Obtains a code for `request`.
    async fn acquire(&self, request: &AuthorizationRequest) -> Result<AuthorizationCode, FetchError>;
}

/// Pulls the refresh token out of a record, or reports why it can't.
pub fn require_refresh_token(record: &TokenRecord) -> Result<&str, FetchError> {
    record
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            FetchError::InvalidCredentials("token record has no 'refresh_token'".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_refresh_token() {
        let record = TokenRecord::new("A").with_refresh_token("R");
        assert_eq!(require_refresh_token(&record).unwrap(), "R");

        let missing = TokenRecord::new("A");
        assert!(matches!(
            require_refresh_token(&missing),
            Err(FetchError::InvalidCredentials(_))
        ));

        let empty = TokenRecord::new("A").with_refresh_token("");
        assert!(require_refresh_token(&empty).is_err());
    }
}
