//! OAuth2 token endpoint client.
//!
//! Both providers exchange codes and refresh tokens through the same
//! form-encoded POST:
//!
//! ```text
//! grant_type=authorization_code&code=...&redirect_uri=...&client_id=...&client_secret=...
//! grant_type=refresh_token&refresh_token=...&redirect_uri=...&client_id=...&client_secret=...
//! ```
//!
//! The JSON response must contain at least `access_token`; every other field
//! is kept on the [`TokenRecord`].

use std::fmt;

use invoicer_core::{AuthorizationCode, TokenRecord};
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::host::http::{HttpClient, read_json};

// ============================================================================
// Token Endpoint
// ============================================================================

/// Remote token endpoint for one OAuth client.
#[derive(Clone)]
pub struct TokenEndpoint {
    http: HttpClient,
    call: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    redirect_on_refresh: bool,
}

impl TokenEndpoint {
    /// Creates an endpoint client. `provider` prefixes the call name used in errors.
    pub fn new(
        http: HttpClient,
        provider: &str,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            http,
            call: format!("{provider}.token"),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            redirect_on_refresh: true,
        }
    }

    /// Leaves `redirect_uri` out of refresh requests.
    #[must_use]
    pub fn without_redirect_on_refresh(mut self) -> Self {
        self.redirect_on_refresh = false;
        self
    }

    /// Exchanges an authorization code for a token record.
    #[instrument(skip(self, code), fields(call = %self.call))]
    pub async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenRecord, FetchError> {
        debug!("Exchanging authorization code");
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request(&form).await
    }

    /// Exchanges a refresh token for a new token record.
    #[instrument(skip(self, refresh_token), fields(call = %self.call))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord, FetchError> {
        debug!("Refreshing access token");
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if self.redirect_on_refresh {
            form.push(("redirect_uri", self.redirect_uri.as_str()));
        }
        form.push(("client_id", self.client_id.as_str()));
        form.push(("client_secret", self.client_secret.as_str()));
        self.request(&form).await
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenRecord, FetchError> {
        let response = self.http.post_form(&self.call, &self.token_url, form).await?;
        read_json(&self.call, response).await
    }
}

impl fmt::Debug for TokenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEndpoint")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> TokenEndpoint {
        TokenEndpoint::new(
            HttpClient::new().unwrap(),
            "test",
            format!("{}/oauth2/token", server.uri()),
            "cid",
            "secret",
            "https://example.com/callback",
        )
    }

    #[tokio::test]
    async fn test_exchange_code_posts_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A",
                "refresh_token": "R",
                "created_at": 1000,
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let code = AuthorizationCode::parse("abc123").unwrap();
        let record = endpoint(&server).exchange_code(&code).await.unwrap();
        assert_eq!(record.access_token, "A");
        assert_eq!(record.refresh_token.as_deref(), Some("R"));
        assert_eq!(record.extra.get("token_type"), Some(&json!("Bearer")));
    }

    #[tokio::test]
    async fn test_refresh_without_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=R"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "B",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = endpoint(&server)
            .without_redirect_on_refresh()
            .refresh("R")
            .await
            .unwrap();
        assert_eq!(record.access_token, "B");
        assert_eq!(record.created_at, None);

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(!body.contains("redirect_uri"));
    }

    #[tokio::test]
    async fn test_response_without_access_token_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
            .mount(&server)
            .await;

        let err = endpoint(&server).refresh("R").await.unwrap_err();
        assert!(matches!(err, FetchError::RemoteCall { ref call, .. } if call == "test.token"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let ep = TokenEndpoint::new(
            HttpClient::new().unwrap(),
            "test",
            "https://example.com/token",
            "cid",
            "very-secret",
            "https://example.com/cb",
        );
        assert!(!format!("{ep:?}").contains("very-secret"));
    }
}
