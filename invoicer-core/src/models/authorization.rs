//! Authorization-code flow types.

use std::fmt;

use url::Url;

use crate::error::CoreError;

// ============================================================================
// Authorization Request
// ============================================================================

/// Parameters of an OAuth2 authorization-code request.
///
/// Built per provider and turned into the URL an operator (or the headless
/// browser) opens. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Provider's authorization endpoint.
    pub authorize_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// Requested scope (space separated).
    pub scope: String,
    /// Always `"code"`.
    pub response_type: String,
    /// Provider-specific extra query parameters.
    pub extra_params: Vec<(String, String)>,
}

impl AuthorizationRequest {
    /// Creates a `response_type=code` request.
    pub fn new(
        authorize_url: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            authorize_url: authorize_url.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            response_type: "code".to_string(),
            extra_params: Vec::new(),
        }
    }

    /// Adds an extra query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }

    /// Builds the full authorization URL.
    pub fn url(&self) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            CoreError::InvalidData(format!(
                "invalid authorization URL '{}': {e}",
                self.authorize_url
            ))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", &self.response_type)
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scope);
            for (key, value) in &self.extra_params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

// ============================================================================
// Authorization Code
// ============================================================================

/// One-shot authorization code. Consumed by a single token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Wraps a code, trimming surrounding whitespace. Empty input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim();
        (!code.is_empty()).then(|| Self(code.to_string()))
    }

    /// Extracts the `code` query parameter from a redirect URL.
    pub fn from_redirect_url(redirect: &str) -> Option<Self> {
        let url = Url::parse(redirect).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "code")
            .and_then(|(_, value)| Self::parse(&value))
    }

    /// The raw code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(***)")
    }
}
