//! Google OAuth2 for an installed application.
//!
//! Client credentials come from the `client_secrets.json` downloaded from
//! the Google Cloud console:
//!
//! ```json
//! {
//!   "installed": {
//!     "client_id": "....apps.googleusercontent.com",
//!     "client_secret": "...",
//!     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
//!     "token_uri": "https://oauth2.googleapis.com/token",
//!     "redirect_uris": ["http://localhost"]
//!   }
//! }
//! ```
//!
//! Google's token response has no `created_at` and refresh responses have no
//! `refresh_token`; the lifecycle stamps the former and carries the latter.

use std::path::Path;

use async_trait::async_trait;
use invoicer_core::{AuthorizationCode, AuthorizationRequest, ProviderKind, TokenRecord};
use invoicer_fetch::{
    CredentialProvider, FetchError, HttpClient, TokenEndpoint, require_refresh_token,
};
use invoicer_store::{GmailSettings, load_json};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::GmailError;

// ============================================================================
// Constants
// ============================================================================

/// Google authorization endpoint.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// ============================================================================
// Client Secrets
// ============================================================================

/// Root of `client_secrets.json`.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// OAuth client registered in the Google Cloud console.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Authorization endpoint.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

impl ClientSecrets {
    /// Loads the `installed` (or `web`) section of a secrets file.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, GmailError> {
        let invalid = |reason: String| GmailError::ClientSecrets {
            path: path.to_path_buf(),
            reason,
        };
        let file: ClientSecretsFile = load_json(path).await.map_err(|e| invalid(e.to_string()))?;
        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid("neither 'installed' nor 'web' section present".to_string()))?;
        debug!(client_id = %secrets.client_id, "Client secrets loaded");
        Ok(secrets)
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Google's OAuth client for Gmail.
#[derive(Debug, Clone)]
pub struct GmailOAuth {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    redirect_uri: String,
    endpoint: TokenEndpoint,
}

impl GmailOAuth {
    /// Creates the provider. `redirect_uri` overrides the secrets' first entry.
    pub fn new(
        http: HttpClient,
        secrets: ClientSecrets,
        scopes: Vec<String>,
        redirect_uri: Option<String>,
    ) -> Result<Self, GmailError> {
        let redirect_uri = redirect_uri
            .or_else(|| secrets.redirect_uris.first().cloned())
            .ok_or_else(|| {
                FetchError::Configuration(
                    "no redirect URI: set GMAIL_REDIRECT_URI or add one to client_secrets.json"
                        .to_string(),
                )
            })?;

        let endpoint = TokenEndpoint::new(
            http,
            "gmail",
            secrets.token_uri.clone(),
            secrets.client_id.clone(),
            secrets.client_secret.clone(),
            redirect_uri.clone(),
        )
        .without_redirect_on_refresh();

        Ok(Self {
            secrets,
            scopes,
            redirect_uri,
            endpoint,
        })
    }

    /// Loads the secrets file named in settings and creates the provider.
    pub async fn from_settings(http: HttpClient, settings: &GmailSettings) -> Result<Self, GmailError> {
        let secrets = ClientSecrets::load(&settings.client_secrets_path).await?;
        Self::new(
            http,
            secrets,
            settings.scopes.clone(),
            settings.redirect_uri.clone(),
        )
    }
}

#[async_trait]
impl CredentialProvider for GmailOAuth {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gmail
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new(
            self.secrets.auth_uri.clone(),
            self.secrets.client_id.clone(),
            self.redirect_uri.clone(),
            self.scopes.join(" "),
        )
        .with_param("access_type", "offline")
        .with_param("prompt", "consent")
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenRecord, FetchError> {
        self.endpoint.exchange_code(code).await
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, FetchError> {
        let refresh_token = require_refresh_token(record)?;
        self.endpoint.refresh(refresh_token).await
    }
}
