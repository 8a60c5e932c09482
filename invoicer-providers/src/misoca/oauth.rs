//! Misoca OAuth2 endpoints.
//!
//! Misoca is a Doorkeeper server: the token response carries `created_at`
//! and `expires_in` itself, and refresh requests repeat the redirect URI.

use async_trait::async_trait;
use invoicer_core::{AuthorizationCode, AuthorizationRequest, ProviderKind, TokenRecord};
use invoicer_fetch::{
    CredentialProvider, FetchError, HttpClient, TokenEndpoint, require_refresh_token,
};
use invoicer_store::MisocaSettings;

/// Scope needed to publish invoices.
pub const SCOPE: &str = "write";

/// Misoca's OAuth client.
#[derive(Debug, Clone)]
pub struct MisocaOAuth {
    base_url: String,
    client_id: String,
    redirect_uri: String,
    endpoint: TokenEndpoint,
}

impl MisocaOAuth {
    /// Creates the provider from settings.
    pub fn new(http: HttpClient, settings: &MisocaSettings) -> Self {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let endpoint = TokenEndpoint::new(
            http,
            "misoca",
            format!("{base_url}/oauth2/token"),
            settings.client_id.clone(),
            settings.client_secret.clone(),
            settings.redirect_uri.clone(),
        );

        Self {
            base_url,
            client_id: settings.client_id.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            endpoint,
        }
    }

    /// API root without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CredentialProvider for MisocaOAuth {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Misoca
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new(
            format!("{}/oauth2/authorize", self.base_url),
            self.client_id.clone(),
            self.redirect_uri.clone(),
            SCOPE,
        )
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenRecord, FetchError> {
        self.endpoint.exchange_code(code).await
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, FetchError> {
        let refresh_token = require_refresh_token(record)?;
        self.endpoint.refresh(refresh_token).await
    }
}
