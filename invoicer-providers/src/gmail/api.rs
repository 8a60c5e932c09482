//! Gmail API client.
//!
//! Only drafts are created; nothing is ever sent.

use invoicer_core::{Attachments, Clock, ProviderKind, SystemClock};
use invoicer_fetch::{Handshake, HttpClient, TokenLifecycle, read_json};
use invoicer_store::{CredentialStore, MailSettings, Settings};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::error::GmailError;
use super::message::{compose, random_boundary};
use super::oauth::GmailOAuth;

/// Drafts endpoint for the authenticated user.
pub const DRAFTS_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/drafts";

/// Response of `users.drafts.create`.
#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

/// Authenticated Gmail client.
pub struct GmailClient<C = SystemClock> {
    lifecycle: TokenLifecycle<GmailOAuth, C>,
    http: HttpClient,
    drafts_url: String,
    boundary: Option<String>,
}

impl GmailClient {
    /// Wires a client from settings. Authorization codes come through the handshake.
    pub async fn from_settings(settings: &Settings, http: HttpClient) -> Result<Self, GmailError> {
        let oauth = GmailOAuth::from_settings(http.clone(), &settings.gmail).await?;
        let store = CredentialStore::for_provider(&settings.credentials_dir, ProviderKind::Gmail);
        let handshake = Handshake::from_settings(&settings.handshake);

        Ok(Self::new(TokenLifecycle::new(oauth, store, handshake), http))
    }
}

impl<C: Clock> GmailClient<C> {
    /// Creates a client.
    pub fn new(lifecycle: TokenLifecycle<GmailOAuth, C>, http: HttpClient) -> Self {
        Self {
            lifecycle,
            http,
            drafts_url: DRAFTS_URL.to_string(),
            boundary: None,
        }
    }

    /// Points draft creation at another endpoint.
    #[must_use]
    pub fn with_drafts_url(mut self, url: impl Into<String>) -> Self {
        self.drafts_url = url.into();
        self
    }

    /// Uses a fixed multipart boundary instead of a random one.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// The token lifecycle, for explicit authenticate/refresh.
    pub fn lifecycle(&self) -> &TokenLifecycle<GmailOAuth, C> {
        &self.lifecycle
    }

    /// Creates the invoice mail draft and returns its id.
    ///
    /// Accepts no path, one path, or a list of paths. The message is fully
    /// built before any remote call is made.
    #[instrument(skip(self, mail, attachments))]
    pub async fn create_draft(
        &self,
        mail: &MailSettings,
        attachments: impl Into<Attachments> + Send,
    ) -> Result<String, GmailError> {
        let attachments = attachments.into();
        info!(attachments = attachments.len(), "Trying to create invoice mail draft");

        let message = compose(mail, &attachments).await?;
        let boundary = self.boundary.clone().unwrap_or_else(random_boundary);
        let body = json!({ "message": { "raw": message.encode_raw(&boundary) } });

        let auth = self.lifecycle.authorization_header().await?;
        let call = "gmail.create_draft";
        let response = self
            .http
            .post_json_with_auth(call, &self.drafts_url, &auth, &body)
            .await?;
        let draft: DraftResponse = read_json(call, response).await?;

        info!(draft_id = %draft.id, "Draft created");
        Ok(draft.id)
    }
}
