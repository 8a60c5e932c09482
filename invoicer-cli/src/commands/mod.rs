//! CLI command implementations.

pub mod auth;
pub mod draft;
pub mod invoices;
pub mod workflow;

use anyhow::Result;
use invoicer_fetch::HttpClient;
use invoicer_providers::{GmailClient, MisocaClient};
use invoicer_store::Settings;

/// Settings and the shared HTTP client, built once per process.
pub struct Context {
    settings: Settings,
    http: HttpClient,
}

impl Context {
    /// Loads settings from the environment and builds the HTTP client.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            settings: Settings::from_env()?,
            http: HttpClient::new()?,
        })
    }

    /// Invoicing client.
    pub fn misoca(&self) -> Result<MisocaClient> {
        Ok(MisocaClient::from_settings(&self.settings, self.http.clone())?)
    }

    /// Mail client. Reads the client secrets file.
    pub async fn gmail(&self) -> Result<GmailClient> {
        Ok(GmailClient::from_settings(&self.settings, self.http.clone()).await?)
    }
}
