//! Misoca API client.
//!
//! Every call re-checks the stored token first, so a token that expires
//! between two calls of one run is refreshed before the second.
//!
//! ## Endpoints
//!
//! - `GET /api/v3/invoices` - all invoices
//! - `POST /api/v3/invoice` - publish an invoice
//! - `GET /api/v3/invoice/{id}/pdf` - rendered PDF

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use invoicer_core::{Clock, InvoiceRecord, ProviderKind, SystemClock};
use invoicer_fetch::{HttpClient, TokenLifecycle, read_bytes, read_json};
use invoicer_store::{CredentialStore, Settings, ensure_dir};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::error::MisocaError;
use super::login::code_source;
use super::oauth::MisocaOAuth;
use super::payload::{InvoicePayload, last_month, strftime};

// ============================================================================
// PDF Target
// ============================================================================

/// Where downloaded PDFs go.
#[derive(Debug, Clone)]
pub struct PdfTarget {
    /// Destination directory.
    pub dir: PathBuf,
    /// strftime pattern applied to last month, without extension.
    pub filename_pattern: String,
}

impl PdfTarget {
    /// Creates a target.
    pub fn new(dir: impl Into<PathBuf>, filename_pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            filename_pattern: filename_pattern.into(),
        }
    }

    /// `<dir>/<last_month.strftime(pattern)>.pdf`
    pub fn path_for(&self, today: NaiveDate) -> Result<PathBuf, MisocaError> {
        let stem = strftime(last_month(today), &self.filename_pattern)?;
        Ok(self.dir.join(format!("{stem}.pdf")))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Authenticated Misoca API client.
pub struct MisocaClient<C = SystemClock> {
    lifecycle: TokenLifecycle<MisocaOAuth, C>,
    http: HttpClient,
    pdf: PdfTarget,
}

impl MisocaClient {
    /// Wires a client from settings, choosing the login mode they name.
    pub fn from_settings(settings: &Settings, http: HttpClient) -> Result<Self, MisocaError> {
        let oauth = MisocaOAuth::new(http.clone(), &settings.misoca);
        let store = CredentialStore::for_provider(&settings.credentials_dir, ProviderKind::Misoca);
        let source = code_source(&settings.misoca, &settings.handshake)?;
        let pdf = PdfTarget::new(settings.invoice_dir.clone(), settings.pdf_filename.clone());

        Ok(Self::new(
            TokenLifecycle::with_boxed_source(oauth, store, source),
            http,
            pdf,
        ))
    }
}

impl<C: Clock> MisocaClient<C> {
    /// Creates a client.
    pub fn new(lifecycle: TokenLifecycle<MisocaOAuth, C>, http: HttpClient, pdf: PdfTarget) -> Self {
        Self {
            lifecycle,
            http,
            pdf,
        }
    }

    /// The token lifecycle, for explicit authenticate/refresh.
    pub fn lifecycle(&self) -> &TokenLifecycle<MisocaOAuth, C> {
        &self.lifecycle
    }

    /// Today's date in local time.
    pub fn today(&self) -> NaiveDate {
        self.lifecycle.clock().now().with_timezone(&Local).date_naive()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.lifecycle.provider().base_url(), path.trim_start_matches('/'))
    }

    /// Lists all invoices, newest first.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, MisocaError> {
        info!("Trying to get invoices");
        let auth = self.lifecycle.authorization_header().await?;
        let call = "misoca.list_invoices";

        let response = self
            .http
            .get_with_auth(call, &self.url("/api/v3/invoices"), &auth)
            .await?;
        let mut invoices: Vec<InvoiceRecord> = read_json(call, response).await?;
        InvoiceRecord::sort_newest_first(&mut invoices);

        info!(count = invoices.len(), "Succeeded to get invoices");
        Ok(invoices)
    }

    /// Publishes an invoice.
    #[instrument(skip(self, payload), fields(invoice_number = %payload.invoice_number))]
    pub async fn publish_invoice(&self, payload: &InvoicePayload) -> Result<(), MisocaError> {
        info!("Trying to publish invoice");
        let auth = self.lifecycle.authorization_header().await?;
        let call = "misoca.publish_invoice";

        let response = self
            .http
            .post_json_with_auth(call, &self.url("/api/v3/invoice"), &auth, payload)
            .await?;
        let created: Value = response.json().await.unwrap_or(Value::Null);

        info!(id = %created.get("id").unwrap_or(&serde_json::Value::Null), "Succeeded to publish invoice");
        Ok(())
    }

    /// Downloads an invoice's PDF and returns where it was written.
    #[instrument(skip(self))]
    pub async fn download_invoice_pdf(&self, id: i64) -> Result<PathBuf, MisocaError> {
        info!("Trying to download invoice PDF");
        let path = self.pdf.path_for(self.today())?;
        let auth = self.lifecycle.authorization_header().await?;
        let call = "misoca.download_invoice_pdf";

        let response = self
            .http
            .get_with_auth(call, &self.url(&format!("/api/v3/invoice/{id}/pdf")), &auth)
            .await?;
        let bytes = read_bytes(call, response).await?;

        write_pdf(&path, &bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "Succeeded to download invoice PDF");
        Ok(path)
    }
}

async fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), MisocaError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| MisocaError::WritePdf {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("PDF written");
    Ok(())
}
