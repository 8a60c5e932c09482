//! End-to-end invoicing workflow.
//!
//! ```text
//! idle → token-ensured → invoice-published → invoices-listed
//!      → pdf-downloaded → draft-created → done
//! ```
//!
//! Each step is one provider call. The first failure ends the run; nothing
//! already done (e.g. a published invoice) is rolled back.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use invoicer_core::{Attachments, Clock, InvoiceRecord};
use invoicer_store::{InvoiceSettings, MailSettings};
use thiserror::Error;
use tracing::info;

use crate::gmail::{GmailClient, GmailError};
use crate::misoca::{InvoicePayload, MisocaClient, MisocaError};

// ============================================================================
// Errors
// ============================================================================

/// Workflow failure.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Invoicing provider failure.
    #[error(transparent)]
    Invoicing(#[from] MisocaError),

    /// Mail provider failure.
    #[error(transparent)]
    Mail(#[from] GmailError),

    /// The invoice list came back empty right after publishing.
    #[error("No invoices found after publishing")]
    NoInvoices,
}

// ============================================================================
// Stages
// ============================================================================

/// How far a run has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    /// Nothing done yet.
    Idle,
    /// Tokens are usable.
    TokenEnsured,
    /// Invoice published.
    InvoicePublished,
    /// Invoice list fetched.
    InvoicesListed,
    /// PDF on disk.
    PdfDownloaded,
    /// Draft created.
    DraftCreated,
    /// Finished.
    Done,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::TokenEnsured => "token-ensured",
            Self::InvoicePublished => "invoice-published",
            Self::InvoicesListed => "invoices-listed",
            Self::PdfDownloaded => "pdf-downloaded",
            Self::DraftCreated => "draft-created",
            Self::Done => "done",
        })
    }
}

// ============================================================================
// Service Seams
// ============================================================================

/// Invoicing side of the workflow.
#[async_trait]
pub trait InvoiceService: Send + Sync {
    /// Makes sure a usable token is stored.
    async fn ensure_token(&self) -> Result<(), WorkflowError>;
    /// Publishes this month's invoice.
    async fn publish_invoice(&self) -> Result<(), WorkflowError>;
    /// All invoices, newest first.
    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, WorkflowError>;
    /// Downloads an invoice PDF.
    async fn download_invoice_pdf(&self, id: i64) -> Result<PathBuf, WorkflowError>;
}

/// Mail side of the workflow.
#[async_trait]
pub trait DraftService: Send + Sync {
    /// Makes sure a usable token is stored.
    async fn ensure_token(&self) -> Result<(), WorkflowError>;
    /// Creates the invoice mail draft.
    async fn create_draft(&self, attachments: Attachments) -> Result<String, WorkflowError>;
}

/// Misoca client plus the business fields its invoice is built from.
pub struct MisocaInvoices<C> {
    client: MisocaClient<C>,
    invoice: InvoiceSettings,
}

impl<C: Clock> MisocaInvoices<C> {
    /// Pairs a client with invoice settings.
    pub fn new(client: MisocaClient<C>, invoice: InvoiceSettings) -> Self {
        Self { client, invoice }
    }
}

#[async_trait]
impl<C: Clock> InvoiceService for MisocaInvoices<C> {
    async fn ensure_token(&self) -> Result<(), WorkflowError> {
        self.client
            .lifecycle()
            .ensure_valid_token()
            .await
            .map_err(MisocaError::from)?;
        Ok(())
    }

    async fn publish_invoice(&self) -> Result<(), WorkflowError> {
        let payload = InvoicePayload::build(&self.invoice, self.client.today())?;
        Ok(self.client.publish_invoice(&payload).await?)
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, WorkflowError> {
        Ok(self.client.list_invoices().await?)
    }

    async fn download_invoice_pdf(&self, id: i64) -> Result<PathBuf, WorkflowError> {
        Ok(self.client.download_invoice_pdf(id).await?)
    }
}

/// Gmail client plus the mail settings its drafts are built from.
pub struct GmailDrafts<C> {
    client: GmailClient<C>,
    mail: MailSettings,
}

impl<C: Clock> GmailDrafts<C> {
    /// Pairs a client with mail settings.
    pub fn new(client: GmailClient<C>, mail: MailSettings) -> Self {
        Self { client, mail }
    }
}

#[async_trait]
impl<C: Clock> DraftService for GmailDrafts<C> {
    async fn ensure_token(&self) -> Result<(), WorkflowError> {
        self.client
            .lifecycle()
            .ensure_valid_token()
            .await
            .map_err(GmailError::from)?;
        Ok(())
    }

    async fn create_draft(&self, attachments: Attachments) -> Result<String, WorkflowError> {
        Ok(self.client.create_draft(&self.mail, attachments).await?)
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// Sequences provider calls into the monthly run.
pub struct InvoiceWorkflow<I, D = ()> {
    invoices: I,
    drafts: D,
    stage: WorkflowStage,
}

impl<I: InvoiceService> InvoiceWorkflow<I> {
    /// Creates an invoicing-only workflow.
    pub fn new(invoices: I) -> Self {
        Self {
            invoices,
            drafts: (),
            stage: WorkflowStage::Idle,
        }
    }
}

impl<I: InvoiceService, D> InvoiceWorkflow<I, D> {
    /// Adds the mail side, enabling [`InvoiceWorkflow::run_default`].
    pub fn with_drafts<D2: DraftService>(self, drafts: D2) -> InvoiceWorkflow<I, D2> {
        InvoiceWorkflow {
            invoices: self.invoices,
            drafts,
            stage: self.stage,
        }
    }

    /// Last stage reached.
    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    fn advance(&mut self, stage: WorkflowStage) {
        info!(from = %self.stage, to = %stage, "Workflow stage reached");
        self.stage = stage;
    }

    async fn publish_and_list(&mut self) -> Result<InvoiceRecord, WorkflowError> {
        self.invoices.publish_invoice().await?;
        self.advance(WorkflowStage::InvoicePublished);

        let invoices = self.invoices.list_invoices().await?;
        self.advance(WorkflowStage::InvoicesListed);

        invoices.into_iter().next().ok_or(WorkflowError::NoInvoices)
    }

    /// Publishes the invoice and downloads its PDF.
    pub async fn publish_invoice(&mut self) -> Result<PathBuf, WorkflowError> {
        self.invoices.ensure_token().await?;
        self.advance(WorkflowStage::TokenEnsured);

        let latest = self.publish_and_list().await?;
        let path = self.invoices.download_invoice_pdf(latest.id).await?;
        self.advance(WorkflowStage::PdfDownloaded);
        Ok(path)
    }

    /// Publishes the invoice and reports the newest invoice's contact id.
    pub async fn confirm_contact_id(&mut self) -> Result<Option<i64>, WorkflowError> {
        self.invoices.ensure_token().await?;
        self.advance(WorkflowStage::TokenEnsured);

        let latest = self.publish_and_list().await?;
        self.advance(WorkflowStage::Done);
        Ok(latest.contact_id)
    }
}

impl<I: InvoiceService, D: DraftService> InvoiceWorkflow<I, D> {
    /// Full run: publish, download, draft. Returns the draft id.
    ///
    /// Both tokens are ensured up front, so any interactive authorization
    /// happens before the invoice is published.
    pub async fn run_default(&mut self) -> Result<String, WorkflowError> {
        self.invoices.ensure_token().await?;
        self.drafts.ensure_token().await?;
        self.advance(WorkflowStage::TokenEnsured);

        let latest = self.publish_and_list().await?;
        let path = self.invoices.download_invoice_pdf(latest.id).await?;
        self.advance(WorkflowStage::PdfDownloaded);

        let draft_id = self.drafts.create_draft(Attachments::from(path)).await?;
        self.advance(WorkflowStage::DraftCreated);

        self.advance(WorkflowStage::Done);
        Ok(draft_id)
    }
}

// ============================================================================
// Tests
// ============================================================================
