// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Invoicer Providers
//!
//! Concrete clients for the two remote services the monthly run talks to,
//! and the workflow that sequences them.
//!
//! | Provider | Role | Token endpoint | Interactive login |
//! |----------|------|----------------|-------------------|
//! | Misoca | invoices | `{base}/oauth2/token` | handshake file or headless browser |
//! | Gmail | mail drafts | from client secrets | handshake file |
//!
//! ## Usage
//!
//! ```ignore
//! use invoicer_fetch::HttpClient;
//! use invoicer_providers::gmail::GmailClient;
//! use invoicer_providers::misoca::MisocaClient;
//! use invoicer_providers::workflow::{GmailDrafts, InvoiceWorkflow, MisocaInvoices};
//! use invoicer_store::{InvoiceSettings, MailSettings, Settings};
//!
//! let settings = Settings::from_env()?;
//! let http = HttpClient::new()?;
//! let misoca = MisocaClient::from_settings(&settings, http.clone())?;
//! let gmail = GmailClient::from_settings(&settings, http).await?;
//!
//! let mut workflow = InvoiceWorkflow::new(MisocaInvoices::new(misoca, InvoiceSettings::from_env()?))
//!     .with_drafts(GmailDrafts::new(gmail, MailSettings::from_env()?));
//! let draft_id = workflow.run_default().await?;
//! ```

pub mod gmail;
pub mod misoca;
pub mod workflow;

pub use gmail::{GmailClient, GmailError};
pub use misoca::{InvoicePayload, MisocaClient, MisocaError};
pub use workflow::{
    DraftService, GmailDrafts, InvoiceService, InvoiceWorkflow, MisocaInvoices, WorkflowError,
    WorkflowStage,
};
