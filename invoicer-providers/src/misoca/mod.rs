//! Misoca (invoicing) provider implementation.
//!
//! This provider supports:
//!
//! - OAuth2 authorization code flow against Misoca's Doorkeeper server
//! - Code hand-off through a signal file, or a scripted Yayoi ID login
//! - Publishing the monthly invoice and downloading its PDF
//!
//! ## API Endpoints
//!
//! - `GET /oauth2/authorize` - authorization page
//! - `POST /oauth2/token` - code exchange and refresh
//! - `GET /api/v3/invoices` - list invoices
//! - `POST /api/v3/invoice` - publish an invoice
//! - `GET /api/v3/invoice/{id}/pdf` - download an invoice PDF

// Modules
mod api;
mod error;
pub mod login;
mod oauth;
pub mod payload;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use api::{MisocaClient, PdfTarget};
pub use error::MisocaError;
pub use oauth::MisocaOAuth;
pub use payload::InvoicePayload;
