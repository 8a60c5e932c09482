//! Gmail (mail) provider implementation.
//!
//! This provider supports:
//!
//! - Google OAuth2 for installed applications, offline access
//! - Authorization codes handed over through the signal file
//! - Creating the invoice mail as a draft, with any number of attachments
//!
//! ## API Endpoints
//!
//! - `POST https://oauth2.googleapis.com/token` - code exchange and refresh
//! - `POST /gmail/v1/users/me/drafts` - create a draft

// Modules
mod api;
mod error;
pub mod message;
mod oauth;


// Re-exports
pub use api::{DRAFTS_URL, GmailClient};
pub use error::GmailError;
pub use message::{MailAttachment, MailMessage};
pub use oauth::{ClientSecrets, GmailOAuth};
