//! Gmail-specific errors.

use std::path::PathBuf;

use invoicer_fetch::FetchError;
use thiserror::Error;

/// Gmail-specific errors.
///
/// Everything except [`GmailError::Fetch`] is raised before any remote call.
#[derive(Debug, Error)]
pub enum GmailError {
    /// Token lifecycle or remote call failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// `client_secrets.json` is missing or malformed.
    #[error("Invalid client secrets {}: {reason}", path.display())]
    ClientSecrets {
        /// Secrets file path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// The mail template could not be read.
    #[error("Failed to load invoice mail template {}: {source}", path.display())]
    Template {
        /// Template path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// No `To` recipients configured.
    #[error("No recipients: INVOICE_MAIL_TO_ADDRESSES is empty")]
    NoRecipients,

    /// An attachment could not be read.
    #[error("Failed to attach file {}: {source}", path.display())]
    Attachment {
        /// Attachment path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
