//! Misoca-specific errors.

use std::path::PathBuf;

use invoicer_fetch::FetchError;
use thiserror::Error;

/// Misoca-specific errors.
#[derive(Debug, Error)]
pub enum MisocaError {
    /// Token lifecycle or remote call failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A configured strftime pattern could not be rendered.
    #[error("Invalid date pattern '{0}'")]
    DatePattern(String),

    /// The downloaded PDF could not be written.
    #[error("Failed to write invoice PDF {}: {source}", path.display())]
    WritePdf {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl From<invoicer_store::StoreError> for MisocaError {
    fn from(err: invoicer_store::StoreError) -> Self {
        Self::Fetch(err.into())
    }
}
