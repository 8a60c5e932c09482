//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use invoicer_core::{ProviderKind, TokenRecord};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Stored token summary. The token values themselves are never printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOutput {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
}

impl TokenOutput {
    fn new(provider: ProviderKind, record: &TokenRecord) -> Self {
        Self {
            provider: provider.cli_name().to_string(),
            expires_at: record
                .expires_at()
                .ok()
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            has_refresh_token: record
                .refresh_token
                .as_deref()
                .is_some_and(|t| !t.is_empty()),
        }
    }
}

// ============================================================================
// Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serializes any value.
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }

    /// Formats a stored token summary.
    pub fn format_token(&self, provider: ProviderKind, record: &TokenRecord) -> Result<String> {
        self.format(&TokenOutput::new(provider, record))
    }
}
