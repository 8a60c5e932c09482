//! Text output formatting with colors.

use std::path::Path;

use chrono::{DateTime, Local};
use invoicer_core::{InvoiceRecord, ProviderKind, TokenRecord};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One line per invoice: id, creation time, contact id.
    pub fn format_invoices(&self, invoices: &[InvoiceRecord]) -> String {
        if invoices.is_empty() {
            return format!("{}\n", self.dim("No invoices"));
        }

        let mut out = format!("{}\n", self.bold(&format!("{:<10} {:<26} {}", "ID", "CREATED", "CONTACT")));
        for invoice in invoices {
            let contact = invoice
                .contact_id
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            out.push_str(&format!(
                "{:<10} {:<26} {}\n",
                invoice.id,
                invoice.created_at.to_rfc3339(),
                contact
            ));
        }
        out
    }

    /// Saved file path.
    pub fn format_path(&self, path: &Path) -> String {
        format!("{} {}", self.green("Saved"), path.display())
    }

    /// Stored token summary.
    pub fn format_token(&self, provider: ProviderKind, record: &TokenRecord) -> String {
        let expiry = match record.expires_at() {
            Ok(ts) => DateTime::from_timestamp(ts, 0).map_or_else(
                || ts.to_string(),
                |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            Err(_) => self.yellow("unknown"),
        };
        let refresh = if record.refresh_token.as_deref().is_some_and(|t| !t.is_empty()) {
            ""
        } else {
            " (no refresh token)"
        };

        format!(
            "{} token stored, expires {expiry}{refresh}",
            self.bold(provider.display_name())
        )
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }
}
