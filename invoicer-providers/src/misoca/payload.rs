//! Invoice publish request body.
//!
//! ```json
//! {
//!   "invoice_number": "20250131-001",
//!   "issue_date": "2025-01-31",
//!   "subject": "December 2024 consulting",
//!   "recipient_name": "...",
//!   "recipient_title": "御中",
//!   "contact_id": 123,
//!   "body": { "sender_name1": "...", "tax_option": "INCLUDE", ... },
//!   "items": [{ "name": "...", "quantity": 1.0, "unit_price": 480000.0, ... }]
//! }
//! ```

use std::fmt::Write;

use chrono::{Datelike, Days, Months, NaiveDate};
use invoicer_store::InvoiceSettings;
use serde::Serialize;

use super::error::MisocaError;

/// Prices include consumption tax.
pub const TAX_OPTION: &str = "INCLUDE";

/// Fractions of a yen are dropped.
pub const TAX_ROUNDING_POLICY: &str = "FLOOR";

/// Standard 10% consumption tax.
pub const TAX_TYPE: &str = "STANDARD_TAX_10";

// ============================================================================
// Payload
// ============================================================================

/// Body of `POST /api/v3/invoice`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePayload {
    /// `YYYYMMDD-001` of the issue day.
    pub invoice_number: String,
    /// Last day of the current month, `YYYY-MM-DD`.
    pub issue_date: String,
    /// Subject pattern rendered with last month's date.
    pub subject: String,
    /// Addressee.
    pub recipient_name: String,
    /// Addressee honorific.
    pub recipient_title: String,
    /// Misoca contact the invoice is filed under.
    pub contact_id: i64,
    /// Sender block.
    pub body: InvoiceBody,
    /// Line items.
    pub items: Vec<InvoiceItem>,
}

/// Sender details and payment terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceBody {
    /// Sender name.
    pub sender_name1: String,
    /// Sender phone.
    pub sender_tel: String,
    /// Sender email.
    pub sender_email: String,
    /// Tax inclusion.
    pub tax_option: String,
    /// Tax rounding.
    pub tax_rounding_policy: String,
    /// Free-form notes.
    pub notes: String,
    /// Where to pay.
    pub bank_accounts: Vec<BankAccount>,
}

/// Bank account shown on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankAccount {
    /// Account description.
    pub detail: String,
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    /// Item name.
    pub name: String,
    /// Quantity.
    pub quantity: f64,
    /// Price per unit.
    pub unit_price: f64,
    /// Tax category.
    pub tax_type: String,
    /// Whether withholding tax applies.
    pub excluding_withholding_tax: bool,
}

impl InvoicePayload {
    /// Builds this month's invoice, issued on `today`.
    pub fn build(settings: &InvoiceSettings, today: NaiveDate) -> Result<Self, MisocaError> {
        let subject = strftime(last_month(today), &settings.subject)?;

        Ok(Self {
            invoice_number: format!("{}-001", today.format("%Y%m%d")),
            issue_date: last_day_of_month(today).format("%Y-%m-%d").to_string(),
            subject,
            recipient_name: settings.recipient_name.clone(),
            recipient_title: settings.recipient_title.clone(),
            contact_id: settings.contact_id,
            body: InvoiceBody {
                sender_name1: settings.sender_name.clone(),
                sender_tel: settings.sender_tel.clone(),
                sender_email: settings.sender_email.clone(),
                tax_option: TAX_OPTION.to_string(),
                tax_rounding_policy: TAX_ROUNDING_POLICY.to_string(),
                notes: settings.notes.clone(),
                bank_accounts: vec![BankAccount {
                    detail: settings.bank_account.clone(),
                }],
            },
            items: vec![InvoiceItem {
                name: settings.item_name.clone(),
                quantity: 1.0,
                unit_price: settings.hourly_wage * settings.total_working_hours,
                tax_type: TAX_TYPE.to_string(),
                excluding_withholding_tax: false,
            }],
        })
    }
}

// ============================================================================
// Date helpers
// ============================================================================

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of the month before `today`'s.
pub fn last_month(today: NaiveDate) -> NaiveDate {
    first_of_month(today) - Days::new(1)
}

/// Last day of `today`'s month.
pub fn last_day_of_month(today: NaiveDate) -> NaiveDate {
    first_of_month(today) + Months::new(1) - Days::new(1)
}

/// Renders a user-supplied strftime pattern, rejecting invalid specifiers.
pub fn strftime(date: NaiveDate, pattern: &str) -> Result<String, MisocaError> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern))
        .map_err(|_| MisocaError::DatePattern(pattern.to_string()))?;
    Ok(out)
}
