//! Domain models for Invoicer.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider kinds
//! - [`token`] - Persisted OAuth2 token records
//! - [`authorization`] - Authorization-code requests and codes
//! - [`invoice`] - Invoice records and mail attachments

mod authorization;
mod invoice;
mod provider;
mod token;

pub use authorization::{AuthorizationCode, AuthorizationRequest};
pub use invoice::{Attachments, InvoiceRecord};
pub use provider::ProviderKind;
pub use token::TokenRecord;
