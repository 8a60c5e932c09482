// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Invoicer Core
//!
//! Core types, models, and traits shared by every Invoicer crate.
//!
//! - Domain models (token records, authorization requests, invoices)
//! - Error types
//! - The [`Clock`] seam used for token expiry decisions
//!
//! ## Key Types
//!
//! ### Credentials
//! - [`TokenRecord`] - Persisted OAuth2 token plus its expiry fields
//! - [`AuthorizationRequest`] - Parameters of an authorization-code request
//! - [`AuthorizationCode`] - One-shot code handed back by the provider
//!
//! ### Remote Resources
//! - [`InvoiceRecord`] - Invoice as returned by the invoicing service
//! - [`Attachments`] - Files attached to a mail draft
//!
//! ### Providers
//! - [`ProviderKind`] - The two external services this program talks to

pub mod error;
pub mod models;
pub mod traits;

pub use error::CoreError;

pub use models::{
    // Credentials
    AuthorizationCode,
    AuthorizationRequest,
    TokenRecord,
    // Remote resources
    Attachments,
    InvoiceRecord,
    // Providers
    ProviderKind,
};

pub use traits::{Clock, ManualClock, SystemClock};
