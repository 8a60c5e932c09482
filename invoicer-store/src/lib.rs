// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Invoicer Store
//!
//! Persistent state and configuration for Invoicer.
//!
//! - **CredentialStore**: one JSON token record per provider, rewritten
//!   atomically after every exchange or refresh
//! - **Persistence**: JSON file helpers with owner-only permissions
//! - **Config**: settings read from the environment (and `.env`)
//!
//! The credential file is the only shared mutable state. Nothing locks it:
//! two processes running against the same directory will race.

pub mod config;
pub mod credentials;
pub mod error;
pub mod persistence;

pub use config::{
    GmailSettings, HandshakeSettings, InvoiceSettings, LoginMode, MailSettings, MisocaSettings,
    Settings, load_dotenv,
};
pub use credentials::CredentialStore;
pub use error::StoreError;
pub use persistence::{ensure_dir, load_json, save_json, set_mode};
