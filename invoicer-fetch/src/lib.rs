// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Invoicer Fetch
//!
//! Credential lifecycle and remote-call plumbing shared by every provider.
//!
//! ## Host APIs
//!
//! The [`host`] module wraps the outside world:
//!
//! - [`host::http`] - HTTP client; non-2xx responses become errors
//! - [`host::browser`] - Headless Chromium sessions
//!
//! ## Token Lifecycle
//!
//! - [`provider::CredentialProvider`] - a service's OAuth endpoints
//! - [`provider::AuthorizationCodeSource`] - where authorization codes come from
//! - [`handshake::Handshake`] - operator pastes the code into a signal file
//! - [`login::BrowserLogin`] - a scripted browser fills in the login form
//! - [`lifecycle::TokenLifecycle`] - expiry, refresh and persistence
//!
//! ## Example
//!
//! ```ignore
//! use invoicer_fetch::{Handshake, TokenLifecycle};
//! use invoicer_store::CredentialStore;
//!
//! let lifecycle = TokenLifecycle::new(
//!     provider,
//!     CredentialStore::for_provider(&dir, provider_kind),
//!     Handshake::new("/app/storage/auth_code.txt"),
//! );
//!
//! // Authorizes, refreshes or reuses the stored token as needed.
//! let header = lifecycle.authorization_header().await?;
//! ```

pub mod error;
pub mod handshake;
pub mod host;
pub mod lifecycle;
pub mod login;
pub mod oauth;
pub mod provider;

#[cfg(test)]
mod testing;

// Re-export key types at crate root

// Errors
pub use error::FetchError;

// Host APIs
pub use host::{
    browser::{BrowserLauncher, BrowserSession, ChromiumLauncher},
    http::{HttpClient, check_status, read_bytes, read_json},
};

// Lifecycle
pub use handshake::Handshake;
pub use lifecycle::TokenLifecycle;
pub use login::{BrowserLogin, LoginScript, LoginStep};
pub use oauth::TokenEndpoint;
pub use provider::{AuthorizationCodeSource, CredentialProvider, require_refresh_token};
