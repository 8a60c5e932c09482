//! Host APIs used while talking to remote services.
//!
//! - [`http`] - HTTP client with tracing and status checking
//! - [`browser`] - Headless browser sessions for scripted logins

pub mod browser;
pub mod http;

// Re-export key types
pub use browser::{BrowserLauncher, BrowserSession, ChromiumLauncher, ChromiumSession};
pub use http::HttpClient;
