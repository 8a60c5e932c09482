//! Shared fixtures for Misoca tests.

use std::time::Duration;

use invoicer_store::{LoginMode, MisocaSettings};

pub(crate) fn settings(base_url: &str) -> MisocaSettings {
    MisocaSettings {
        base_url: base_url.to_string(),
        client_id: "cid".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "https://example.com/callback".to_string(),
        login_mode: LoginMode::Handshake,
        email: None,
        password: None,
        browser_wait_timeout: Duration::from_secs(10),
    }
}
