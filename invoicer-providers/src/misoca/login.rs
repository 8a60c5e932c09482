//! How Misoca authorization codes are obtained.
//!
//! Misoca signs in through a Yayoi ID form, so the browser script clicks
//! through to Yayoi, submits the identifier, then the password.

use invoicer_fetch::{
    AuthorizationCodeSource, BrowserLogin, ChromiumLauncher, FetchError, Handshake, LoginScript,
    LoginStep,
};
use invoicer_store::{HandshakeSettings, LoginMode, MisocaSettings};
use tracing::debug;

/// "Log in with Yayoi ID" button on the authorize page.
pub const YAYOI_ENTRY_SELECTOR: &str = ".c-btn--l.c-btn--yayoi.c-btn--block.u-margin-bottom--small";
/// Yayoi ID input.
pub const ID_INPUT_SELECTOR: &str = "#yayoi_id_input";
/// Continue button after the ID.
pub const NEXT_BUTTON_SELECTOR: &str = "#next_btn";
/// Password input.
pub const PASSWORD_INPUT_SELECTOR: &str = "#password_input";
/// Final login button.
pub const LOGIN_BUTTON_SELECTOR: &str = "#login_btn";

/// Browser script for the Yayoi ID login form.
pub fn login_script(email: &str, password: &str) -> LoginScript {
    LoginScript::new(vec![
        LoginStep::click(YAYOI_ENTRY_SELECTOR),
        LoginStep::fill(ID_INPUT_SELECTOR, email),
        LoginStep::click(NEXT_BUTTON_SELECTOR),
        LoginStep::fill(PASSWORD_INPUT_SELECTOR, password),
        LoginStep::click(LOGIN_BUTTON_SELECTOR),
    ])
}

/// Picks the code source configured by `MISOCA_LOGIN_MODE`.
pub fn code_source(
    settings: &MisocaSettings,
    handshake: &HandshakeSettings,
) -> Result<Box<dyn AuthorizationCodeSource>, FetchError> {
    debug!(mode = ?settings.login_mode, "Selecting Misoca login");
    match settings.login_mode {
        LoginMode::Handshake => Ok(Box::new(Handshake::from_settings(handshake))),
        LoginMode::Browser => {
            let (Some(email), Some(password)) = (&settings.email, &settings.password) else {
                return Err(FetchError::Configuration(
                    "MISOCA_EMAIL and MISOCA_PASSWORD are required for browser login".to_string(),
                ));
            };
            let login = BrowserLogin::new(ChromiumLauncher::new(), login_script(email, password))
                .with_wait_timeout(settings.browser_wait_timeout);
            Ok(Box::new(login))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::misoca::testing::settings;

    fn handshake() -> HandshakeSettings {
        HandshakeSettings {
            signal_path: PathBuf::from("/tmp/auth_code.txt"),
            poll_interval: Duration::from_secs(1),
            timeout: None,
        }
    }

    #[test]
    fn test_script_order() {
        let script = login_script("me@example.com", "pw");
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.steps[0], LoginStep::click(YAYOI_ENTRY_SELECTOR));
        assert_eq!(
            script.steps[1],
            LoginStep::fill(ID_INPUT_SELECTOR, "me@example.com")
        );
        assert_eq!(script.steps[4], LoginStep::click(LOGIN_BUTTON_SELECTOR));
        assert_eq!(script.redirect_marker, "code=");
    }

    #[test]
    fn test_default_mode_is_handshake() {
        let source = code_source(&settings("https://app.misoca.jp"), &handshake()).unwrap();
        assert_eq!(source.id(), "handshake");
    }

    #[test]
    fn test_browser_mode() {
        let mut misoca = settings("https://app.misoca.jp");
        misoca.login_mode = LoginMode::Browser;
        assert!(matches!(
            code_source(&misoca, &handshake()),
            Err(FetchError::Configuration(_))
        ));

        misoca.email = Some("me@example.com".into());
        misoca.password = Some("pw".into());
        let source = code_source(&misoca, &handshake()).unwrap();
        assert_eq!(source.id(), "browser");
    }
}
