//! Interactive login driver.
//!
//! Scripts a provider's HTML login form in a headless browser and yields the
//! authorization code from the final redirect. Each step waits up to
//! `wait_timeout` for its element; the redirect wait has the same bound.
//! The session is closed on every exit path.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use invoicer_core::{AuthorizationCode, AuthorizationRequest};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::host::browser::{BrowserLauncher, BrowserSession};
use crate::provider::AuthorizationCodeSource;

/// Default per-step wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a pending step is retried.
const STEP_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// Login Script
// ============================================================================

/// One page interaction.
#[derive(Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Click an element.
    Click(String),
    /// Type into an input.
    Fill {
        /// CSS selector of the input.
        selector: String,
        /// Text to type.
        value: String,
    },
}

impl LoginStep {
    /// Click step.
    pub fn click(selector: impl Into<String>) -> Self {
        Self::Click(selector.into())
    }

    /// Fill step.
    pub fn fill(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Fill {
            selector: selector.into(),
            value: value.into(),
        }
    }

    fn selector(&self) -> &str {
        match self {
            Self::Click(selector) | Self::Fill { selector, .. } => selector,
        }
    }
}

impl fmt::Debug for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click(selector) => f.debug_tuple("Click").field(selector).finish(),
            Self::Fill { selector, .. } => f
                .debug_struct("Fill")
                .field("selector", selector)
                .field("value", &"***")
                .finish(),
        }
    }
}

/// Steps to run after opening the authorization URL.
#[derive(Debug, Clone)]
pub struct LoginScript {
    /// Interactions, in order.
    pub steps: Vec<LoginStep>,
    /// Substring the redirect URL must contain once login succeeds.
    pub redirect_marker: String,
}

impl LoginScript {
    /// Creates a script that finishes on a `code=` redirect.
    pub fn new(steps: Vec<LoginStep>) -> Self {
        Self {
            steps,
            redirect_marker: "code=".to_string(),
        }
    }
}

// ============================================================================
// Browser Login
// ============================================================================

/// Authorization code source backed by a scripted browser login.
pub struct BrowserLogin {
    launcher: Box<dyn BrowserLauncher>,
    script: LoginScript,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl BrowserLogin {
    /// Creates a driver running `script` in sessions from `launcher`.
    pub fn new(launcher: impl BrowserLauncher + 'static, script: LoginScript) -> Self {
        Self {
            launcher: Box::new(launcher),
            script,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: STEP_POLL_INTERVAL,
        }
    }

    /// Sets the per-step wait.
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets how often a pending step is retried.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Logs in starting from `authorize_url` and returns the code.
    #[instrument(skip(self, authorize_url))]
    pub async fn login(&self, authorize_url: &str) -> Result<AuthorizationCode, FetchError> {
        let mut session = self.launcher.launch().await.map_err(into_login_failed)?;

        let result = self
            .drive(session.as_mut(), authorize_url)
            .await
            .map_err(into_login_failed);

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        match &result {
            Ok(_) => info!("Browser login completed"),
            Err(e) => debug!(error = %e, "Browser login failed"),
        }
        result
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        authorize_url: &str,
    ) -> Result<AuthorizationCode, FetchError> {
        session.navigate(authorize_url).await?;

        for step in &self.script.steps {
            debug!(?step, "Running login step");
            self.run_step(session, step).await?;
        }

        let url = self.wait_for_redirect(session).await?;
        AuthorizationCode::from_redirect_url(&url).ok_or_else(|| {
            FetchError::LoginFailed("redirect URL carries no authorization code".to_string())
        })
    }

    async fn run_step(
        &self,
        session: &mut dyn BrowserSession,
        step: &LoginStep,
    ) -> Result<(), FetchError> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            let done = match step {
                LoginStep::Click(selector) => session.try_click(selector).await?,
                LoginStep::Fill { selector, value } => session.try_fill(selector, value).await?,
            };
            if done {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::AuthenticationTimeout {
                    waiting_for: format!("element '{}'", step.selector()),
                    after: self.wait_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn wait_for_redirect(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<String, FetchError> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Some(url) = session.current_url().await? {
                if url.contains(&self.script.redirect_marker) {
                    return Ok(url);
                }
            }
            if Instant::now() >= deadline {
                return Err(FetchError::AuthenticationTimeout {
                    waiting_for: format!("redirect containing '{}'", self.script.redirect_marker),
                    after: self.wait_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl fmt::Debug for BrowserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserLogin")
            .field("script", &self.script)
            .field("wait_timeout", &self.wait_timeout)
            .finish_non_exhaustive()
    }
}

/// Every failure other than a timeout is reported as a failed login.
fn into_login_failed(err: FetchError) -> FetchError {
    match err {
        FetchError::AuthenticationTimeout { .. } | FetchError::LoginFailed(_) => err,
        other => FetchError::LoginFailed(other.to_string()),
    }
}

#[async_trait]
impl AuthorizationCodeSource for BrowserLogin {
    fn id(&self) -> &str {
        "browser"
    }

    async fn acquire(&self, request: &AuthorizationRequest) -> Result<AuthorizationCode, FetchError> {
        let url = request.url()?;
        self.login(url.as_str()).await
    }
}

// ============================================================================
// Tests
// ============================================================================
