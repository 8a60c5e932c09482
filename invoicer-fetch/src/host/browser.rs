//! Headless browser sessions.
//!
//! The login driver only needs a handful of page interactions, so it talks
//! to a [`BrowserSession`] rather than to chromiumoxide directly. The
//! `try_*` methods report a missing element as `Ok(false)` so the caller can
//! keep waiting; any other failure is an error.

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;

// ============================================================================
// Session Traits
// ============================================================================

/// One exclusively owned browser session.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url`.
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Clicks the first element matching `selector`, if present.
    async fn try_click(&mut self, selector: &str) -> Result<bool, FetchError>;

    /// Focuses the first element matching `selector` and types `text`, if present.
    async fn try_fill(&mut self, selector: &str, text: &str) -> Result<bool, FetchError>;

    /// The page's current URL.
    async fn current_url(&mut self) -> Result<Option<String>, FetchError>;

    /// Shuts the browser down.
    async fn close(&mut self) -> Result<(), FetchError>;
}

/// Starts fresh browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launches a new session.
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, FetchError>;
}

// ============================================================================
// Chromium
// ============================================================================

/// Launches headless Chromium through the DevTools protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Creates a headless launcher.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    #[instrument(skip(self))]
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, FetchError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| FetchError::LoginFailed(format!("invalid browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::LoginFailed(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser");
                }
                handler_task.abort();
                return Err(FetchError::LoginFailed(format!("failed to open page: {e}")));
            }
        };

        debug!("Browser launched");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

/// A running Chromium instance with one page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

fn cdp(action: &str, err: impl std::fmt::Display) -> FetchError {
    FetchError::LoginFailed(format!("{action}: {err}"))
}

/// Whether a lookup failed only because nothing matched the selector yet.
fn is_missing_element(err: &CdpError) -> bool {
    match err {
        CdpError::NotFound => true,
        CdpError::Chrome(e) => {
            e.message.contains("Could not find node") || e.message.contains("No node")
        }
        _ => false,
    }
}

impl ChromiumSession {
    async fn find(&self, selector: &str) -> Result<Option<Element>, FetchError> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_missing_element(&e) => Ok(None),
            Err(e) => Err(cdp(&format!("looking up '{selector}' failed"), e)),
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        debug!(url, "Navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| cdp("navigation failed", e))?;
        Ok(())
    }

    async fn try_click(&mut self, selector: &str) -> Result<bool, FetchError> {
        let Some(element) = self.find(selector).await? else {
            return Ok(false);
        };
        element
            .click()
            .await
            .map_err(|e| cdp(&format!("click on '{selector}' failed"), e))?;
        Ok(true)
    }

    async fn try_fill(&mut self, selector: &str, text: &str) -> Result<bool, FetchError> {
        let Some(element) = self.find(selector).await? else {
            return Ok(false);
        };
        element
            .click()
            .await
            .map_err(|e| cdp(&format!("focus on '{selector}' failed"), e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| cdp(&format!("typing into '{selector}' failed"), e))?;
        Ok(true)
    }

    async fn current_url(&mut self) -> Result<Option<String>, FetchError> {
        self.page.url().await.map_err(|e| cdp("reading URL failed", e))
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed.map_err(|e| cdp("closing browser failed", e))?;
        debug!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_nodes_mean_keep_waiting() {
        assert!(is_missing_element(&CdpError::NotFound));
        assert!(!is_missing_element(&CdpError::NoResponse));
        assert!(!is_missing_element(&CdpError::Timeout));
    }
}
