//! Manual authorization-code handshake over a signal file.
//!
//! The operator opens the printed authorization URL, approves access and
//! pastes the resulting code into the signal file:
//!
//! 1. create the file empty, mode `0777` so another user/container can write it
//! 2. poll until its trimmed content is non-empty (a bare code, or the whole
//!    redirect URL copied from the browser's address bar)
//! 3. delete the file and hand the code to exactly one exchange
//!
//! The wait is bounded only when a timeout is configured.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use invoicer_core::{AuthorizationCode, AuthorizationRequest};
use invoicer_store::{HandshakeSettings, ensure_dir, set_mode};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::provider::AuthorizationCodeSource;

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest accepted poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Signal file permissions.
const SIGNAL_FILE_MODE: u32 = 0o777;

// ============================================================================
// Handshake
// ============================================================================

/// Signal-file authorization code source.
#[derive(Debug, Clone)]
pub struct Handshake {
    signal_path: PathBuf,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Handshake {
    /// Creates a handshake on `signal_path` that waits indefinitely.
    pub fn new(signal_path: impl Into<PathBuf>) -> Self {
        Self {
            signal_path: signal_path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    /// Creates a handshake from settings.
    pub fn from_settings(settings: &HandshakeSettings) -> Self {
        Self::new(settings.signal_path.clone())
            .with_poll_interval(settings.poll_interval)
            .with_timeout(settings.timeout)
    }

    /// Sets the poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Sets (or clears) the overall deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The signal file path.
    pub fn signal_path(&self) -> &Path {
        &self.signal_path
    }

    /// Creates the signal file, waits for a code, then removes the file.
    #[instrument(skip(self), fields(path = %self.signal_path.display()))]
    pub async fn wait_for_code(&self) -> Result<AuthorizationCode, FetchError> {
        self.prepare().await?;
        println!(
            "Please save the authorization code in {}",
            self.signal_path.display()
        );
        info!("Waiting for authorization code");

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.poll()).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::AuthenticationTimeout {
                    waiting_for: format!("authorization code in {}", self.signal_path.display()),
                    after: limit,
                }),
            },
            None => self.poll().await,
        };

        self.remove().await;
        if result.is_ok() {
            info!("Authorization code received");
        }
        result
    }

    async fn prepare(&self) -> Result<(), FetchError> {
        if let Some(parent) = self.signal_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent).await?;
            }
        }
        // Truncates any code left over from an earlier run.
        tokio::fs::File::create(&self.signal_path).await?;
        set_mode(&self.signal_path, SIGNAL_FILE_MODE).await?;
        debug!("Signal file created");
        Ok(())
    }

    async fn poll(&self) -> Result<AuthorizationCode, FetchError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let content = tokio::fs::read_to_string(&self.signal_path).await?;
            let code = AuthorizationCode::from_redirect_url(content.trim())
                .or_else(|| AuthorizationCode::parse(&content));
            if let Some(code) = code {
                return Ok(code);
            }
        }
    }

    async fn remove(&self) {
        match tokio::fs::remove_file(&self.signal_path).await {
            Ok(()) => debug!("Signal file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "Failed to remove signal file"),
        }
    }
}

#[async_trait]
impl AuthorizationCodeSource for Handshake {
    fn id(&self) -> &str {
        "handshake"
    }

    async fn acquire(&self, request: &AuthorizationRequest) -> Result<AuthorizationCode, FetchError> {
        let url = request.url()?;
        println!("Please go to this URL and authorize the application: {url}");
        info!(%url, "Authorization URL issued");
        self.wait_for_code().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Writes `code` once the handshake has created the signal file.
    fn operator(path: PathBuf, code: &'static str) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tokio::time::sleep(Duration::from_millis(30)).await;
            tokio::fs::write(&path, code).await.unwrap();
        })
    }

    #[tokio::test]
    async fn test_code_read_and_signal_file_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        let handshake = Handshake::new(&path).with_poll_interval(Duration::from_millis(10));

        let writer = operator(path.clone(), "abc123\n");
        let code = handshake.wait_for_code().await.unwrap();
        writer.await.unwrap();

        assert_eq!(code.as_str(), "abc123");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_pasted_redirect_url_yields_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        let handshake = Handshake::new(&path).with_poll_interval(Duration::from_millis(10));

        let writer = operator(path.clone(), "http://localhost:8080/?state=x&code=4%2F0Ab&scope=s\n");
        let code = handshake.wait_for_code().await.unwrap();
        writer.await.unwrap();

        assert_eq!(code.as_str(), "4/0Ab");
    }

    #[tokio::test]
    async fn test_stale_content_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        std::fs::write(&path, "old-code").unwrap();

        let handshake = Handshake::new(&path)
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Some(Duration::from_millis(60)));
        let err = handshake.wait_for_code().await.unwrap_err();
        assert!(matches!(err, FetchError::AuthenticationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_removes_signal_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        let handshake = Handshake::new(&path)
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Some(Duration::from_millis(50)));

        let err = handshake.wait_for_code().await.unwrap_err();
        match err {
            FetchError::AuthenticationTimeout { after, .. } => {
                assert_eq!(after, Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_whitespace_only_is_not_a_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        let handshake = Handshake::new(&path).with_poll_interval(Duration::from_millis(10));

        let p = path.clone();
        let writer = tokio::spawn(async move {
            while !tokio::fs::try_exists(&p).await.unwrap_or(false) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tokio::fs::write(&p, "  \n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(40)).await;
            tokio::fs::write(&p, "real-code").await.unwrap();
        });

        let code = handshake.wait_for_code().await.unwrap();
        writer.await.unwrap();
        assert_eq!(code.as_str(), "real-code");
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_times_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth_code.txt");
        let handshake = Handshake::new(&path)
            .with_poll_interval(Duration::ZERO)
            .with_timeout(Some(Duration::from_millis(30)));

        assert_eq!(handshake.poll_interval, MIN_POLL_INTERVAL);
        let err = handshake.wait_for_code().await.unwrap_err();
        assert!(matches!(err, FetchError::AuthenticationTimeout { .. }));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_file_is_world_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("auth_code.txt");
        let handshake = Handshake::new(&path);
        handshake.prepare().await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_from_settings() {
        let settings = HandshakeSettings {
            signal_path: PathBuf::from("/tmp/code.txt"),
            poll_interval: Duration::from_millis(250),
            timeout: Some(Duration::from_secs(600)),
        };
        let handshake = Handshake::from_settings(&settings);
        assert_eq!(handshake.signal_path(), Path::new("/tmp/code.txt"));
        assert_eq!(handshake.poll_interval, Duration::from_millis(250));
        assert_eq!(handshake.timeout, Some(Duration::from_secs(600)));
    }
}
