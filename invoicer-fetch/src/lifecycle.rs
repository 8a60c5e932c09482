//! Token lifecycle manager.
//!
//! [`TokenLifecycle`] is the single owner of expiry checks, refreshes and
//! first-time authorization for one provider. The credential store is read
//! on every call and rewritten after every successful exchange or refresh,
//! before the new record is handed back. A failed remote call leaves the
//! stored record untouched.
//!
//! ```text
//! ensure_valid_token
//!   ├─ no record      → code source → exchange_code → save
//!   ├─ expired record → refresh → save
//!   └─ valid record   → returned as is
//! ```

use invoicer_core::{Clock, SystemClock, TokenRecord};
use invoicer_store::CredentialStore;
use tracing::{debug, error, info, instrument};

use crate::error::FetchError;
use crate::provider::{AuthorizationCodeSource, CredentialProvider, require_refresh_token};

// ============================================================================
// Token Lifecycle
// ============================================================================

/// Keeps one provider's persisted token usable.
pub struct TokenLifecycle<P, C = SystemClock> {
    provider: P,
    store: CredentialStore,
    code_source: Box<dyn AuthorizationCodeSource>,
    clock: C,
}

impl<P: CredentialProvider> TokenLifecycle<P> {
    /// Creates a lifecycle using the system clock.
    pub fn new(
        provider: P,
        store: CredentialStore,
        code_source: impl AuthorizationCodeSource + 'static,
    ) -> Self {
        Self::with_boxed_source(provider, store, Box::new(code_source))
    }

    /// Creates a lifecycle from an already boxed code source.
    pub fn with_boxed_source(
        provider: P,
        store: CredentialStore,
        code_source: Box<dyn AuthorizationCodeSource>,
    ) -> Self {
        Self {
            provider,
            store,
            code_source,
            clock: SystemClock,
        }
    }
}

impl<P: CredentialProvider, C: Clock> TokenLifecycle<P, C> {
    /// Replaces the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TokenLifecycle<P, C2> {
        TokenLifecycle {
            provider: self.provider,
            store: self.store,
            code_source: self.code_source,
            clock,
        }
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The clock expiry is judged against.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Loads the stored record, if any.
    pub async fn load(&self) -> Result<Option<TokenRecord>, FetchError> {
        self.store.load().await.map_err(FetchError::from)
    }

    /// Whether the stored token has expired.
    ///
    /// A missing record, or one without `created_at`/`expires_in`, is an
    /// [`FetchError::InvalidCredentials`] error rather than a verdict.
    #[instrument(skip(self), fields(provider = %self.provider.kind()))]
    pub async fn is_expired(&self) -> Result<bool, FetchError> {
        let record = self.load().await.inspect_err(log_invalid)?;
        let Some(record) = record else {
            let err = FetchError::InvalidCredentials(format!(
                "no stored token at {}",
                self.store.path().display()
            ));
            log_invalid(&err);
            return Err(err);
        };
        self.check_expired(&record)
    }

    /// Returns a usable token, authorizing or refreshing first when needed.
    ///
    /// May block on the code source for as long as it takes an operator to
    /// respond.
    #[instrument(skip(self), fields(provider = %self.provider.kind()))]
    pub async fn ensure_valid_token(&self) -> Result<TokenRecord, FetchError> {
        match self.load().await.inspect_err(log_invalid)? {
            None => {
                info!("No stored token, starting authorization");
                self.authorize().await
            }
            Some(record) => {
                if self.check_expired(&record)? {
                    info!("Stored token expired, refreshing");
                    self.refresh_record(&record).await
                } else {
                    debug!("Stored token still valid");
                    Ok(record)
                }
            }
        }
    }

    /// `Authorization` header value, re-checking expiry on every call.
    pub async fn authorization_header(&self) -> Result<String, FetchError> {
        Ok(self.ensure_valid_token().await?.bearer())
    }

    /// Runs a fresh authorization regardless of what is stored.
    #[instrument(skip(self), fields(provider = %self.provider.kind()))]
    pub async fn authenticate(&self) -> Result<TokenRecord, FetchError> {
        self.authorize().await
    }

    /// Refreshes the stored token regardless of its expiry.
    #[instrument(skip(self), fields(provider = %self.provider.kind()))]
    pub async fn refresh(&self) -> Result<TokenRecord, FetchError> {
        let record = self.load().await?.ok_or_else(|| {
            FetchError::InvalidCredentials(format!(
                "no stored token at {}",
                self.store.path().display()
            ))
        })?;
        self.refresh_record(&record).await
    }

    fn check_expired(&self, record: &TokenRecord) -> Result<bool, FetchError> {
        let now = self.clock.unix_now();
        record
            .is_expired_at(now)
            .map_err(FetchError::from)
            .inspect_err(log_invalid)
    }

    async fn authorize(&self) -> Result<TokenRecord, FetchError> {
        let request = self.provider.authorization_request();
        debug!(source = self.code_source.id(), "Acquiring authorization code");
        let code = self.code_source.acquire(&request).await?;
        let record = self.provider.exchange_code(&code).await?;
        self.persist(record).await
    }

    async fn refresh_record(&self, current: &TokenRecord) -> Result<TokenRecord, FetchError> {
        require_refresh_token(current)?;
        let record = self
            .provider
            .refresh(current)
            .await?
            .inherit_refresh_token(current);
        self.persist(record).await
    }

    async fn persist(&self, record: TokenRecord) -> Result<TokenRecord, FetchError> {
        let record = record.stamped(self.clock.unix_now());
        self.store.save(&record).await?;
        info!(path = %self.store.path().display(), "Token saved");
        Ok(record)
    }
}

fn log_invalid(err: &FetchError) {
    if matches!(err, FetchError::InvalidCredentials(_)) {
        error!(error = %err, "Stored token is unusable");
    }
}
