//! File-backed credential store.
//!
//! Each provider owns exactly one token record at
//! `<credentials_dir>/credentials.<provider>.json`. The file is read before
//! every token use and rewritten after every exchange or refresh; nothing is
//! cached in memory between calls.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use invoicer_core::{ProviderKind, TokenRecord};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::persistence::{load_json, save_json};

/// Reads and writes one provider's [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the store for `kind` inside `dir`.
    pub fn for_provider(dir: &Path, kind: ProviderKind) -> Self {
        Self::new(dir.join(kind.credentials_file_name()))
    }

    /// Location of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record. `Ok(None)` when nothing has been stored yet.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Option<TokenRecord>, StoreError> {
        match load_json::<TokenRecord>(&self.path).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored token");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrites the record.
    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    pub async fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
        save_json(&self.path, record).await?;
        debug!("Token record saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::for_provider(dir.path(), ProviderKind::Misoca);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_is_identical() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::for_provider(dir.path(), ProviderKind::Gmail);

        let mut record = TokenRecord::new("A")
            .with_refresh_token("R")
            .with_expiry(1000, 3600);
        record
            .extra
            .insert("token_type".to_string(), serde_json::json!("Bearer"));

        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_save_overwrites_in_place() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::for_provider(dir.path(), ProviderKind::Misoca);

        store.save(&TokenRecord::new("first")).await.unwrap();
        store.save(&TokenRecord::new("second")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::for_provider(dir.path(), ProviderKind::Misoca);
        tokio::fs::write(store.path(), "{not json").await.unwrap();

        assert!(matches!(
            store.load().await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_path_per_provider() {
        let store = CredentialStore::for_provider(Path::new("/app/storage/credentials"), ProviderKind::Misoca);
        assert_eq!(
            store.path(),
            Path::new("/app/storage/credentials/credentials.misoca.json")
        );
    }
}
