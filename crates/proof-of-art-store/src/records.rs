//! The record store facade with degraded mode.
//!
//! [`RecordStore`] wraps an optional [`ArtworkStore`] backend. When the backend
//! is unconfigured or reports [`StoreError::Unavailable`], reads return empty
//! results and writes become no-ops that echo their input. Any other error is
//! a genuine fault and propagates.

use std::path::Path;
use std::sync::Arc;

use proof_of_art_core::{ArtworkRecord, ContentHash, Creator, NewArtwork};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::now_millis;
use crate::sqlite::SqliteArtworkStore;
use crate::traits::ArtworkStore;

/// Result of [`RecordStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The record was written.
    Stored(ArtworkRecord),
    /// The store was unavailable. Holds an unsaved echo of the input.
    Skipped(ArtworkRecord),
}

impl UpsertOutcome {
    /// The stored record or the echo.
    pub fn record(&self) -> &ArtworkRecord {
        match self {
            UpsertOutcome::Stored(r) | UpsertOutcome::Skipped(r) => r,
        }
    }

    pub fn into_record(self) -> ArtworkRecord {
        match self {
            UpsertOutcome::Stored(r) | UpsertOutcome::Skipped(r) => r,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, UpsertOutcome::Stored(_))
    }
}

/// Result of [`RecordStore::update_certificate_token_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLink {
    /// The token id is now set on the record.
    Linked,
    /// No record exists for the hash.
    NoRecord,
    /// The store was unavailable; nothing changed.
    Skipped,
}

/// Degraded-mode aware access to artwork records.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone, Default)]
pub struct RecordStore {
    backend: Option<Arc<dyn ArtworkStore>>,
}

impl RecordStore {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn ArtworkStore>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store with no backend. Every read is empty and every write is skipped.
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    /// Open SQLite at `path`, or run unconfigured when `path` is `None` or the
    /// database cannot be reached. Schema errors still fail.
    pub fn open_sqlite(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            warn!("no database path configured, artwork records will not be persisted");
            return Ok(Self::unconfigured());
        };

        match SqliteArtworkStore::open(path) {
            Ok(store) => {
                debug!(path = %path.display(), "artwork store opened");
                Ok(Self::new(Arc::new(store)))
            }
            Err(e) if e.is_unavailable() => {
                warn!(path = %path.display(), error = %e, "artwork store unreachable, running degraded");
                Ok(Self::unconfigured())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a backend is attached.
    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn upsert(&self, artwork: &NewArtwork) -> Result<UpsertOutcome> {
        let skipped = || UpsertOutcome::Skipped(artwork.echo(now_millis()));
        let Some(backend) = &self.backend else {
            debug!(content_hash = %artwork.content_hash, "store unconfigured, upsert skipped");
            return Ok(skipped());
        };

        match backend.upsert(artwork).await {
            Ok(record) => Ok(UpsertOutcome::Stored(record)),
            Err(e) if e.is_unavailable() => {
                warn!(content_hash = %artwork.content_hash, error = %e, "store unavailable, upsert skipped");
                Ok(skipped())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ArtworkRecord>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };
        degrade(backend.find_by_content_hash(hash).await, "find_by_content_hash")
    }

    pub async fn find_by_creator(&self, creator: &Creator) -> Result<Vec<ArtworkRecord>> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };
        degrade(backend.find_by_creator(creator).await, "find_by_creator")
    }

    pub async fn list_all(&self, creator: Option<&Creator>) -> Result<Vec<ArtworkRecord>> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };
        degrade(backend.list_all(creator).await, "list_all")
    }

    pub async fn update_certificate_token_id(
        &self,
        hash: &ContentHash,
        token_id: u64,
    ) -> Result<TokenLink> {
        let Some(backend) = &self.backend else {
            return Ok(TokenLink::Skipped);
        };
        match backend.update_certificate_token_id(hash, token_id).await {
            Ok(true) => Ok(TokenLink::Linked),
            Ok(false) => Ok(TokenLink::NoRecord),
            Err(e) if e.is_unavailable() => {
                warn!(content_hash = %hash, error = %e, "store unavailable, token link skipped");
                Ok(TokenLink::Skipped)
            }
            Err(e) => Err(e),
        }
    }
}

/// Turn an unavailable-store read into its empty value.
fn degrade<T: Default>(result: Result<T>, op: &'static str) -> Result<T> {
    match result {
        Err(StoreError::Unavailable(reason)) => {
            warn!(op, %reason, "store unavailable, returning empty result");
            Ok(T::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryArtworkStore;
    use async_trait::async_trait;
    use proof_of_art_core::{content_hash, prompt_hash, CreatorAddress};

    fn creator() -> Creator {
        Creator::Wallet(CreatorAddress::parse("0x2222222222222222222222222222222222222222").unwrap())
    }

    fn artwork() -> NewArtwork {
        NewArtwork {
            content_hash: content_hash(b"bytes"),
            prompt_hash: prompt_hash("p"),
            creator: creator(),
            ipfs_cid: "QmX".into(),
            model_used: "dall-e-3".into(),
            metadata_uri: None,
            certificate_token_id: None,
        }
    }

    /// A backend whose every call fails with a genuine fault.
    struct BrokenStore;

    #[async_trait]
    impl ArtworkStore for BrokenStore {
        async fn upsert(&self, _: &NewArtwork) -> Result<ArtworkRecord> {
            Err(StoreError::InvalidData("constraint".into()))
        }
        async fn find_by_content_hash(&self, _: &ContentHash) -> Result<Option<ArtworkRecord>> {
            Err(StoreError::InvalidData("bad row".into()))
        }
        async fn find_by_creator(&self, _: &Creator) -> Result<Vec<ArtworkRecord>> {
            Err(StoreError::InvalidData("bad row".into()))
        }
        async fn list_all(&self, _: Option<&Creator>) -> Result<Vec<ArtworkRecord>> {
            Err(StoreError::InvalidData("bad row".into()))
        }
        async fn update_certificate_token_id(&self, _: &ContentHash, _: u64) -> Result<bool> {
            Err(StoreError::InvalidData("bad row".into()))
        }
    }

    #[tokio::test]
    async fn test_unconfigured_reads_are_empty() {
        let store = RecordStore::unconfigured();
        assert!(!store.is_configured());
        assert!(store.find_by_creator(&creator()).await.unwrap().is_empty());
        assert!(store.list_all(None).await.unwrap().is_empty());
        assert!(store
            .find_by_content_hash(&content_hash(b"bytes"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_upsert_echoes() {
        let store = RecordStore::unconfigured();
        let new = artwork();
        let outcome = store.upsert(&new).await.unwrap();
        assert!(!outcome.is_persisted());
        assert!(outcome.record().matches(&new));
        assert_eq!(
            store.update_certificate_token_id(&new.content_hash, 1).await.unwrap(),
            TokenLink::Skipped
        );
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades() {
        let backend = Arc::new(MemoryArtworkStore::new());
        let store = RecordStore::new(backend.clone());
        backend.set_available(false);

        assert!(store.find_by_creator(&creator()).await.unwrap().is_empty());
        let outcome = store.upsert(&artwork()).await.unwrap();
        assert!(matches!(outcome, UpsertOutcome::Skipped(_)));

        backend.set_available(true);
        let outcome = store.upsert(&artwork()).await.unwrap();
        assert!(outcome.is_persisted());
        assert_eq!(
            store.update_certificate_token_id(&artwork().content_hash, 9).await.unwrap(),
            TokenLink::Linked
        );
        assert_eq!(
            store.update_certificate_token_id(&content_hash(b"other"), 9).await.unwrap(),
            TokenLink::NoRecord
        );
    }

    #[tokio::test]
    async fn test_genuine_errors_propagate() {
        let store = RecordStore::new(Arc::new(BrokenStore));
        assert!(store.upsert(&artwork()).await.is_err());
        assert!(store.list_all(None).await.is_err());
        assert!(store.find_by_creator(&creator()).await.is_err());
        assert!(store
            .update_certificate_token_id(&content_hash(b"x"), 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_open_sqlite_without_path_is_unconfigured() {
        let store = RecordStore::open_sqlite(None).unwrap();
        assert!(!store.is_configured());
    }

    #[tokio::test]
    async fn test_open_sqlite_unreachable_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("db.sqlite");
        let store = RecordStore::open_sqlite(Some(&path)).unwrap();
        assert!(!store.is_configured());
    }

    #[tokio::test]
    async fn test_open_sqlite_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite");
        let store = RecordStore::open_sqlite(Some(&path)).unwrap();
        assert!(store.is_configured());
        assert!(store.upsert(&artwork()).await.unwrap().is_persisted());
        assert_eq!(store.list_all(None).await.unwrap().len(), 1);
    }
}
