//! In-memory implementation of the ArtworkStore trait.
//!
//! Same semantics as SQLite with no persistence. Tests can switch it offline
//! to exercise degraded mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use proof_of_art_core::{ArtworkRecord, ContentHash, Creator, NewArtwork};

use crate::error::{Result, StoreError};
use crate::now_millis;
use crate::traits::ArtworkStore;

/// In-memory artwork store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryArtworkStore {
    inner: RwLock<MemoryStoreInner>,
    online: AtomicBool,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by content hash.
    records: HashMap<ContentHash, ArtworkRecord>,
    /// Last assigned row id.
    next_id: i64,
}

impl MemoryArtworkStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing or regaining the backing store.
    pub fn set_available(&self, available: bool) {
        self.online.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".into()))
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.check_available()?;
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.check_available()?;
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryArtworkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first, ties broken by id like the SQLite backend.
fn sort_newest_first(records: &mut [ArtworkRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl ArtworkStore for MemoryArtworkStore {
    async fn upsert(&self, artwork: &NewArtwork) -> Result<ArtworkRecord> {
        let mut inner = self.write()?;
        let now = now_millis();

        if let Some(existing) = inner.records.get_mut(&artwork.content_hash) {
            existing.prompt_hash = artwork.prompt_hash;
            existing.metadata_uri = artwork.metadata_uri.clone();
            if artwork.certificate_token_id.is_some() {
                existing.certificate_token_id = artwork.certificate_token_id;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let mut record = artwork.echo(now);
        record.id = inner.next_id;
        inner.records.insert(artwork.content_hash, record.clone());
        Ok(record)
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ArtworkRecord>> {
        Ok(self.read()?.records.get(hash).cloned())
    }

    async fn find_by_creator(&self, creator: &Creator) -> Result<Vec<ArtworkRecord>> {
        self.list_all(Some(creator)).await
    }

    async fn list_all(&self, creator: Option<&Creator>) -> Result<Vec<ArtworkRecord>> {
        let inner = self.read()?;
        let mut records: Vec<ArtworkRecord> = inner
            .records
            .values()
            .filter(|r| creator.map_or(true, |c| &r.creator_address == c))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn update_certificate_token_id(&self, hash: &ContentHash, token_id: u64) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.records.get_mut(hash) {
            Some(record) => {
                record.certificate_token_id = Some(token_id);
                record.updated_at = now_millis();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
