//! The authoritative provenance registry.
//!
//! All registry calls take typed hashes, so only full-length 32-byte values
//! cross this boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use proof_of_art_core::{ContentHash, CreatorAddress, PromptHash};

use crate::error::RegistryError;

/// Arguments to a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub content_hash: ContentHash,
    pub prompt_hash: PromptHash,
    pub ipfs_cid: String,
    pub model_used: String,
    pub metadata_uri: String,
    /// Claimed owner. Chain-backed registries record the signing account.
    pub creator: CreatorAddress,
}

/// The registry collaborator.
#[async_trait]
pub trait ProvenanceRegistry: Send + Sync {
    async fn exists(&self, hash: &ContentHash) -> Result<bool, RegistryError>;

    async fn verification_count(&self, hash: &ContentHash) -> Result<u64, RegistryError>;

    async fn owner_artworks(&self, owner: &CreatorAddress) -> Result<Vec<ContentHash>, RegistryError>;

    async fn verify_ownership(
        &self,
        hash: &ContentHash,
        owner: &CreatorAddress,
    ) -> Result<bool, RegistryError>;

    /// Register an artwork, returning its certificate token id.
    async fn register(&self, registration: &Registration) -> Result<u64, RegistryError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory registry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Entry {
    owner: CreatorAddress,
    verifications: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<ContentHash, Entry>,
    order: Vec<ContentHash>,
    next_token: u64,
}

/// In-process registry for tests and local runs.
///
/// Token ids start at 1 and increase per registration.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: RwLock<Inner>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verification event for a registered hash.
    pub fn record_verification(&self, hash: &ContentHash) -> Result<u64, RegistryError> {
        let mut inner = self.write()?;
        let entry = inner
            .entries
            .get_mut(hash)
            .ok_or_else(|| RegistryError::Rpc(format!("{hash} is not registered")))?;
        entry.verifications += 1;
        Ok(entry.verifications)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, RegistryError> {
        self.inner
            .read()
            .map_err(|_| RegistryError::Rpc("registry lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, RegistryError> {
        self.inner
            .write()
            .map_err(|_| RegistryError::Rpc("registry lock poisoned".into()))
    }
}

#[async_trait]
impl ProvenanceRegistry for MemoryRegistry {
    async fn exists(&self, hash: &ContentHash) -> Result<bool, RegistryError> {
        Ok(self.read()?.entries.contains_key(hash))
    }

    async fn verification_count(&self, hash: &ContentHash) -> Result<u64, RegistryError> {
        Ok(self
            .read()?
            .entries
            .get(hash)
            .map(|e| e.verifications)
            .unwrap_or(0))
    }

    async fn owner_artworks(&self, owner: &CreatorAddress) -> Result<Vec<ContentHash>, RegistryError> {
        let inner = self.read()?;
        Ok(inner
            .order
            .iter()
            .filter(|h| inner.entries.get(*h).is_some_and(|e| &e.owner == owner))
            .copied()
            .collect())
    }

    async fn verify_ownership(
        &self,
        hash: &ContentHash,
        owner: &CreatorAddress,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .read()?
            .entries
            .get(hash)
            .is_some_and(|e| &e.owner == owner))
    }

    async fn register(&self, registration: &Registration) -> Result<u64, RegistryError> {
        let mut inner = self.write()?;
        if inner.entries.contains_key(&registration.content_hash) {
            return Err(RegistryError::AlreadyRegistered(registration.content_hash));
        }
        inner.next_token += 1;
        let token = inner.next_token;
        inner.entries.insert(
            registration.content_hash,
            Entry {
                owner: registration.creator.clone(),
                verifications: 0,
            },
        );
        inner.order.push(registration.content_hash);
        Ok(token)
    }
}
