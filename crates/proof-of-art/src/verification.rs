//! The verification service.
//!
//! Answers whether a content hash is registered, how often it has been
//! verified, and whether the local record store agrees. Read-only.

use std::collections::HashSet;
use std::sync::Arc;

use proof_of_art_core::{ArtworkRecord, ContentHash, Creator, CreatorAddress};
use proof_of_art_store::RecordStore;
use serde::Serialize;
use tracing::debug;

use crate::error::VerificationError;
use crate::registry::ProvenanceRegistry;

/// Combined registry and local-store state of a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Registered on the authoritative registry.
    Verified,
    /// Saved locally but not registered.
    Pending,
    /// Unknown to both.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub content_hash: ContentHash,
    pub status: VerificationStatus,
    pub exists: bool,
    /// Zero unless `exists`.
    pub verification_count: u64,
    pub local_record: Option<ArtworkRecord>,
}

/// One artwork attributed to an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedArtwork {
    pub content_hash: ContentHash,
    pub on_chain: bool,
    pub local_record: Option<ArtworkRecord>,
}

pub struct VerificationService {
    registry: Arc<dyn ProvenanceRegistry>,
    records: RecordStore,
}

impl VerificationService {
    pub fn new(registry: Arc<dyn ProvenanceRegistry>, records: RecordStore) -> Self {
        Self { registry, records }
    }

    /// Verify a hash given as text. Malformed hashes are rejected before the
    /// registry is contacted.
    pub async fn verify(&self, hash: &str) -> Result<VerificationReport, VerificationError> {
        let hash = ContentHash::parse(hash)?;
        self.verify_hash(&hash).await
    }

    /// Re-derive the hash of `bytes` and verify it.
    pub async fn verify_bytes(&self, bytes: &[u8]) -> Result<VerificationReport, VerificationError> {
        self.verify_hash(&ContentHash::compute(bytes)).await
    }

    pub async fn verify_hash(&self, hash: &ContentHash) -> Result<VerificationReport, VerificationError> {
        let exists = self.registry.exists(hash).await?;
        let verification_count = if exists {
            self.registry.verification_count(hash).await?
        } else {
            0
        };
        let local_record = self.records.find_by_content_hash(hash).await?;

        let status = match (exists, &local_record) {
            (true, _) => VerificationStatus::Verified,
            (false, Some(_)) => VerificationStatus::Pending,
            (false, None) => VerificationStatus::NotFound,
        };
        debug!(content_hash = %hash, ?status, verification_count, "hash verified");

        Ok(VerificationReport {
            content_hash: *hash,
            status,
            exists,
            verification_count,
            local_record,
        })
    }

    /// Whether `owner` owns `hash` on the registry.
    pub async fn verify_ownership(&self, hash: &str, owner: &str) -> Result<bool, VerificationError> {
        let hash = ContentHash::parse(hash)?;
        let owner = CreatorAddress::parse(owner)?;
        Ok(self.registry.verify_ownership(&hash, &owner).await?)
    }

    /// Registered artworks of `owner`, followed by local-only records
    /// attributed to them.
    pub async fn owner_artworks(&self, owner: &str) -> Result<Vec<OwnedArtwork>, VerificationError> {
        let owner = CreatorAddress::parse(owner)?;
        let on_chain = self.registry.owner_artworks(&owner).await?;
        let local = self.records.find_by_creator(&Creator::Wallet(owner)).await?;

        let registered: HashSet<ContentHash> = on_chain.iter().copied().collect();
        let mut artworks: Vec<OwnedArtwork> = on_chain
            .into_iter()
            .map(|hash| OwnedArtwork {
                content_hash: hash,
                on_chain: true,
                local_record: local.iter().find(|r| r.content_hash == hash).cloned(),
            })
            .collect();
        artworks.extend(
            local
                .into_iter()
                .filter(|r| !registered.contains(&r.content_hash))
                .map(|r| OwnedArtwork {
                    content_hash: r.content_hash,
                    on_chain: false,
                    local_record: Some(r),
                }),
        );
        Ok(artworks)
    }
}
