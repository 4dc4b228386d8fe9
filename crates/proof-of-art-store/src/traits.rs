//! ArtworkStore trait: the abstract interface for record persistence.
//!
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use proof_of_art_core::{ArtworkRecord, ContentHash, Creator, NewArtwork};

use crate::error::Result;

/// Async interface for artwork record persistence.
///
/// # Design Notes
///
/// - **Unique key**: `content_hash`. Re-saving updates the mutable fields
///   (prompt hash, metadata URI, certificate token id) instead of duplicating.
/// - **Token retention**: an absent incoming `certificate_token_id` never
///   clears a stored one.
/// - **Atomic upsert**: concurrent upserts for one hash leave exactly one
///   complete write.
/// - **Ordering**: list operations return newest first by `created_at`.
/// - **Availability**: a backend that cannot be reached returns
///   [`StoreError::Unavailable`](crate::StoreError::Unavailable).
#[async_trait]
pub trait ArtworkStore: Send + Sync {
    /// Insert or update the record keyed by `artwork.content_hash`.
    async fn upsert(&self, artwork: &NewArtwork) -> Result<ArtworkRecord>;

    /// Look up a record by content hash.
    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ArtworkRecord>>;

    /// All records owned by `creator`, newest first.
    async fn find_by_creator(&self, creator: &Creator) -> Result<Vec<ArtworkRecord>>;

    /// All records, optionally filtered by creator, newest first.
    async fn list_all(&self, creator: Option<&Creator>) -> Result<Vec<ArtworkRecord>>;

    /// Link an on-chain certificate. Returns `false` when no record matched.
    ///
    /// Idempotent: repeating the call only bumps `updated_at`.
    async fn update_certificate_token_id(&self, hash: &ContentHash, token_id: u64) -> Result<bool>;
}
