//! # Proof of Art Store
//!
//! Storage abstraction for artwork records. Provides a trait-based interface
//! with SQLite and in-memory implementations, and a facade that keeps the
//! pipeline running when no database is reachable.
//!
//! ## Key Types
//!
//! - [`ArtworkStore`] - The async trait for all storage operations
//! - [`SqliteArtworkStore`] - SQLite-based persistent storage
//! - [`MemoryArtworkStore`] - In-memory storage for tests
//! - [`RecordStore`] - Degraded-mode facade used by the services
//! - [`UpsertOutcome`] - Whether an upsert was stored or skipped
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use proof_of_art_store::{RecordStore, SqliteArtworkStore};
//!
//! fn example() {
//!     let sqlite = SqliteArtworkStore::open("artworks.db").unwrap();
//!     let records = RecordStore::new(Arc::new(sqlite));
//!
//!     // Without a database, reads are empty and writes are echoed back.
//!     let degraded = RecordStore::unconfigured();
//!     # let _ = (records, degraded);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Upsert by content hash**: one row per artwork, mutable fields updated
//! - **Token retention**: a re-save without a token id keeps the stored one
//! - **Degraded mode**: unavailability is absorbed, genuine faults propagate

pub mod error;
pub mod memory;
pub mod migration;
pub mod records;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryArtworkStore;
pub use records::{RecordStore, TokenLink, UpsertOutcome};
pub use sqlite::SqliteArtworkStore;
pub use traits::ArtworkStore;

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proof_of_art_core::{
        content_hash, metadata_uri, prompt_hash, ArtworkRecord, Creator, CreatorAddress,
        NewArtwork,
    };
    use proptest::prelude::*;

    fn arb_artwork() -> impl Strategy<Value = NewArtwork> {
        (
            prop::collection::vec(any::<u8>(), 1..64),
            "[a-z ]{1,40}",
            any::<[u8; 20]>(),
            "Qm[a-zA-Z0-9]{10,20}",
            prop::option::of("[a-z0-9]{4,12}"),
            prop::option::of(0u64..1_000_000),
        )
            .prop_map(|(content, prompt, addr, cid, meta, token)| {
                let creator = CreatorAddress::parse(&format!("0x{}", hex_of(&addr)))
                    .map(Creator::Wallet)
                    .unwrap_or(Creator::Anonymous);
                NewArtwork {
                    content_hash: content_hash(&content),
                    prompt_hash: prompt_hash(&prompt),
                    creator,
                    ipfs_cid: cid,
                    model_used: "dall-e-3".into(),
                    metadata_uri: meta.map(|m| metadata_uri(&m)),
                    certificate_token_id: token,
                }
            })
    }

    fn hex_of(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    async fn roundtrip(store: &dyn ArtworkStore, new: &NewArtwork) -> ArtworkRecord {
        store.upsert(new).await.unwrap();
        store.find_by_content_hash(&new.content_hash).await.unwrap().unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn upsert_then_find_returns_written_fields(new in arb_artwork()) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let sqlite = SqliteArtworkStore::open_memory().unwrap();
            let memory = MemoryArtworkStore::new();

            let from_sqlite = rt.block_on(roundtrip(&sqlite, &new));
            let from_memory = rt.block_on(roundtrip(&memory, &new));
            prop_assert!(from_sqlite.matches(&new));
            prop_assert!(from_memory.matches(&new));
        }

        #[test]
        fn resave_without_token_keeps_token(new in arb_artwork(), token in 1u64..1000, meta in "[a-z]{3,8}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let store = SqliteArtworkStore::open_memory().unwrap();

            let mut first = new.clone();
            first.certificate_token_id = Some(token);
            rt.block_on(store.upsert(&first)).unwrap();

            let mut second = new;
            second.certificate_token_id = None;
            second.metadata_uri = Some(metadata_uri(&meta));
            let saved = rt.block_on(store.upsert(&second)).unwrap();

            prop_assert_eq!(saved.certificate_token_id, Some(token));
            prop_assert_eq!(saved.metadata_uri, second.metadata_uri);
        }
    }
}
