//! Persisted artwork records.

use serde::{Deserialize, Serialize};

use crate::creator::Creator;
use crate::hash::{ContentHash, PromptHash};

/// A row in the artwork record store, keyed uniquely by `content_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkRecord {
    /// Store-assigned id. Zero for an echo that was never persisted.
    pub id: i64,
    pub content_hash: ContentHash,
    pub prompt_hash: PromptHash,
    pub creator_address: Creator,
    #[serde(rename = "ipfsCID")]
    pub ipfs_cid: String,
    pub model_used: String,
    #[serde(rename = "metadataURI")]
    pub metadata_uri: Option<String>,
    pub certificate_token_id: Option<u64>,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds.
    pub updated_at: i64,
}

impl ArtworkRecord {
    /// Whether this record carries exactly the fields written by `new`.
    pub fn matches(&self, new: &NewArtwork) -> bool {
        self.content_hash == new.content_hash
            && self.prompt_hash == new.prompt_hash
            && self.creator_address == new.creator
            && self.ipfs_cid == new.ipfs_cid
            && self.model_used == new.model_used
            && self.metadata_uri == new.metadata_uri
            && self.certificate_token_id == new.certificate_token_id
    }

    /// Whether an on-chain certificate has been linked.
    pub fn is_certified(&self) -> bool {
        self.certificate_token_id.is_some()
    }
}

/// Input to an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtwork {
    pub content_hash: ContentHash,
    pub prompt_hash: PromptHash,
    pub creator: Creator,
    #[serde(rename = "ipfsCID")]
    pub ipfs_cid: String,
    pub model_used: String,
    #[serde(rename = "metadataURI")]
    pub metadata_uri: Option<String>,
    /// When absent, an existing token id is kept.
    pub certificate_token_id: Option<u64>,
}

impl NewArtwork {
    /// The record this write would produce if nothing were persisted.
    pub fn echo(&self, now: i64) -> ArtworkRecord {
        ArtworkRecord {
            id: 0,
            content_hash: self.content_hash,
            prompt_hash: self.prompt_hash,
            creator_address: self.creator.clone(),
            ipfs_cid: self.ipfs_cid.clone(),
            model_used: self.model_used.clone(),
            metadata_uri: self.metadata_uri.clone(),
            certificate_token_id: self.certificate_token_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Metadata URI for a pinned proof package.
pub fn metadata_uri(cid: &str) -> String {
    format!("ipfs://{cid}")
}
