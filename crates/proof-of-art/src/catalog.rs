//! The artwork catalog: record queries and certificate linkage.
//!
//! Identities passed here are already authenticated by the caller.

use std::sync::Arc;

use proof_of_art_core::{
    ArtworkRecord, ContentHash, Creator, CreatorAddress, NewArtwork, PromptHash, ValidationError,
};
use proof_of_art_store::{RecordStore, TokenLink, UpsertOutcome};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{CatalogError, RegistryError};
use crate::registry::{ProvenanceRegistry, Registration};

/// A record submitted by a client that pinned the artwork itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkSubmission {
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub prompt_hash: Option<String>,
    /// Claimed creator. Ignored when the caller is authenticated.
    #[serde(default)]
    pub creator_address: Option<String>,
    #[serde(default, rename = "ipfsCID")]
    pub ipfs_cid: Option<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default, rename = "metadataURI")]
    pub metadata_uri: Option<String>,
    #[serde(default)]
    pub certificate_token_id: Option<u64>,
}

/// Result of [`ArtworkCatalog::register_and_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Certificate {
    pub token_id: u64,
    pub link: TokenLink,
}

pub struct ArtworkCatalog {
    records: RecordStore,
    registry: Option<Arc<dyn ProvenanceRegistry>>,
}

impl ArtworkCatalog {
    pub fn new(records: RecordStore) -> Self {
        Self {
            records,
            registry: None,
        }
    }

    /// Enable [`ArtworkCatalog::register_and_link`].
    pub fn with_registry(mut self, registry: Arc<dyn ProvenanceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Save or update a record from an external client.
    ///
    /// The authenticated identity wins over a claimed address. With neither,
    /// the record is attributed to [`Creator::Anonymous`].
    pub async fn record_external(
        &self,
        submission: ArtworkSubmission,
        identity: Option<&CreatorAddress>,
    ) -> Result<UpsertOutcome, CatalogError> {
        let content_hash = ContentHash::parse(&required(submission.content_hash, "contentHash")?)?;
        let prompt_hash = PromptHash::parse(&required(submission.prompt_hash, "promptHash")?)?;
        let ipfs_cid = required(submission.ipfs_cid, "ipfsCID")?;
        let model_used = required(submission.model_used, "modelUsed")?;

        let creator = match (identity, submission.creator_address.as_deref()) {
            (Some(identity), _) => Creator::Wallet(identity.clone()),
            (None, Some(claimed)) if !claimed.trim().is_empty() => Creator::parse(claimed)?,
            (None, _) => Creator::Anonymous,
        };
        if creator.is_anonymous() {
            warn!(%content_hash, "recording artwork without a creator");
        }

        let outcome = self
            .records
            .upsert(&NewArtwork {
                content_hash,
                prompt_hash,
                creator,
                ipfs_cid,
                model_used,
                metadata_uri: submission.metadata_uri.filter(|m| !m.trim().is_empty()),
                certificate_token_id: submission.certificate_token_id,
            })
            .await?;
        Ok(outcome)
    }

    pub async fn get(&self, hash: &str) -> Result<ArtworkRecord, CatalogError> {
        let hash = ContentHash::parse(hash)?;
        self.records
            .find_by_content_hash(&hash)
            .await?
            .ok_or(CatalogError::NotFound(hash))
    }

    /// All records, newest first, optionally for one creator.
    pub async fn list(&self, creator: Option<&str>) -> Result<Vec<ArtworkRecord>, CatalogError> {
        let creator = creator.map(Creator::parse).transpose()?;
        Ok(self.records.list_all(creator.as_ref()).await?)
    }

    /// The caller's records, newest first.
    pub async fn mine(&self, identity: Option<&CreatorAddress>) -> Result<Vec<ArtworkRecord>, CatalogError> {
        let identity = identity.ok_or(CatalogError::Unauthorized)?;
        Ok(self
            .records
            .find_by_creator(&Creator::Wallet(identity.clone()))
            .await?)
    }

    /// Attach a certificate token id to the caller's record.
    pub async fn link_certificate(
        &self,
        hash: &str,
        token_id: u64,
        identity: Option<&CreatorAddress>,
    ) -> Result<TokenLink, CatalogError> {
        let identity = identity.ok_or(CatalogError::Unauthorized)?;
        let record = self.owned_record(hash, identity).await?;

        match self
            .records
            .update_certificate_token_id(&record.content_hash, token_id)
            .await?
        {
            TokenLink::Skipped => Err(CatalogError::StoreUnavailable),
            link => Ok(link),
        }
    }

    /// Register the caller's record on the registry and link the token id.
    pub async fn register_and_link(
        &self,
        hash: &str,
        identity: Option<&CreatorAddress>,
    ) -> Result<Certificate, CatalogError> {
        let identity = identity.ok_or(CatalogError::Unauthorized)?;
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| RegistryError::Config("no registry configured".into()))?;
        let record = self.owned_record(hash, identity).await?;

        let token_id = registry
            .register(&Registration {
                content_hash: record.content_hash,
                prompt_hash: record.prompt_hash,
                ipfs_cid: record.ipfs_cid.clone(),
                model_used: record.model_used.clone(),
                metadata_uri: record.metadata_uri.clone().unwrap_or_default(),
                creator: identity.clone(),
            })
            .await?;
        info!(content_hash = %record.content_hash, token_id, "certificate issued");

        let link = self
            .records
            .update_certificate_token_id(&record.content_hash, token_id)
            .await?;
        if link != TokenLink::Linked {
            warn!(content_hash = %record.content_hash, token_id, ?link, "certificate not linked locally");
        }
        Ok(Certificate { token_id, link })
    }

    async fn owned_record(
        &self,
        hash: &str,
        identity: &CreatorAddress,
    ) -> Result<ArtworkRecord, CatalogError> {
        let record = self.get(hash).await?;
        if record.creator_address.address() != Some(identity) {
            return Err(CatalogError::Forbidden);
        }
        Ok(record)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use proof_of_art_core::{content_hash, prompt_hash};
    use proof_of_art_store::MemoryArtworkStore;

    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn addr(s: &str) -> CreatorAddress {
        CreatorAddress::parse(s).unwrap()
    }

    fn submission(content: &[u8]) -> ArtworkSubmission {
        ArtworkSubmission {
            content_hash: Some(content_hash(content).to_prefixed()),
            prompt_hash: Some(prompt_hash("p").to_hex()),
            creator_address: None,
            ipfs_cid: Some("QmX".into()),
            model_used: Some("dall-e-3".into()),
            metadata_uri: None,
            certificate_token_id: None,
        }
    }

    fn catalog() -> ArtworkCatalog {
        ArtworkCatalog::new(RecordStore::new(Arc::new(MemoryArtworkStore::new())))
    }

    #[tokio::test]
    async fn test_identity_wins_over_claim() {
        let catalog = catalog();
        let mut sub = submission(b"a");
        sub.creator_address = Some(BOB.into());
        let outcome = catalog.record_external(sub, Some(&addr(ALICE))).await.unwrap();
        assert_eq!(outcome.record().creator_address, Creator::Wallet(addr(ALICE)));

        let mut claimed = submission(b"b");
        claimed.creator_address = Some(BOB.to_uppercase().replace("0X", "0x"));
        let outcome = catalog.record_external(claimed, None).await.unwrap();
        assert_eq!(outcome.record().creator_address, Creator::Wallet(addr(BOB)));

        let outcome = catalog.record_external(submission(b"c"), None).await.unwrap();
        assert!(outcome.record().creator_address.is_anonymous());
    }

    #[tokio::test]
    async fn test_required_fields() {
        let mut sub = submission(b"a");
        sub.ipfs_cid = Some("  ".into());
        let err = catalog().record_external(sub, None).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::MissingField("ipfsCID"))
        ));

        let mut sub = submission(b"a");
        sub.content_hash = Some("abc".into());
        assert!(matches!(
            catalog().record_external(sub, None).await,
            Err(CatalogError::Validation(ValidationError::InvalidHashLength { len: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_submission_from_json() {
        let json = serde_json::json!({
            "contentHash": content_hash(b"a").to_hex(),
            "promptHash": prompt_hash("p").to_hex(),
            "ipfsCID": "QmJson",
            "modelUsed": "stability-ai",
            "metadataURI": "ipfs://QmMeta",
        });
        let sub: ArtworkSubmission = serde_json::from_value(json).unwrap();
        let outcome = catalog().record_external(sub, None).await.unwrap();
        assert_eq!(outcome.record().ipfs_cid, "QmJson");
        assert_eq!(outcome.record().metadata_uri.as_deref(), Some("ipfs://QmMeta"));
    }

    #[tokio::test]
    async fn test_link_certificate_rules() {
        let catalog = catalog();
        let hash = content_hash(b"a").to_hex();
        catalog
            .record_external(submission(b"a"), Some(&addr(ALICE)))
            .await
            .unwrap();

        assert!(matches!(
            catalog.link_certificate(&hash, 7, None).await,
            Err(CatalogError::Unauthorized)
        ));
        assert!(matches!(
            catalog.link_certificate(&hash, 7, Some(&addr(BOB))).await,
            Err(CatalogError::Forbidden)
        ));
        assert!(matches!(
            catalog
                .link_certificate(&content_hash(b"zz").to_hex(), 7, Some(&addr(ALICE)))
                .await,
            Err(CatalogError::NotFound(_))
        ));

        for _ in 0..2 {
            assert_eq!(
                catalog.link_certificate(&hash, 7, Some(&addr(ALICE))).await.unwrap(),
                TokenLink::Linked
            );
        }
        assert_eq!(catalog.get(&hash).await.unwrap().certificate_token_id, Some(7));
    }

    #[tokio::test]
    async fn test_list_and_mine() {
        let catalog = catalog();
        catalog.record_external(submission(b"a"), Some(&addr(ALICE))).await.unwrap();
        catalog.record_external(submission(b"b"), Some(&addr(BOB))).await.unwrap();

        assert_eq!(catalog.list(None).await.unwrap().len(), 2);
        assert_eq!(catalog.list(Some(ALICE)).await.unwrap().len(), 1);
        assert_eq!(catalog.mine(Some(&addr(BOB))).await.unwrap().len(), 1);
        assert!(matches!(catalog.mine(None).await, Err(CatalogError::Unauthorized)));
        assert!(catalog.list(Some("not-an-address")).await.is_err());
    }

    #[tokio::test]
    async fn test_register_and_link() {
        let registry = Arc::new(MemoryRegistry::new());
        let catalog = catalog().with_registry(registry.clone());
        let hash = content_hash(b"a");
        catalog
            .record_external(submission(b"a"), Some(&addr(ALICE)))
            .await
            .unwrap();

        let cert = catalog
            .register_and_link(&hash.to_hex(), Some(&addr(ALICE)))
            .await
            .unwrap();
        assert_eq!(cert, Certificate { token_id: 1, link: TokenLink::Linked });
        assert!(registry.verify_ownership(&hash, &addr(ALICE)).await.unwrap());
        assert!(catalog.get(&hash.to_hex()).await.unwrap().is_certified());

        assert!(matches!(
            catalog.register_and_link(&hash.to_hex(), Some(&addr(ALICE))).await,
            Err(CatalogError::Registry(RegistryError::AlreadyRegistered(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_without_registry() {
        let catalog = catalog();
        catalog
            .record_external(submission(b"a"), Some(&addr(ALICE)))
            .await
            .unwrap();
        assert!(matches!(
            catalog
                .register_and_link(&content_hash(b"a").to_hex(), Some(&addr(ALICE)))
                .await,
            Err(CatalogError::Registry(RegistryError::Config(_)))
        ));
    }
}
