//! Chain-backed registry over the ProofOfArt contract.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use proof_of_art_core::{ContentHash, CreatorAddress};
use reqwest::Url;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::{ProvenanceRegistry, Registration};

sol! {
    #[sol(rpc)]
    interface IProofOfArt {
        function contentExists(bytes32 contentHash) external view returns (bool);

        function verifyOwnership(bytes32 contentHash, address claimedOwner) external view returns (bool);

        function getVerificationCount(bytes32 contentHash) external view returns (uint256);

        function getCreatorArtworks(address creator) external view returns (bytes32[]);

        function registerArtwork(
            bytes32 contentHash,
            bytes32 promptHash,
            string ipfsCID,
            string modelUsed,
            string metadataURI
        ) external returns (uint256);

        event ArtworkRegistered(
            bytes32 indexed contentHash,
            address indexed creator,
            string ipfsCID,
            uint256 certificateTokenId,
            uint256 timestamp
        );
    }
}

/// Registry client for a deployed ProofOfArt contract.
///
/// Reads need only an RPC URL and contract address. Registration also needs
/// a signing key; without one the registry is read-only.
pub struct ChainRegistry {
    rpc_url: Url,
    contract: Address,
    signer: Option<PrivateKeySigner>,
}

impl ChainRegistry {
    pub fn new(rpc_url: Url, contract: Address, signer: Option<PrivateKeySigner>) -> Self {
        Self {
            rpc_url,
            contract,
            signer,
        }
    }

    /// Build from configuration. `None` when no RPC URL or contract is set.
    pub fn from_config(config: &RegistryConfig) -> Result<Option<Self>, RegistryError> {
        let (Some(rpc_url), Some(contract)) = (&config.rpc_url, &config.contract_address) else {
            return Ok(None);
        };

        let rpc_url: Url = rpc_url
            .parse()
            .map_err(|e| RegistryError::Config(format!("invalid RPC URL: {e}")))?;
        let contract: Address = contract
            .parse()
            .map_err(|e| RegistryError::Config(format!("invalid contract address: {e}")))?;
        let signer = config
            .private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| {
                k.trim()
                    .parse::<PrivateKeySigner>()
                    .map_err(|e| RegistryError::Config(format!("invalid private key: {e}")))
            })
            .transpose()?;

        Ok(Some(Self::new(rpc_url, contract, signer)))
    }

    /// Whether registration is possible.
    pub fn can_write(&self) -> bool {
        self.signer.is_some()
    }

    /// The account that signs registrations.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }
}

fn bytes32(hash: &ContentHash) -> B256 {
    B256::from(*hash.as_bytes())
}

fn address(owner: &CreatorAddress) -> Address {
    Address::from(owner.to_bytes())
}

fn rpc(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Rpc(e.to_string())
}

fn to_u64(value: U256) -> Result<u64, RegistryError> {
    u64::try_from(value).map_err(|_| RegistryError::Rpc(format!("value {value} exceeds u64")))
}

#[async_trait]
impl ProvenanceRegistry for ChainRegistry {
    async fn exists(&self, hash: &ContentHash) -> Result<bool, RegistryError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IProofOfArt::new(self.contract, &provider);
        contract.contentExists(bytes32(hash)).call().await.map_err(rpc)
    }

    async fn verification_count(&self, hash: &ContentHash) -> Result<u64, RegistryError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IProofOfArt::new(self.contract, &provider);
        let count = contract
            .getVerificationCount(bytes32(hash))
            .call()
            .await
            .map_err(rpc)?;
        to_u64(count)
    }

    async fn owner_artworks(&self, owner: &CreatorAddress) -> Result<Vec<ContentHash>, RegistryError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IProofOfArt::new(self.contract, &provider);
        let hashes = contract
            .getCreatorArtworks(address(owner))
            .call()
            .await
            .map_err(rpc)?;
        Ok(hashes.into_iter().map(|h| ContentHash::from_bytes(h.0)).collect())
    }

    async fn verify_ownership(
        &self,
        hash: &ContentHash,
        owner: &CreatorAddress,
    ) -> Result<bool, RegistryError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IProofOfArt::new(self.contract, &provider);
        contract
            .verifyOwnership(bytes32(hash), address(owner))
            .call()
            .await
            .map_err(rpc)
    }

    async fn register(&self, registration: &Registration) -> Result<u64, RegistryError> {
        let signer = self.signer.clone().ok_or(RegistryError::ReadOnly)?;
        if self.exists(&registration.content_hash).await? {
            return Err(RegistryError::AlreadyRegistered(registration.content_hash));
        }

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.clone());
        let contract = IProofOfArt::new(self.contract, &provider);

        let pending_tx = contract
            .registerArtwork(
                bytes32(&registration.content_hash),
                B256::from(*registration.prompt_hash.as_bytes()),
                registration.ipfs_cid.clone(),
                registration.model_used.clone(),
                registration.metadata_uri.clone(),
            )
            .send()
            .await
            .map_err(rpc)?;
        let tx_hash = *pending_tx.tx_hash();
        debug!(%tx_hash, content_hash = %registration.content_hash, "registration submitted");

        let receipt = pending_tx.get_receipt().await.map_err(rpc)?;
        if !receipt.status() {
            return Err(RegistryError::Reverted(format!("{tx_hash}")));
        }

        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<IProofOfArt::ArtworkRegistered>() {
                let token_id = to_u64(decoded.inner.data.certificateTokenId)?;
                info!(%tx_hash, token_id, content_hash = %registration.content_hash, "artwork registered");
                return Ok(token_id);
            }
        }

        Err(RegistryError::MissingEvent)
    }
}
