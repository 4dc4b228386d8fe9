//! Process-wide service assembly.
//!
//! Every collaborator is built once from [`Config`] and shared by `Arc`.

use std::sync::Arc;

use proof_of_art_core::PromptKey;
use proof_of_art_store::RecordStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::ArtworkCatalog;
use crate::chain::ChainRegistry;
use crate::config::Config;
use crate::error::RegistryError;
use crate::fetch::HttpFetcher;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::pinning::PinataClient;
use crate::provider::{list_models_or_default, GenerationProvider, ModelInfo, ProviderSet};
use crate::registry::{MemoryRegistry, ProvenanceRegistry};
use crate::verification::VerificationService;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("store setup failed: {0}")]
    Store(#[from] proof_of_art_store::StoreError),

    #[error("registry setup failed: {0}")]
    Registry(#[from] RegistryError),
}

/// The assembled services.
pub struct Services {
    pub provider: Arc<dyn GenerationProvider>,
    pub records: RecordStore,
    pub registry: Arc<dyn ProvenanceRegistry>,
    pub orchestrator: Orchestrator,
    pub verification: VerificationService,
    pub catalog: ArtworkCatalog,
    catalog_timeout: std::time::Duration,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let provider: Arc<dyn GenerationProvider> =
            Arc::new(ProviderSet::from_config(&config.providers));
        let pins = Arc::new(PinataClient::new(&config.pinning));
        if !pins.is_configured() {
            warn!("pinning is not configured, publishing will fail");
        }
        let records = RecordStore::open_sqlite(config.store.database_path.as_deref())?;

        let registry: Arc<dyn ProvenanceRegistry> = match ChainRegistry::from_config(&config.registry)? {
            Some(chain) => {
                info!(writable = chain.can_write(), "using chain registry");
                Arc::new(chain)
            }
            None => {
                warn!("no registry configured, using an empty in-memory registry");
                Arc::new(MemoryRegistry::new())
            }
        };

        let prompt_key = config
            .privacy
            .prompt_encryption_secret
            .as_deref()
            .map(|secret| PromptKey::derive(secret.as_bytes()));

        let orchestrator = Orchestrator::new(
            provider.clone(),
            Arc::new(HttpFetcher::new()),
            pins,
            records.clone(),
            OrchestratorConfig {
                timeouts: config.timeouts.clone(),
                prompt_key,
            },
        );

        Ok(Self {
            verification: VerificationService::new(registry.clone(), records.clone()),
            catalog: ArtworkCatalog::new(records.clone()).with_registry(registry.clone()),
            provider,
            records,
            registry,
            orchestrator,
            catalog_timeout: config.timeouts.catalog(),
        })
    }

    /// The model catalog, with static defaults when the provider is slow or
    /// unreachable.
    pub async fn models(&self) -> Vec<ModelInfo> {
        list_models_or_default(self.provider.as_ref(), self.catalog_timeout).await
    }
}
