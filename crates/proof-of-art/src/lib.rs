//! # Proof of Art
//!
//! Provenance for AI-generated artwork: generate, hash, pin, record, and
//! verify.
//!
//! ## Overview
//!
//! - **Orchestrator**: provider call, download, hashing, then pinning, proof
//!   package and record persistence, with per-stage progress events
//! - **Verification**: registry existence and verification count, reconciled
//!   with the local record store
//! - **Catalog**: record queries, external submissions, certificate linkage
//! - **Collaborators**: generation providers, content fetcher, pinning
//!   service, and provenance registry, each behind a trait
//!
//! ## Usage
//!
//! ```rust,no_run
//! use proof_of_art::{Config, GenerationRequest, PublishOptions, Services};
//! use proof_of_art::core::CreatorAddress;
//!
//! async fn example() {
//!     let config = Config::load_or_default(None).unwrap();
//!     let services = Services::from_config(&config).unwrap();
//!
//!     let creator = CreatorAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
//!     let artwork = services
//!         .orchestrator
//!         .generate(GenerationRequest {
//!             creator: Some(creator),
//!             prompt: "a red cube".into(),
//!             model: "dall-e-3".into(),
//!             parameters: Default::default(),
//!         })
//!         .await
//!         .unwrap();
//!     assert!(!artwork.ipfs_ready);
//!
//!     let published = services
//!         .orchestrator
//!         .publish(artwork.publish_request(PublishOptions::default()))
//!         .await
//!         .unwrap();
//!     for warning in &published.warnings {
//!         eprintln!("partial: {warning}");
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `proof_of_art::core` - hashes, proof packages, records
//! - `proof_of_art::store` - record storage and degraded mode

pub mod catalog;
pub mod chain;
pub mod config;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod pinning;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod services;
pub mod verification;

pub use proof_of_art_core as core;
pub use proof_of_art_store as store;

pub use catalog::{ArtworkCatalog, ArtworkSubmission, Certificate};
pub use chain::ChainRegistry;
pub use config::Config;
pub use error::{
    CatalogError, ConfigError, FetchError, GenerationFailure, PinError, PipelineError,
    PipelineWarning, ProviderError, RegistryError, Result, VerificationError,
};
pub use fetch::{ContentFetcher, HttpFetcher};
pub use orchestrator::{
    CreateResult, GeneratedArtwork, GenerationRequest, Orchestrator, OrchestratorConfig,
    PublishOptions, PublishRequest, PublishResult, RecordStatus, Timing,
};
pub use pinning::{ContentStore, PinResult, PinataClient};
pub use progress::{
    ChannelProgress, NoopProgress, ProgressSink, Stage, StageEvent, StageOutcome, TracingProgress,
};
pub use provider::{
    list_models_or_default, Generated, GenerationProvider, ModelId, ModelInfo, Parameters,
    ProviderKind, ProviderSet,
};
pub use registry::{MemoryRegistry, ProvenanceRegistry, Registration};
pub use services::{Services, SetupError};
pub use verification::{OwnedArtwork, VerificationReport, VerificationService, VerificationStatus};
