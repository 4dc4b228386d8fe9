//! Error types for the pipeline, its collaborators, and the services.

use proof_of_art_core::{ContentHash, CoreError, ValidationError};
use proof_of_art_store::StoreError;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from a generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider for {0} is not configured")]
    NotConfigured(String),

    #[error("provider request failed: {0}")]
    Http(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider response was not understood: {0}")]
    InvalidResponse(String),
}

/// Errors fetching generated content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Http(String),

    #[error("download returned status {0}")]
    Status(u16),

    #[error("downloaded content is empty")]
    Empty,

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("unsupported content location: {0}")]
    UnsupportedScheme(String),

    #[error("download timed out after {0} ms")]
    Timeout(u64),
}

/// Errors from the content-addressed store.
#[derive(Debug, Error)]
pub enum PinError {
    #[error("pinning service is not configured")]
    NotConfigured,

    #[error("pin request failed: {0}")]
    Http(String),

    #[error("pinning service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("pin response was not understood: {0}")]
    InvalidResponse(String),

    #[error("pin timed out after {0} ms")]
    Timeout(u64),
}

/// Errors from the authoritative registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry call failed: {0}")]
    Rpc(String),

    #[error("invalid registry configuration: {0}")]
    Config(String),

    #[error("registry is read-only: no signing key configured")]
    ReadOnly,

    #[error("registration transaction reverted: {0}")]
    Reverted(String),

    #[error("registration receipt carried no ArtworkRegistered event")]
    MissingEvent,

    #[error("artwork already registered: {0}")]
    AlreadyRegistered(ContentHash),
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Why the generation step failed.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    /// The provider did not answer within the configured limit.
    #[error("timed out after {limit_secs} s; try again or choose a faster model")]
    Timeout { limit_secs: u64 },

    #[error(transparent)]
    Provider(ProviderError),
}

/// Fatal errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("authentication required")]
    Unauthorized,

    #[error("model {model} is not configured")]
    ProviderUnavailable { model: String },

    #[error("generation with {model} failed after {elapsed_ms} ms: {cause}")]
    GenerationFailed {
        model: String,
        elapsed_ms: u64,
        cause: GenerationFailure,
    },

    #[error("failed to download generated content: {0}")]
    DownloadFailed(#[source] FetchError),

    #[error("failed to pin content: {0}")]
    PinFailed(#[source] PinError),

    #[error("failed to build proof package: {0}")]
    Proof(#[source] CoreError),
}

impl PipelineError {
    /// Whether the generation step ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipelineError::GenerationFailed {
                cause: GenerationFailure::Timeout { .. },
                ..
            }
        )
    }
}

impl From<CoreError> for PipelineError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(v) => PipelineError::Validation(v),
            other => PipelineError::Proof(other),
        }
    }
}

/// Non-fatal conditions reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineWarning {
    #[error("proof package pin failed: {0}")]
    MetadataPinFailed(String),

    #[error("proof package pin timed out after {0} ms")]
    MetadataPinTimedOut(u64),

    #[error("artwork record not persisted: store unavailable")]
    RecordNotPersisted,

    #[error("artwork record save failed: {0}")]
    RecordSaveFailed(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Services
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from the verification service.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the artwork catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("authentication required")]
    Unauthorized,

    #[error("artwork not found: {0}")]
    NotFound(ContentHash),

    #[error("only the creator can modify this artwork")]
    Forbidden,

    #[error("store is unavailable; the change was not saved")]
    StoreUnavailable,

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
