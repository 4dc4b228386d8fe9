//! The generation orchestrator.
//!
//! Runs the creation pipeline in two calls:
//!
//! 1. [`Orchestrator::generate`] authorizes, validates, checks the provider,
//!    generates, downloads and hashes. Nothing is pinned yet
//!    (`ipfs_ready == false`).
//! 2. [`Orchestrator::publish`] pins the content, builds the proof package,
//!    pins the package and upserts the artwork record.
//!
//! [`Orchestrator::create`] runs both back to back.
//!
//! Only the content pin is fatal in step 2. A failed or slow package pin and
//! an unsaved record are reported as [`PipelineWarning`]s on the result.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use proof_of_art_core::{
    content_hash, metadata_uri, normalize_prompt, validate_model_id, validate_prompt,
    ArtworkRecord, ContentHash, CreatorAddress, NewArtwork, PromptHash, PromptKey, ProofPackage,
    ProofPackageBuilder, ValidationError,
};
use proof_of_art_store::{RecordStore, UpsertOutcome};
use tracing::debug;

use crate::config::TimeoutConfig;
use crate::error::{FetchError, GenerationFailure, PinError, PipelineError, PipelineWarning, Result};
use crate::fetch::ContentFetcher;
use crate::pinning::{ContentStore, PinResult};
use crate::progress::{ProgressSink, Stage, StageEvent, StageOutcome, TracingProgress};
use crate::provider::{Generated, GenerationProvider, Parameters};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub timeouts: TimeoutConfig,
    /// Key for sealing prompts. Without one, encryption requests withhold
    /// the prompt instead.
    pub prompt_key: Option<PromptKey>,
}

/// Input to [`Orchestrator::generate`].
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The authenticated creator. `None` is rejected.
    pub creator: Option<CreatorAddress>,
    pub prompt: String,
    pub model: String,
    pub parameters: Parameters,
}

/// Elapsed times for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub total_ms: u64,
    pub generation_ms: u64,
}

/// Output of [`Orchestrator::generate`]: content and hashes, not yet pinned.
#[derive(Debug, Clone)]
pub struct GeneratedArtwork {
    pub creator: CreatorAddress,
    pub bytes: Bytes,
    pub content_hash: ContentHash,
    pub prompt_hash: PromptHash,
    /// The normalized prompt.
    pub prompt: String,
    pub content_url: String,
    pub model: String,
    pub parameters: Parameters,
    /// Provider-specific metadata.
    pub metadata: serde_json::Value,
    /// Always false here; content is pinned by [`Orchestrator::publish`].
    pub ipfs_ready: bool,
    pub timing: Timing,
}

impl GeneratedArtwork {
    /// Build the follow-up publish request.
    pub fn publish_request(&self, options: PublishOptions) -> PublishRequest {
        PublishRequest {
            creator: Some(self.creator.clone()),
            bytes: self.bytes.clone(),
            content_hash: self.content_hash,
            prompt_hash: self.prompt_hash,
            prompt: Some(self.prompt.clone()),
            model: self.model.clone(),
            parameters: self.parameters.clone(),
            options,
        }
    }
}

/// Caller choices for publishing.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Seal the prompt in the package.
    pub encrypt_prompt: bool,
    /// Never embed the prompt text.
    pub private_prompt: bool,
    /// Opaque attestation attached to the package.
    pub biometric: Option<serde_json::Value>,
    /// Name of the pinned file. Defaults to `artwork-<unix ms>.png`.
    pub filename: Option<String>,
}

/// Input to [`Orchestrator::publish`].
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub creator: Option<CreatorAddress>,
    pub bytes: Bytes,
    /// Must equal the hash of `bytes`.
    pub content_hash: ContentHash,
    pub prompt_hash: PromptHash,
    /// Prompt text, when the caller still has it.
    pub prompt: Option<String>,
    pub model: String,
    pub parameters: Parameters,
    pub options: PublishOptions,
}

/// What happened to the artwork record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Persisted,
    /// The store was unavailable.
    Skipped,
    /// The store reported a genuine fault.
    Failed,
}

/// Output of [`Orchestrator::publish`].
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub pin: PinResult,
    pub package: ProofPackage,
    /// `ipfs://<cid>` of the pinned package, if that pin succeeded.
    pub metadata_uri: Option<String>,
    /// The stored row, or an unsaved echo when not persisted.
    pub record: ArtworkRecord,
    pub record_status: RecordStatus,
    pub warnings: Vec<PipelineWarning>,
    pub total_ms: u64,
}

impl PublishResult {
    /// Whether every optional step completed.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Output of [`Orchestrator::create`].
#[derive(Debug, Clone)]
pub struct CreateResult {
    pub artwork: GeneratedArtwork,
    pub publication: PublishResult,
}

/// Times one stage and reports it to the sink.
struct StageClock<'a> {
    sink: &'a dyn ProgressSink,
    stage: Stage,
    started: Instant,
}

impl<'a> StageClock<'a> {
    fn start(sink: &'a dyn ProgressSink, stage: Stage) -> Self {
        sink.emit(StageEvent {
            stage,
            outcome: StageOutcome::Started,
            elapsed: Duration::ZERO,
        });
        Self {
            sink,
            stage,
            started: Instant::now(),
        }
    }

    fn emit(&self, outcome: StageOutcome) {
        self.sink.emit(StageEvent {
            stage: self.stage,
            outcome,
            elapsed: self.started.elapsed(),
        });
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn done(self) {
        self.emit(StageOutcome::Completed);
    }

    fn degraded(self, reason: impl ToString) {
        self.emit(StageOutcome::Degraded(reason.to_string()));
    }

    fn fail<E: std::fmt::Display>(self, err: E) -> E {
        self.emit(StageOutcome::Failed(err.to_string()));
        err
    }
}

/// The generation orchestrator.
///
/// Collaborators are injected once and shared by reference across runs.
pub struct Orchestrator {
    provider: Arc<dyn GenerationProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    pins: Arc<dyn ContentStore>,
    records: RecordStore,
    progress: Arc<dyn ProgressSink>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator that reports progress through `tracing`.
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        fetcher: Arc<dyn ContentFetcher>,
        pins: Arc<dyn ContentStore>,
        records: RecordStore,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            fetcher,
            pins,
            records,
            progress: Arc::new(TracingProgress),
            config,
        }
    }

    /// Replace the progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generate
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate, download and hash. Content is not pinned.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedArtwork> {
        let run_started = Instant::now();
        let sink = self.progress.as_ref();

        let clock = StageClock::start(sink, Stage::Authorize);
        let creator = match request.creator {
            Some(creator) => creator,
            None => return Err(clock.fail(PipelineError::Unauthorized)),
        };
        clock.done();

        let clock = StageClock::start(sink, Stage::Validate);
        let (prompt, model) = match validate_prompt(&request.prompt)
            .and_then(|p| validate_model_id(&request.model).map(|m| (p.to_string(), m.to_string())))
            .and_then(|(p, m)| self.provider.supports(&m).map(|()| (p, m)))
        {
            Ok(valid) => valid,
            Err(e) => return Err(clock.fail(PipelineError::Validation(e))),
        };
        clock.done();

        let clock = StageClock::start(sink, Stage::CheckProvider);
        if !self.provider.is_configured(&model) {
            return Err(clock.fail(PipelineError::ProviderUnavailable { model }));
        }
        clock.done();

        let clock = StageClock::start(sink, Stage::Generate);
        let generated = match self
            .generate_with_heartbeat(&clock, &prompt, &model, &request.parameters)
            .await
        {
            Ok(generated) => generated,
            Err(cause) => {
                let elapsed_ms = clock.elapsed_ms();
                return Err(clock.fail(PipelineError::GenerationFailed {
                    model,
                    elapsed_ms,
                    cause,
                }));
            }
        };
        let generation_ms = clock.elapsed_ms();
        clock.done();

        let clock = StageClock::start(sink, Stage::Fetch);
        let bytes = match self.fetch(&generated.content_url).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(clock.fail(PipelineError::DownloadFailed(e))),
        };
        clock.done();

        let clock = StageClock::start(sink, Stage::Hash);
        let content_hash = content_hash(&bytes);
        let prompt_hash = PromptHash::compute(&prompt);
        clock.done();

        debug!(%content_hash, model = %model, size = bytes.len(), "artwork generated");

        Ok(GeneratedArtwork {
            creator,
            bytes,
            content_hash,
            prompt_hash,
            prompt,
            content_url: generated.content_url,
            model,
            parameters: request.parameters,
            metadata: generated.metadata,
            ipfs_ready: false,
            timing: Timing {
                total_ms: run_started.elapsed().as_millis() as u64,
                generation_ms,
            },
        })
    }

    /// Run the provider call under the generation limit, emitting heartbeats.
    async fn generate_with_heartbeat(
        &self,
        clock: &StageClock<'_>,
        prompt: &str,
        model: &str,
        parameters: &Parameters,
    ) -> std::result::Result<Generated, GenerationFailure> {
        let limit = self.config.timeouts.generation();
        let beat = self.config.timeouts.heartbeat();

        let call = self.provider.generate(prompt, model, parameters);
        tokio::pin!(call);
        let deadline = tokio::time::sleep(limit);
        tokio::pin!(deadline);
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + beat, beat);

        loop {
            tokio::select! {
                result = &mut call => return result.map_err(GenerationFailure::Provider),
                _ = &mut deadline => {
                    return Err(GenerationFailure::Timeout { limit_secs: limit.as_secs() });
                }
                _ = heartbeat.tick() => clock.emit(StageOutcome::InProgress),
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        let limit = self.config.timeouts.download();
        within(limit, self.fetcher.fetch(url))
            .await
            .unwrap_or(Err(FetchError::Timeout(limit.as_millis() as u64)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publish
    // ─────────────────────────────────────────────────────────────────────────

    /// Pin, build the proof package, pin the package, and persist.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishResult> {
        let run_started = Instant::now();
        let sink = self.progress.as_ref();

        let clock = StageClock::start(sink, Stage::Authorize);
        let creator = match &request.creator {
            Some(creator) => creator.clone(),
            None => return Err(clock.fail(PipelineError::Unauthorized)),
        };
        clock.done();

        let clock = StageClock::start(sink, Stage::Validate);
        if let Err(e) = check_publish(&request) {
            return Err(clock.fail(PipelineError::Validation(e)));
        }
        clock.done();

        // Content pin: the only fatal step.
        let clock = StageClock::start(sink, Stage::PinContent);
        let filename = request
            .options
            .filename
            .clone()
            .unwrap_or_else(|| format!("artwork-{}.png", now_millis()));
        let attributes = BTreeMap::from([
            ("creator".to_string(), creator.to_string()),
            ("model".to_string(), request.model.clone()),
            ("promptHash".to_string(), request.prompt_hash.to_hex()),
            ("contentHash".to_string(), request.content_hash.to_hex()),
        ]);
        let limit = self.config.timeouts.content_pin();
        let pin = match within(
            limit,
            self.pins.pin_bytes(request.bytes.clone(), &filename, &attributes),
        )
        .await
        .unwrap_or(Err(PinError::Timeout(limit.as_millis() as u64)))
        {
            Ok(pin) => pin,
            Err(e) => return Err(clock.fail(PipelineError::PinFailed(e))),
        };
        clock.done();

        let clock = StageClock::start(sink, Stage::BuildProof);
        let package = match self.build_package(&creator, &request, &pin.cid) {
            Ok(package) => package,
            Err(e) => return Err(clock.fail(e)),
        };
        clock.done();

        let mut warnings = Vec::new();

        let clock = StageClock::start(sink, Stage::PinMetadata);
        let limit = self.config.timeouts.metadata_pin();
        let metadata_uri = match within(limit, self.pins.pin_json(&package.to_json())).await {
            Some(Ok(pinned)) => {
                clock.done();
                Some(metadata_uri(&pinned.cid))
            }
            Some(Err(e)) => {
                let warning = PipelineWarning::MetadataPinFailed(e.to_string());
                clock.degraded(&warning);
                warnings.push(warning);
                None
            }
            None => {
                let warning = PipelineWarning::MetadataPinTimedOut(limit.as_millis() as u64);
                clock.degraded(&warning);
                warnings.push(warning);
                None
            }
        };

        let clock = StageClock::start(sink, Stage::Persist);
        let artwork = NewArtwork {
            content_hash: request.content_hash,
            prompt_hash: package.prompt_hash,
            creator: creator.into(),
            ipfs_cid: pin.cid.clone(),
            model_used: request.model.clone(),
            metadata_uri: metadata_uri.clone(),
            certificate_token_id: None,
        };
        let (record, record_status) = match self.records.upsert(&artwork).await {
            Ok(UpsertOutcome::Stored(record)) => {
                clock.done();
                (record, RecordStatus::Persisted)
            }
            Ok(UpsertOutcome::Skipped(echo)) => {
                let warning = PipelineWarning::RecordNotPersisted;
                clock.degraded(&warning);
                warnings.push(warning);
                (echo, RecordStatus::Skipped)
            }
            Err(e) => {
                let warning = PipelineWarning::RecordSaveFailed(e.to_string());
                clock.degraded(&warning);
                warnings.push(warning);
                (artwork.echo(now_millis()), RecordStatus::Failed)
            }
        };

        debug!(
            content_hash = %request.content_hash,
            cid = %pin.cid,
            warnings = warnings.len(),
            "artwork published"
        );

        Ok(PublishResult {
            pin,
            package,
            metadata_uri,
            record,
            record_status,
            warnings,
            total_ms: run_started.elapsed().as_millis() as u64,
        })
    }

    fn build_package(
        &self,
        creator: &CreatorAddress,
        request: &PublishRequest,
        cid: &str,
    ) -> Result<ProofPackage> {
        let options = &request.options;
        let mut builder = ProofPackageBuilder::new()
            .creator(creator.clone())
            .prompt(request.prompt.clone().unwrap_or_default())
            .prompt_hash(request.prompt_hash)
            .content(request.bytes.to_vec())
            .ipfs_cid(cid)
            .model_used(request.model.clone())
            .parameters(request.parameters.clone())
            .encrypt_prompt(options.encrypt_prompt)
            .private_prompt(options.private_prompt);
        if let Some(biometric) = &options.biometric {
            builder = builder.biometric(biometric.clone());
        }
        if let Some(key) = &self.config.prompt_key {
            builder = builder.prompt_key(key.clone());
        }
        Ok(builder.build()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single call
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate and publish in one call.
    pub async fn create(
        &self,
        request: GenerationRequest,
        options: PublishOptions,
    ) -> Result<CreateResult> {
        let artwork = self.generate(request).await?;
        let publication = self.publish(artwork.publish_request(options)).await?;
        Ok(CreateResult {
            artwork,
            publication,
        })
    }
}

/// Check publish inputs against each other.
fn check_publish(request: &PublishRequest) -> std::result::Result<(), ValidationError> {
    if request.bytes.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    validate_model_id(&request.model)?;
    if content_hash(&request.bytes) != request.content_hash {
        return Err(ValidationError::HashMismatch {
            field: "contentHash",
        });
    }
    if let Some(prompt) = &request.prompt {
        let normalized = normalize_prompt(prompt);
        if !normalized.is_empty() && PromptHash::compute(normalized) != request.prompt_hash {
            return Err(ValidationError::HashMismatch { field: "promptHash" });
        }
    }
    Ok(())
}

/// Await `fut` for at most `limit`. `None` on expiry.
async fn within<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(limit, fut).await.ok()
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
