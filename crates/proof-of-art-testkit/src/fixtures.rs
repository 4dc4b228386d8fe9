//! Test fixtures and scripted collaborators.
//!
//! Each collaborator behind the orchestrator has an in-process stand-in whose
//! behavior is set up front: succeed, fail, or never answer.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use proof_of_art::config::TimeoutConfig;
use proof_of_art::progress::{ProgressSink, Stage, StageEvent, StageOutcome};
use proof_of_art::provider::{Generated, GenerationProvider, ModelInfo, Parameters};
use proof_of_art::{
    ContentFetcher, ContentStore, FetchError, GenerationRequest, Orchestrator,
    OrchestratorConfig, PinError, PinResult, ProviderError,
};
use proof_of_art_core::{content_hash, CreatorAddress, ValidationError};
use proof_of_art_store::{MemoryArtworkStore, RecordStore};

/// Creator used by fixtures.
pub const CREATOR: &str = "0x1111111111111111111111111111111111111111";

/// Model the scripted provider accepts by default.
pub const DEMO_MODEL: &str = "demo-model";

/// URL the scripted provider returns by default.
pub const DEMO_URL: &str = "https://cdn.test/red-cube.png";

/// The fixture creator.
pub fn creator() -> CreatorAddress {
    CreatorAddress::parse(CREATOR).expect("fixture address is valid")
}

/// A generation request for `prompt` on [`DEMO_MODEL`].
pub fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        creator: Some(creator()),
        prompt: prompt.to_string(),
        model: DEMO_MODEL.to_string(),
        parameters: Parameters::new(),
    }
}

/// Timeouts short enough for tests that exercise expiry.
pub fn short_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        generation_ms: 300,
        download_ms: 300,
        content_pin_ms: 300,
        metadata_pin_ms: 100,
        catalog_ms: 100,
        heartbeat_ms: 40,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// What the scripted provider does when asked to generate.
#[derive(Debug, Clone)]
pub enum ProviderScript {
    /// Return this content URL.
    Url(String),
    /// Fail with an API error carrying this message.
    Fail(String),
    /// Never answer.
    Hang,
}

/// A provider with a fixed model list and a scripted answer.
pub struct ScriptedProvider {
    supported: HashSet<String>,
    configured: HashSet<String>,
    script: ProviderScript,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Configured for [`DEMO_MODEL`], answering with [`DEMO_URL`].
    pub fn new() -> Self {
        Self::with_script(ProviderScript::Url(DEMO_URL.to_string()))
    }

    pub fn with_script(script: ProviderScript) -> Self {
        Self {
            supported: HashSet::from([DEMO_MODEL.to_string()]),
            configured: HashSet::from([DEMO_MODEL.to_string()]),
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Knows [`DEMO_MODEL`] but holds no credentials for it.
    pub fn unconfigured() -> Self {
        Self {
            configured: HashSet::new(),
            ..Self::new()
        }
    }

    /// Number of generate calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn supports(&self, model: &str) -> Result<(), ValidationError> {
        if self.supported.contains(model) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedModel(model.to_string()))
        }
    }

    fn is_configured(&self, model: &str) -> bool {
        self.configured.contains(model)
    }

    async fn generate(
        &self,
        _prompt: &str,
        model: &str,
        _parameters: &Parameters,
    ) -> Result<Generated, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ProviderScript::Url(url) => Ok(Generated {
                content_url: url.clone(),
                metadata: serde_json::json!({ "provider": "scripted", "model": model }),
            }),
            ProviderScript::Fail(message) => Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            }),
            ProviderScript::Hang => std::future::pending().await,
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut models: Vec<ModelInfo> = self
            .configured
            .iter()
            .map(|id| ModelInfo {
                id: id.clone(),
                name: id.clone(),
                description: "Scripted model".into(),
                provider: "scripted".into(),
                available: true,
                features: Vec::new(),
            })
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fetcher
// ─────────────────────────────────────────────────────────────────────────────

/// Serves fixed bytes per URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    content: HashMap<String, Bytes>,
    hang: bool,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`.
    pub fn serve(mut self, url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.content.insert(url.into(), bytes.into());
        self
    }

    /// Never answer.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        if self.hang {
            return std::future::pending().await;
        }
        self.content.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pinning
// ─────────────────────────────────────────────────────────────────────────────

/// What a scripted pin call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinScript {
    Succeed,
    Fail,
    Hang,
}

/// A file pin the scripted store received.
#[derive(Debug, Clone)]
pub struct PinnedFile {
    pub filename: String,
    pub attributes: BTreeMap<String, String>,
    pub size: usize,
}

/// A pinning service that records what it was given.
///
/// CIDs are derived from the pinned content so runs are reproducible.
pub struct ScriptedPins {
    bytes_script: PinScript,
    json_script: PinScript,
    files: Mutex<Vec<PinnedFile>>,
    documents: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedPins {
    /// Both pins succeed.
    pub fn new() -> Self {
        Self::with_scripts(PinScript::Succeed, PinScript::Succeed)
    }

    pub fn with_scripts(bytes_script: PinScript, json_script: PinScript) -> Self {
        Self {
            bytes_script,
            json_script,
            files: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
        }
    }

    /// Files pinned so far.
    pub fn files(&self) -> Vec<PinnedFile> {
        lock(&self.files).clone()
    }

    /// JSON documents pinned so far.
    pub fn documents(&self) -> Vec<serde_json::Value> {
        lock(&self.documents).clone()
    }

    fn pin(cid_prefix: &str, data: &[u8]) -> PinResult {
        let cid = format!("{cid_prefix}{}", &content_hash(data).to_hex()[..16]);
        PinResult {
            url: format!("https://gateway.test/ipfs/{cid}"),
            cid,
        }
    }
}

impl Default for ScriptedPins {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for ScriptedPins {
    async fn pin_bytes(
        &self,
        bytes: Bytes,
        filename: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<PinResult, PinError> {
        match self.bytes_script {
            PinScript::Succeed => {}
            PinScript::Fail => {
                return Err(PinError::Api {
                    status: 502,
                    message: "pinning unavailable".into(),
                })
            }
            PinScript::Hang => return std::future::pending().await,
        }
        lock(&self.files).push(PinnedFile {
            filename: filename.to_string(),
            attributes: attributes.clone(),
            size: bytes.len(),
        });
        Ok(Self::pin("bafyfile", &bytes))
    }

    async fn pin_json(&self, value: &serde_json::Value) -> Result<PinResult, PinError> {
        match self.json_script {
            PinScript::Succeed => {}
            PinScript::Fail => {
                return Err(PinError::Api {
                    status: 502,
                    message: "pinning unavailable".into(),
                })
            }
            PinScript::Hang => return std::future::pending().await,
        }
        lock(&self.documents).push(value.clone());
        Ok(Self::pin("bafyjson", value.to_string().as_bytes()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps every stage event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        lock(&self.events).clone()
    }

    /// Stages that reported `Completed`, in order.
    pub fn completed(&self) -> Vec<Stage> {
        self.matching(|o| matches!(o, StageOutcome::Completed))
    }

    /// Stages that reported `Degraded`, in order.
    pub fn degraded(&self) -> Vec<Stage> {
        self.matching(|o| matches!(o, StageOutcome::Degraded(_)))
    }

    /// Stages that reported `Failed`, in order.
    pub fn failed(&self) -> Vec<Stage> {
        self.matching(|o| matches!(o, StageOutcome::Failed(_)))
    }

    /// Number of heartbeats reported for `stage`.
    pub fn heartbeats(&self, stage: Stage) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| e.stage == stage && e.outcome == StageOutcome::InProgress)
            .count()
    }

    fn matching(&self, pred: impl Fn(&StageOutcome) -> bool) -> Vec<Stage> {
        lock(&self.events)
            .iter()
            .filter(|e| pred(&e.outcome))
            .map(|e| e.stage)
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: StageEvent) {
        lock(&self.events).push(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline fixture
// ─────────────────────────────────────────────────────────────────────────────

/// An orchestrator wired to scripted collaborators and a memory record store.
pub struct PipelineFixture {
    pub provider: Arc<ScriptedProvider>,
    pub pins: Arc<ScriptedPins>,
    pub records: RecordStore,
    pub progress: Arc<RecordingProgress>,
    pub orchestrator: Orchestrator,
}

impl PipelineFixture {
    /// Everything succeeds; [`DEMO_URL`] serves `content`.
    pub fn new(content: &'static [u8]) -> Self {
        Self::builder().content(content).build()
    }

    pub fn builder() -> PipelineFixtureBuilder {
        PipelineFixtureBuilder::default()
    }
}

/// Builder for [`PipelineFixture`].
pub struct PipelineFixtureBuilder {
    provider: ScriptedProvider,
    fetcher: StaticFetcher,
    pins: ScriptedPins,
    records: RecordStore,
    timeouts: TimeoutConfig,
}

impl Default for PipelineFixtureBuilder {
    fn default() -> Self {
        Self {
            provider: ScriptedProvider::new(),
            fetcher: StaticFetcher::new(),
            pins: ScriptedPins::new(),
            records: RecordStore::new(Arc::new(MemoryArtworkStore::new())),
            timeouts: short_timeouts(),
        }
    }
}

impl PipelineFixtureBuilder {
    /// Serve `content` at [`DEMO_URL`].
    pub fn content(mut self, content: &'static [u8]) -> Self {
        self.fetcher = self.fetcher.serve(DEMO_URL, Bytes::from_static(content));
        self
    }

    pub fn provider(mut self, provider: ScriptedProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn fetcher(mut self, fetcher: StaticFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn pins(mut self, pins: ScriptedPins) -> Self {
        self.pins = pins;
        self
    }

    pub fn records(mut self, records: RecordStore) -> Self {
        self.records = records;
        self
    }

    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn build(self) -> PipelineFixture {
        let provider = Arc::new(self.provider);
        let pins = Arc::new(self.pins);
        let progress = Arc::new(RecordingProgress::new());
        let orchestrator = Orchestrator::new(
            provider.clone(),
            Arc::new(self.fetcher),
            pins.clone(),
            self.records.clone(),
            OrchestratorConfig {
                timeouts: self.timeouts,
                prompt_key: None,
            },
        )
        .with_progress(progress.clone());

        PipelineFixture {
            provider,
            pins,
            records: self.records,
            progress,
            orchestrator,
        }
    }
}
