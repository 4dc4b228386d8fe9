//! Stage events emitted by the orchestrator.
//!
//! Each pipeline stage reports `Started` and then one terminal outcome. The
//! generation stage also reports `InProgress` heartbeats while the provider
//! call is outstanding.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Authorize,
    Validate,
    CheckProvider,
    Generate,
    Fetch,
    Hash,
    PinContent,
    BuildProof,
    PinMetadata,
    Persist,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Authorize => "authorize",
            Stage::Validate => "validate",
            Stage::CheckProvider => "check_provider",
            Stage::Generate => "generate",
            Stage::Fetch => "fetch",
            Stage::Hash => "hash",
            Stage::PinContent => "pin_content",
            Stage::BuildProof => "build_proof",
            Stage::PinMetadata => "pin_metadata",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Started,
    /// Heartbeat during a long call.
    InProgress,
    Completed,
    /// Non-fatal: the run continues.
    Degraded(String),
    Failed(String),
}

impl StageOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StageOutcome::Started | StageOutcome::InProgress)
    }
}

/// One observation of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub outcome: StageOutcome,
    /// Time since the stage started.
    pub elapsed: Duration,
}

impl StageEvent {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Receives stage events. Must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: StageEvent);
}

/// Logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: StageEvent) {
        let stage = event.stage.as_str();
        let elapsed_ms = event.elapsed_ms();
        match &event.outcome {
            StageOutcome::Started => info!(stage, "stage started"),
            StageOutcome::InProgress => info!(stage, elapsed_ms, "stage in progress"),
            StageOutcome::Completed => info!(stage, elapsed_ms, "stage completed"),
            StageOutcome::Degraded(reason) => warn!(stage, elapsed_ms, %reason, "stage degraded"),
            StageOutcome::Failed(reason) => warn!(stage, elapsed_ms, %reason, "stage failed"),
        }
    }
}

/// Forwards events to a channel. Events are dropped once the receiver closes.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<StageEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: StageEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: StageEvent) {}
}
