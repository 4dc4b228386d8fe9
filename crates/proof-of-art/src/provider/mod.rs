//! Generation providers.
//!
//! Model identifiers are parsed once into a [`ModelId`] whose [`ProviderKind`]
//! selects the backend. Every backend implements [`ImageBackend`];
//! [`ProviderSet`] dispatches to them and is itself the
//! [`GenerationProvider`] the orchestrator consumes.

mod bytez;
mod openai;
mod stability;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use proof_of_art_core::ValidationError;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ProvidersConfig;
use crate::error::ProviderError;

pub use bytez::{BytezBackend, DEFAULT_BYTEZ_MODELS};
pub use openai::OpenAiBackend;
pub use stability::StabilityBackend;

/// Generation parameters, passed through to the provider.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Prefix selecting a Bytez-hosted model, e.g. `bytez:org/model`.
pub const BYTEZ_PREFIX: &str = "bytez:";

// ─────────────────────────────────────────────────────────────────────────────
// Model identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Which backend serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Stability,
    Bytez,
}

impl ProviderKind {
    /// Display label for catalogs.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Stability => "Stability AI",
            ProviderKind::Bytez => "Bytez",
        }
    }
}

/// A parsed model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// `dall-e-3`
    DallE3,
    /// `stability-ai`
    StableImageCore,
    /// `bytez:<repository id>`
    Bytez(String),
}

impl ModelId {
    /// Parse a request-level model identifier.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        match input {
            "" => Err(ValidationError::EmptyModel),
            "dall-e-3" => Ok(ModelId::DallE3),
            "stability-ai" => Ok(ModelId::StableImageCore),
            other => match other.strip_prefix(BYTEZ_PREFIX) {
                Some(repo) if !repo.trim().is_empty() => Ok(ModelId::Bytez(repo.trim().to_string())),
                _ => Err(ValidationError::UnsupportedModel(other.to_string())),
            },
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ModelId::DallE3 => ProviderKind::OpenAi,
            ModelId::StableImageCore => ProviderKind::Stability,
            ModelId::Bytez(_) => ProviderKind::Bytez,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelId::DallE3 => f.write_str("dall-e-3"),
            ModelId::StableImageCore => f.write_str("stability-ai"),
            ModelId::Bytez(repo) => write!(f, "{BYTEZ_PREFIX}{repo}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator interface
// ─────────────────────────────────────────────────────────────────────────────

/// What a provider produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// Where to fetch the content. May be an `http(s)` or `data:` URL.
    pub content_url: String,
    /// Provider-specific metadata (revised prompt, seed, ...).
    pub metadata: serde_json::Value,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub provider: String,
    pub available: bool,
    pub features: Vec<String>,
}

/// The generation provider collaborator.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Whether `model` names a model this provider can serve at all.
    fn supports(&self, model: &str) -> Result<(), ValidationError>;

    /// Whether credentials exist for `model`.
    fn is_configured(&self, model: &str) -> bool;

    /// Produce content for a prompt.
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        parameters: &Parameters,
    ) -> Result<Generated, ProviderError>;

    /// The provider's model catalog. May fail; see [`list_models_or_default`].
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;
}

/// One backend behind [`ProviderSet`].
#[async_trait]
pub trait ImageBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn is_configured(&self) -> bool;

    async fn generate(
        &self,
        model: &ModelId,
        prompt: &str,
        parameters: &Parameters,
    ) -> Result<Generated, ProviderError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider set
// ─────────────────────────────────────────────────────────────────────────────

/// All configured backends, dispatched by [`ProviderKind`].
pub struct ProviderSet {
    openai: OpenAiBackend,
    stability: StabilityBackend,
    bytez: BytezBackend,
}

impl ProviderSet {
    /// Build backends from configuration, sharing one HTTP client.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            openai: OpenAiBackend::new(
                client.clone(),
                &config.openai_base_url,
                config.openai_api_key.clone(),
            ),
            stability: StabilityBackend::new(
                client.clone(),
                &config.stability_base_url,
                config.stability_api_key.clone(),
            ),
            bytez: BytezBackend::new(client, &config.bytez_base_url, config.bytez_api_key.clone()),
        }
    }

    fn backend(&self, kind: ProviderKind) -> &dyn ImageBackend {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Stability => &self.stability,
            ProviderKind::Bytez => &self.bytez,
        }
    }

    fn fixed_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: ModelId::DallE3.to_string(),
                name: "DALL-E 3".into(),
                description: "OpenAI DALL-E 3 - High quality image generation".into(),
                provider: ProviderKind::OpenAi.label().into(),
                available: self.openai.is_configured(),
                features: vec![
                    "1024x1024".into(),
                    "1792x1024".into(),
                    "1024x1792".into(),
                    "HD quality".into(),
                ],
            },
            ModelInfo {
                id: ModelId::StableImageCore.to_string(),
                name: "Stability AI".into(),
                description: "Stable Diffusion - Fast and flexible generation".into(),
                provider: ProviderKind::Stability.label().into(),
                available: self.stability.is_configured(),
                features: vec![
                    "Custom sizes".into(),
                    "Style presets".into(),
                    "High quality".into(),
                ],
            },
        ]
    }
}

#[async_trait]
impl GenerationProvider for ProviderSet {
    fn supports(&self, model: &str) -> Result<(), ValidationError> {
        ModelId::parse(model).map(|_| ())
    }

    fn is_configured(&self, model: &str) -> bool {
        ModelId::parse(model)
            .map(|id| self.backend(id.kind()).is_configured())
            .unwrap_or(false)
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        parameters: &Parameters,
    ) -> Result<Generated, ProviderError> {
        let id = ModelId::parse(model).map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        let backend = self.backend(id.kind());
        if !backend.is_configured() {
            return Err(ProviderError::NotConfigured(id.to_string()));
        }
        debug!(model = %id, provider = backend.kind().label(), "dispatching generation");
        backend.generate(&id, prompt, parameters).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut models = self.fixed_models();
        let available = self.bytez.is_configured();
        for (repo, name, description) in self.bytez.list_text_to_image().await? {
            models.push(bytez_entry(&repo, &name, &description, available));
        }
        Ok(models)
    }
}

fn bytez_entry(repo: &str, name: &str, description: &str, available: bool) -> ModelInfo {
    ModelInfo {
        id: ModelId::Bytez(repo.to_string()).to_string(),
        name: name.to_string(),
        description: if description.is_empty() {
            format!("Bytez {name} - Text to image generation")
        } else {
            description.to_string()
        },
        provider: ProviderKind::Bytez.label().into(),
        available,
        features: vec!["Text-to-image".into(), "High quality".into()],
    }
}

/// The static catalog used when the provider catalog cannot be fetched.
///
/// Availability is taken from `provider`.
pub fn default_models(provider: &dyn GenerationProvider) -> Vec<ModelInfo> {
    let mut models = vec![
        ModelInfo {
            id: ModelId::DallE3.to_string(),
            name: "DALL-E 3".into(),
            description: "OpenAI DALL-E 3 - High quality image generation".into(),
            provider: ProviderKind::OpenAi.label().into(),
            available: false,
            features: vec!["1024x1024".into(), "HD quality".into()],
        },
        ModelInfo {
            id: ModelId::StableImageCore.to_string(),
            name: "Stability AI".into(),
            description: "Stable Diffusion - Fast and flexible generation".into(),
            provider: ProviderKind::Stability.label().into(),
            available: false,
            features: vec!["Style presets".into(), "High quality".into()],
        },
    ];
    for (repo, name, description) in DEFAULT_BYTEZ_MODELS {
        models.push(bytez_entry(repo, name, description, false));
    }
    for model in &mut models {
        model.available = provider.is_configured(&model.id);
    }
    models
}

/// Fetch the provider catalog within `limit`, falling back to
/// [`default_models`] on error, timeout, or an empty answer.
pub async fn list_models_or_default(
    provider: &dyn GenerationProvider,
    limit: Duration,
) -> Vec<ModelInfo> {
    match tokio::time::timeout(limit, provider.list_models()).await {
        Ok(Ok(models)) if !models.is_empty() => models,
        Ok(Ok(_)) => {
            warn!("provider catalog was empty, using defaults");
            default_models(provider)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "provider catalog unavailable, using defaults");
            default_models(provider)
        }
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "provider catalog timed out, using defaults");
            default_models(provider)
        }
    }
}

/// Longest error message kept from a response body, in bytes.
const MAX_ERROR_BODY: usize = 512;

/// Read a response body as an error message, bounded for logs.
pub(crate) async fn error_body(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::Api {
        status,
        message: truncate_on_char_boundary(message, MAX_ERROR_BODY),
    }
}

/// Cut `text` to at most `max` bytes without splitting a character.
fn truncate_on_char_boundary(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[cfg(test)]
pub(crate) mod mock {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one HTTP response on a local port.
    ///
    /// Returns the base URL and a handle resolving to the received request,
    /// lowercased.
    pub(crate) async fn serve_once(
        status: u16,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut response = format!(
            "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        )
        .into_bytes();
        for (name, value) in headers {
            response.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        response.extend_from_slice(b"\r\n");
        response.extend_from_slice(&body);

        let handle = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return String::new();
            };
            let request = read_request(&mut stream).await;
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });

        (format!("http://{addr}"), handle)
    }

    /// Read until the head and the declared body have arrived.
    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return buf,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());
            match length {
                Some(len) if buf.len() >= end + 4 + len => return buf,
                Some(_) => {}
                None if head.contains("transfer-encoding: chunked") => {
                    if buf.ends_with(b"0\r\n\r\n") {
                        return buf;
                    }
                }
                None => return buf,
            }
        }
    }
}
