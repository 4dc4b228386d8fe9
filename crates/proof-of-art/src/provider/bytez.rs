//! Bytez-hosted open models.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{error_body, Generated, ImageBackend, ModelId, Parameters, ProviderKind};
use crate::error::ProviderError;

/// Catalog used when the live model list cannot be fetched:
/// `(repository id, name, description)`.
pub const DEFAULT_BYTEZ_MODELS: &[(&str, &str, &str)] = &[
    (
        "Linaqruf/animagine-xl-3.0",
        "Animagine XL 3.0",
        "Create images of animals and humans in anime style",
    ),
    (
        "dreamlike-art/dreamlike-photoreal-2.0",
        "Dreamlike Photoreal 2.0",
        "High-quality photorealistic image generation",
    ),
    (
        "stabilityai/stable-diffusion-xl-base-1.0",
        "Stable Diffusion XL",
        "Advanced Stable Diffusion XL model",
    ),
    (
        "dataautogpt3/ProteusV0.2",
        "Proteus V0.2",
        "Proteus V0.2 - Advanced image generation model",
    ),
    (
        "danhtran2mind/Ghibli-Stable-Diffusion-2.1-Base-finetuning",
        "Ghibli Stable Diffusion 2.1",
        "Ghibli Style Advanced image generation model",
    ),
    (
        "playgroundai/playground-v2.5-1024px-aesthetic",
        "Playground v2.5",
        "Aesthetic-focused image generation",
    ),
];

pub struct BytezBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct RunResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Vec<ListedModel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedModel {
    model_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl BytezBackend {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("bytez".into()))
    }

    /// The live text-to-image catalog as `(repository id, name, description)`.
    ///
    /// An empty description is filled in by the caller.
    pub async fn list_text_to_image(&self) -> Result<Vec<(String, String, String)>, ProviderError> {
        let key = self.key()?;
        let response = self
            .client
            .get(format!("{}/list/models", self.base_url))
            .query(&[("task", "text-to-image")])
            .header(reqwest::header::AUTHORIZATION, format!("Key {key}"))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_body(response).await);
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(ProviderError::InvalidResponse(error));
        }

        debug!(count = body.output.len(), "bytez catalog fetched");
        Ok(body
            .output
            .into_iter()
            .map(|m| {
                let name = m
                    .name
                    .unwrap_or_else(|| m.model_id.rsplit('/').next().unwrap_or_default().to_string());
                (m.model_id, name, m.description.unwrap_or_default())
            })
            .collect())
    }
}

#[async_trait]
impl ImageBackend for BytezBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bytez
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        model: &ModelId,
        prompt: &str,
        parameters: &Parameters,
    ) -> Result<Generated, ProviderError> {
        let ModelId::Bytez(repo) = model else {
            return Err(ProviderError::NotConfigured(model.to_string()));
        };
        let key = self.key()?;

        let mut body = json!({ "text": prompt });
        if !parameters.is_empty() {
            body["params"] = json!(parameters);
        }

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, repo))
            .header(reqwest::header::AUTHORIZATION, format!("Key {key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_body(response).await);
        }

        let run: RunResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if let Some(error) = run.error {
            return Err(ProviderError::InvalidResponse(error));
        }

        let content_url = match run.output {
            Some(serde_json::Value::String(url)) if !url.is_empty() => url,
            _ => return Err(ProviderError::InvalidResponse("no image output".into())),
        };

        Ok(Generated {
            content_url,
            metadata: json!({
                "provider": "bytez",
                "model": repo,
            }),
        })
    }
}
