//! OpenAI image generation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{error_body, Generated, ImageBackend, ModelId, Parameters, ProviderKind};
use crate::error::ProviderError;

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_QUALITY: &str = "standard";

/// Client for the `images/generations` endpoint.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
    revised_prompt: Option<String>,
}

impl OpenAiBackend {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl ImageBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured(model.to_string()))?;

        let param = |name: &str, default: &str| {
            parameters
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };
        let size = param("size", DEFAULT_SIZE);
        let quality = param("quality", DEFAULT_QUALITY);

        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&json!({
                "model": model.to_string(),
                "prompt": prompt,
                "n": 1,
                "size": size,
                "quality": quality,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_body(response).await);
        }

        let body: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let image = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no images returned".into()))?;
        let content_url = image
            .url
            .ok_or_else(|| ProviderError::InvalidResponse("image has no url".into()))?;

        Ok(Generated {
            content_url,
            metadata: json!({
                "provider": "openai",
                "revisedPrompt": image.revised_prompt,
                "size": size,
                "quality": quality,
            }),
        })
    }
}
