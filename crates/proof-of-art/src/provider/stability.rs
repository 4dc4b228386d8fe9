//! Stability AI stable-image core.
//!
//! The endpoint answers with raw image bytes, which are returned to the
//! pipeline as a `data:` URL.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::multipart::Form;
use serde_json::json;

use super::{error_body, Generated, ImageBackend, ModelId, Parameters, ProviderKind};
use crate::error::ProviderError;

const GENERATE_PATH: &str = "/v2beta/stable-image/generate/core";
const DEFAULT_STYLE: &str = "enhance";

pub struct StabilityBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl StabilityBackend {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl ImageBackend for StabilityBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stability
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

        let style = parameters
            .get("style_preset")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_STYLE)
            .to_string();

        let mut form = Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", "png")
            .text("style_preset", style.clone());
        if let Some(ratio) = parameters.get("aspect_ratio").and_then(|v| v.as_str()) {
            form = form.text("aspect_ratio", ratio.to_string());
        }

        let response = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .bearer_auth(key)
            .header(reqwest::header::ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_body(response).await);
        }

        let seed = response
            .headers()
            .get("seed")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse("empty image body".into()));
        }

        Ok(Generated {
            content_url: format!("data:image/png;base64,{}", STANDARD.encode(&bytes)),
            metadata: json!({
                "provider": "stability",
                "stylePreset": style,
                "seed": seed,
            }),
        })
    }
}
