//! Content-addressed storage.
//!
//! [`ContentStore`] is the pinning collaborator. [`PinataClient`] talks to a
//! Pinata-compatible HTTP API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::PinningConfig;
use crate::error::PinError;

/// Display name attached to pinned artwork files.
pub const ARTWORK_PIN_NAME: &str = "AI Generated Artwork";

/// Display name attached to pinned proof packages.
pub const PACKAGE_PIN_NAME: &str = "Proof of Art package";

/// Where pinned content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinResult {
    pub cid: String,
    /// Public gateway URL for the content.
    pub url: String,
}

/// The content-addressed store collaborator.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pin raw bytes under `filename`, tagged with `attributes`.
    async fn pin_bytes(
        &self,
        bytes: Bytes,
        filename: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<PinResult, PinError>;

    /// Pin a JSON document.
    async fn pin_json(&self, value: &serde_json::Value) -> Result<PinResult, PinError>;
}

/// Client for the Pinata pinning API.
#[derive(Debug, Clone)]
pub struct PinataClient {
    api_url: String,
    gateway_url: String,
    jwt: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinResponse {
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(config: &PinningConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            jwt: config.jwt.clone().filter(|j| !j.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.jwt.is_some()
    }

    fn jwt(&self) -> Result<&str, PinError> {
        self.jwt.as_deref().ok_or(PinError::NotConfigured)
    }

    /// Gateway URL for a CID.
    pub fn gateway_url(&self, cid: &str) -> String {
        format!("{}/{}", self.gateway_url, cid)
    }

    async fn read_cid(&self, response: reqwest::Response) -> Result<PinResult, PinError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PinError::Api { status, message });
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| PinError::InvalidResponse(e.to_string()))?;
        if body.ipfs_hash.is_empty() {
            return Err(PinError::InvalidResponse("empty IpfsHash".into()));
        }

        Ok(PinResult {
            url: self.gateway_url(&body.ipfs_hash),
            cid: body.ipfs_hash,
        })
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn pin_bytes(
        &self,
        bytes: Bytes,
        filename: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<PinResult, PinError> {
        let jwt = self.jwt()?;
        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);

        let metadata = json!({ "name": ARTWORK_PIN_NAME, "keyvalues": attributes });
        let part = Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", metadata.to_string());

        let response = self
            .client
            .post(&url)
            .bearer_auth(jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PinError::Http(e.to_string()))?;

        let pinned = self.read_cid(response).await?;
        debug!(cid = %pinned.cid, filename, size = bytes.len(), "content pinned");
        Ok(pinned)
    }

    async fn pin_json(&self, value: &serde_json::Value) -> Result<PinResult, PinError> {
        let jwt = self.jwt()?;
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(jwt)
            .json(&json!({
                "pinataContent": value,
                "pinataMetadata": { "name": PACKAGE_PIN_NAME },
            }))
            .send()
            .await
            .map_err(|e| PinError::Http(e.to_string()))?;

        let pinned = self.read_cid(response).await?;
        debug!(cid = %pinned.cid, "document pinned");
        Ok(pinned)
    }
}
