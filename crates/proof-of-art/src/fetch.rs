//! Downloading generated content.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tracing::debug;

use crate::error::FetchError;

/// Retrieves the bytes behind a provider content URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Fetches `http(s)` URLs with reqwest and decodes `data:` URLs in place.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        if url.starts_with("data:") {
            let bytes = decode_data_url(url)?;
            return non_empty(bytes);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::UnsupportedScheme(scheme_of(url).to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        debug!(size = bytes.len(), "content downloaded");
        non_empty(bytes)
    }
}

fn non_empty(bytes: Bytes) -> Result<Bytes, FetchError> {
    if bytes.is_empty() {
        Err(FetchError::Empty)
    } else {
        Ok(bytes)
    }
}

fn scheme_of(url: &str) -> &str {
    url.split_once(':').map(|(s, _)| s).unwrap_or(url)
}

/// Decode a base64 `data:` URL. Only base64 payloads are accepted.
pub fn decode_data_url(url: &str) -> Result<Bytes, FetchError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUrl("missing data: prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUrl("missing ',' separator".into()))?;
    if !header.ends_with(";base64") {
        return Err(FetchError::InvalidDataUrl("payload is not base64".into()));
    }
    STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| FetchError::InvalidDataUrl(e.to_string()))
}
