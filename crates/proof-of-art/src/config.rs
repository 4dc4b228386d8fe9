//! Runtime configuration.
//!
//! Loaded from a TOML file or populated with defaults. Secrets can be
//! supplied through environment variables, which override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub pinning: PinningConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub privacy: PrivacyConfig,
}

/// Generation provider credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,

    #[serde(default)]
    pub stability_api_key: Option<String>,

    #[serde(default = "default_stability_url")]
    pub stability_base_url: String,

    #[serde(default)]
    pub bytez_api_key: Option<String>,

    #[serde(default = "default_bytez_url")]
    pub bytez_base_url: String,
}

/// Content-addressed store (Pinata-compatible pinning API).
#[derive(Debug, Clone, Deserialize)]
pub struct PinningConfig {
    #[serde(default)]
    pub jwt: Option<String>,

    #[serde(default = "default_pinning_api_url")]
    pub api_url: String,

    /// Gateway used to build public URLs for pinned content.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
}

/// Artwork record database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// SQLite path. When absent the store runs degraded.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Authoritative registry contract.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub rpc_url: Option<String>,

    #[serde(default)]
    pub contract_address: Option<String>,

    /// Hex private key for write calls. Read-only when absent.
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Operation time limits, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_generation_ms")]
    pub generation_ms: u64,

    #[serde(default = "default_download_ms")]
    pub download_ms: u64,

    #[serde(default = "default_content_pin_ms")]
    pub content_pin_ms: u64,

    /// Must be shorter than `content_pin_ms`.
    #[serde(default = "default_metadata_pin_ms")]
    pub metadata_pin_ms: u64,

    #[serde(default = "default_catalog_ms")]
    pub catalog_ms: u64,

    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
}

/// Prompt privacy settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrivacyConfig {
    /// Secret from which the prompt encryption key is derived.
    #[serde(default)]
    pub prompt_encryption_secret: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_stability_url() -> String {
    "https://api.stability.ai".to_string()
}

fn default_bytez_url() -> String {
    "https://api.bytez.com/models/v2".to_string()
}

fn default_pinning_api_url() -> String {
    "https://api.pinata.cloud".to_string()
}

fn default_gateway_url() -> String {
    "https://gateway.pinata.cloud/ipfs".to_string()
}

fn default_generation_ms() -> u64 {
    300_000
}

fn default_download_ms() -> u64 {
    60_000
}

fn default_content_pin_ms() -> u64 {
    120_000
}

fn default_metadata_pin_ms() -> u64 {
    5_000
}

fn default_catalog_ms() -> u64 {
    3_000
}

fn default_heartbeat_ms() -> u64 {
    5_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            providers: ProvidersConfig::default(),
            pinning: PinningConfig::default(),
            store: StoreConfig::default(),
            registry: RegistryConfig::default(),
            timeouts: TimeoutConfig::default(),
            privacy: PrivacyConfig::default(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: default_openai_url(),
            stability_api_key: None,
            stability_base_url: default_stability_url(),
            bytez_api_key: None,
            bytez_base_url: default_bytez_url(),
        }
    }
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            jwt: None,
            api_url: default_pinning_api_url(),
            gateway_url: default_gateway_url(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            generation_ms: default_generation_ms(),
            download_ms: default_download_ms(),
            content_pin_ms: default_content_pin_ms(),
            metadata_pin_ms: default_metadata_pin_ms(),
            catalog_ms: default_catalog_ms(),
            heartbeat_ms: default_heartbeat_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    pub fn download(&self) -> Duration {
        Duration::from_millis(self.download_ms)
    }

    pub fn content_pin(&self) -> Duration {
        Duration::from_millis(self.content_pin_ms)
    }

    pub fn metadata_pin(&self) -> Duration {
        Duration::from_millis(self.metadata_pin_ms)
    }

    pub fn catalog(&self) -> Duration {
        Duration::from_millis(self.catalog_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise use defaults; then apply
    /// environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::load(p)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override secrets and endpoints from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = Some(value);
            }
        };

        set(&mut self.providers.openai_api_key, "OPENAI_API_KEY");
        set(&mut self.providers.stability_api_key, "STABILITY_API_KEY");
        set(&mut self.providers.bytez_api_key, "BYTEZ_API_KEY");
        set(&mut self.pinning.jwt, "PINATA_JWT");
        set(&mut self.registry.rpc_url, "PROOF_OF_ART_RPC_URL");
        set(&mut self.registry.contract_address, "PROOF_OF_ART_ADDRESS");
        set(&mut self.registry.private_key, "PROOF_OF_ART_PRIVATE_KEY");
        set(
            &mut self.privacy.prompt_encryption_secret,
            "PROMPT_ENCRYPTION_KEY",
        );

        if let Some(path) = lookup("PROOF_OF_ART_DB").filter(|v| !v.trim().is_empty()) {
            self.store.database_path = Some(PathBuf::from(path));
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeouts;
        let named = [
            ("generation_ms", t.generation_ms),
            ("download_ms", t.download_ms),
            ("content_pin_ms", t.content_pin_ms),
            ("metadata_pin_ms", t.metadata_pin_ms),
            ("catalog_ms", t.catalog_ms),
            ("heartbeat_ms", t.heartbeat_ms),
        ];
        if let Some((name, _)) = named.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
        }
        if t.metadata_pin_ms >= t.content_pin_ms {
            return Err(ConfigError::Invalid(format!(
                "metadata_pin_ms ({}) must be shorter than content_pin_ms ({})",
                t.metadata_pin_ms, t.content_pin_ms
            )));
        }
        Ok(())
    }
}
