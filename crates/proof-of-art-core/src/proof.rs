//! Proof packages: the provenance record pinned next to an artwork.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::{package_digest, PackageDigest};
use crate::creator::Creator;
use crate::crypto::{EncryptedPrompt, PromptKey};
use crate::error::{Result, ValidationError};
use crate::hash::{normalize_prompt, ContentHash, PromptHash};

/// Current proof package schema version.
pub const PROOF_PACKAGE_VERSION: u8 = 1;

/// Structured provenance metadata for one artwork.
///
/// Identity is the five core fields (see [`ProofPackage::digest`]). Timestamp,
/// parameters and attestation are context, not identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPackage {
    pub version: u8,
    pub creator_address: Creator,
    pub prompt_hash: PromptHash,
    pub content_hash: ContentHash,
    #[serde(rename = "ipfsCID")]
    pub ipfs_cid: String,
    pub model_used: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_attestation: Option<serde_json::Value>,
    /// Wall-clock build time, Unix milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_prompt: Option<EncryptedPrompt>,
}

impl ProofPackage {
    /// Digest of the canonical core fields.
    pub fn digest(&self) -> PackageDigest {
        package_digest(self)
    }

    /// Whether two packages describe the same artwork claim.
    pub fn is_equivalent(&self, other: &ProofPackage) -> bool {
        self.digest() == other.digest()
    }

    /// How the prompt is carried in this package.
    pub fn disclosure(&self) -> PromptDisclosure {
        match (&self.prompt, &self.encrypted_prompt) {
            (Some(_), _) => PromptDisclosure::Plain,
            (None, Some(_)) => PromptDisclosure::Encrypted,
            (None, None) => PromptDisclosure::Withheld,
        }
    }

    /// Serialize for pinning.
    pub fn to_json(&self) -> serde_json::Value {
        // Every field serializes to a JSON-representable value.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// How the prompt text appears in a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDisclosure {
    /// Raw prompt embedded.
    Plain,
    /// Prompt sealed with a [`PromptKey`].
    Encrypted,
    /// Only the prompt hash is present.
    Withheld,
}

/// Builder for [`ProofPackage`].
///
/// Construction is pure: nothing is pinned or persisted here.
#[derive(Debug, Default)]
pub struct ProofPackageBuilder {
    creator: Option<Creator>,
    prompt: String,
    known_prompt_hash: Option<PromptHash>,
    content: Vec<u8>,
    ipfs_cid: Option<String>,
    model_used: Option<String>,
    parameters: BTreeMap<String, serde_json::Value>,
    biometric: Option<serde_json::Value>,
    encrypt_prompt: bool,
    private_prompt: bool,
    prompt_key: Option<PromptKey>,
    timestamp: Option<i64>,
}

impl ProofPackageBuilder {
    /// Start building a package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the creator.
    pub fn creator(mut self, creator: impl Into<Creator>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the prompt text. It is normalized before hashing.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Prompt hash computed earlier, for when the prompt text itself is not
    /// supplied. When both are given they must agree.
    pub fn prompt_hash(mut self, hash: PromptHash) -> Self {
        self.known_prompt_hash = Some(hash);
        self
    }

    /// Set the generated content bytes.
    pub fn content(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.content = bytes.into();
        self
    }

    /// Set the CID of the pinned content.
    pub fn ipfs_cid(mut self, cid: impl Into<String>) -> Self {
        self.ipfs_cid = Some(cid.into());
        self
    }

    /// Set the model identifier.
    pub fn model_used(mut self, model: impl Into<String>) -> Self {
        self.model_used = Some(model.into());
        self
    }

    /// Add a generation parameter.
    pub fn parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Replace all generation parameters.
    pub fn parameters(mut self, params: BTreeMap<String, serde_json::Value>) -> Self {
        self.parameters = params;
        self
    }

    /// Attach an opaque biometric attestation. Not inspected.
    pub fn biometric(mut self, attestation: serde_json::Value) -> Self {
        self.biometric = Some(attestation);
        self
    }

    /// Request that the prompt be sealed rather than embedded.
    pub fn encrypt_prompt(mut self, encrypt: bool) -> Self {
        self.encrypt_prompt = encrypt;
        self
    }

    /// Request privacy mode: the raw prompt is never embedded.
    pub fn private_prompt(mut self, private: bool) -> Self {
        self.private_prompt = private;
        self
    }

    /// Key used when the prompt is sealed.
    pub fn prompt_key(mut self, key: PromptKey) -> Self {
        self.prompt_key = Some(key);
        self
    }

    /// Override the build timestamp (Unix ms).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Validate inputs and assemble the package.
    pub fn build(self) -> Result<ProofPackage> {
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let creator = self
            .creator
            .ok_or(ValidationError::MissingField("creatorAddress"))?;
        let ipfs_cid = non_blank(self.ipfs_cid).ok_or(ValidationError::MissingField("ipfsCID"))?;
        let model_used =
            non_blank(self.model_used).ok_or(ValidationError::MissingField("modelUsed"))?;

        let normalized = normalize_prompt(&self.prompt);
        let prompt_hash = match (normalized.is_empty(), self.known_prompt_hash) {
            (true, Some(known)) => known,
            (false, Some(known)) if known != PromptHash::compute(normalized) => {
                return Err(ValidationError::HashMismatch { field: "promptHash" }.into());
            }
            _ => PromptHash::compute(normalized),
        };
        let text_known = !normalized.is_empty() || self.known_prompt_hash.is_none();

        let (prompt, encrypted_prompt) = if !text_known {
            (None, None)
        } else if !self.encrypt_prompt && !self.private_prompt {
            (Some(normalized.to_string()), None)
        } else {
            match (self.encrypt_prompt, &self.prompt_key) {
                (true, Some(key)) => (None, Some(key.encrypt(normalized)?)),
                _ => (None, None),
            }
        };

        Ok(ProofPackage {
            version: PROOF_PACKAGE_VERSION,
            creator_address: creator,
            prompt_hash,
            content_hash: ContentHash::compute(&self.content),
            ipfs_cid,
            model_used,
            parameters: self.parameters,
            biometric_attestation: self.biometric,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
            prompt,
            encrypted_prompt,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::CreatorAddress;
    use crate::error::CoreError;
    use serde_json::json;

    fn creator() -> Creator {
        Creator::Wallet(
            CreatorAddress::parse("0x1111111111111111111111111111111111111111").unwrap(),
        )
    }

    fn base() -> ProofPackageBuilder {
        ProofPackageBuilder::new()
            .creator(creator())
            .prompt("  a red cube ")
            .content(b"png bytes".to_vec())
            .ipfs_cid("QmTestCid")
            .model_used("dall-e-3")
            .timestamp(1_700_000_000_000)
    }

    #[test]
    fn test_build_plain_prompt() {
        let pkg = base().build().unwrap();
        assert_eq!(pkg.version, PROOF_PACKAGE_VERSION);
        assert_eq!(pkg.prompt.as_deref(), Some("a red cube"));
        assert_eq!(pkg.prompt_hash, PromptHash::compute("a red cube"));
        assert_eq!(pkg.content_hash, ContentHash::compute(b"png bytes"));
        assert_eq!(pkg.disclosure(), PromptDisclosure::Plain);
    }

    #[test]
    fn test_private_prompt_is_withheld() {
        let pkg = base().private_prompt(true).build().unwrap();
        assert!(pkg.prompt.is_none());
        assert!(pkg.encrypted_prompt.is_none());
        assert_eq!(pkg.prompt_hash, PromptHash::compute("a red cube"));
        assert_eq!(pkg.disclosure(), PromptDisclosure::Withheld);
    }

    #[test]
    fn test_encrypted_prompt() {
        let key = PromptKey::derive(b"k");
        let pkg = base()
            .encrypt_prompt(true)
            .prompt_key(key.clone())
            .build()
            .unwrap();
        assert!(pkg.prompt.is_none());
        let sealed = pkg.encrypted_prompt.as_ref().unwrap();
        assert_eq!(key.decrypt(sealed).unwrap(), "a red cube");
        assert_eq!(pkg.disclosure(), PromptDisclosure::Encrypted);
    }

    #[test]
    fn test_encrypt_without_key_withholds() {
        let pkg = base().encrypt_prompt(true).build().unwrap();
        assert_eq!(pkg.disclosure(), PromptDisclosure::Withheld);
    }

    #[test]
    fn test_missing_fields() {
        let err = ProofPackageBuilder::new()
            .content(b"x".to_vec())
            .ipfs_cid("cid")
            .model_used("m")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField("creatorAddress"))
        ));

        let err = base().ipfs_cid("  ").build().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField("ipfsCID"))
        ));

        let err = base().model_used("").build().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField("modelUsed"))
        ));
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = base().content(Vec::new()).build().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyContent)
        ));
    }

    #[test]
    fn test_known_prompt_hash_without_text() {
        let known = PromptHash::compute("a secret prompt");
        let pkg = base().prompt("").prompt_hash(known).build().unwrap();
        assert_eq!(pkg.prompt_hash, known);
        assert_eq!(pkg.disclosure(), PromptDisclosure::Withheld);

        let agreeing = base().prompt_hash(PromptHash::compute("a red cube")).build().unwrap();
        assert_eq!(agreeing.prompt.as_deref(), Some("a red cube"));

        let err = base().prompt_hash(known).build().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::HashMismatch { field: "promptHash" })
        ));
    }

    #[test]
    fn test_biometric_is_opaque() {
        let blob = json!({"vendor": "x", "score": [1, 2, 3]});
        let pkg = base().biometric(blob.clone()).build().unwrap();
        assert_eq!(pkg.biometric_attestation, Some(blob));
    }

    #[test]
    fn test_json_shape() {
        let pkg = base().parameter("size", json!("1024x1024")).build().unwrap();
        let v = pkg.to_json();
        assert_eq!(v["ipfsCID"], "QmTestCid");
        assert_eq!(v["modelUsed"], "dall-e-3");
        assert_eq!(v["creatorAddress"], "0x1111111111111111111111111111111111111111");
        assert_eq!(v["contentHash"], ContentHash::compute(b"png bytes").to_hex());
        assert_eq!(v["parameters"]["size"], "1024x1024");
        assert!(v.get("biometricAttestation").is_none());
        assert!(v.get("encryptedPrompt").is_none());

        let back: ProofPackage = serde_json::from_value(v).unwrap();
        assert_eq!(back, pkg);
    }

    #[test]
    fn test_equivalence_ignores_context() {
        let a = base().parameter("a", json!(1)).parameter("b", json!(2)).build().unwrap();
        let b = base()
            .parameter("b", json!(2))
            .parameter("a", json!(1))
            .timestamp(42)
            .build()
            .unwrap();
        assert!(a.is_equivalent(&b));

        let c = base().model_used("stability-ai").build().unwrap();
        assert!(!a.is_equivalent(&c));
    }
}
