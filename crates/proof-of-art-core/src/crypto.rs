//! Prompt encryption for private proof packages.
//!
//! ChaCha20-Poly1305 with a key derived from an operator secret via Blake3.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const KEY_CONTEXT: &str = "proof-of-art-v1 prompt-encryption";

/// A 256-bit key used to seal prompts.
#[derive(Clone)]
pub struct PromptKey([u8; 32]);

impl PromptKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a key from an arbitrary-length secret.
    pub fn derive(secret: &[u8]) -> Self {
        Self(blake3::derive_key(KEY_CONTEXT, secret))
    }

    /// Seal a prompt under a fresh random nonce.
    pub fn encrypt(&self, prompt: &str) -> Result<EncryptedPrompt> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), prompt.as_bytes())
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        Ok(EncryptedPrompt {
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Open a sealed prompt.
    pub fn decrypt(&self, sealed: &EncryptedPrompt) -> Result<String> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::DecryptionError(e.to_string()))?;

        let nonce = hex::decode(&sealed.nonce)
            .map_err(|e| CoreError::DecryptionError(format!("nonce: {e}")))?;
        if nonce.len() != 12 {
            return Err(CoreError::DecryptionError(format!(
                "nonce must be 12 bytes, got {}",
                nonce.len()
            )));
        }
        let ciphertext = hex::decode(&sealed.ciphertext)
            .map_err(|e| CoreError::DecryptionError(format!("ciphertext: {e}")))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|e| CoreError::DecryptionError(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CoreError::DecryptionError(e.to_string()))
    }
}

impl std::fmt::Debug for PromptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PromptKey(..)")
    }
}

/// A prompt sealed with [`PromptKey::encrypt`], hex-encoded for JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPrompt {
    pub nonce: String,
    pub ciphertext: String,
}
