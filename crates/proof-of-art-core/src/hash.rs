//! Content and prompt digests.
//!
//! Both digests are SHA-256, hex-encoded lowercase without a prefix. The `0x`
//! form is produced only on request by callers that talk to the registry.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Length of a digest in hex characters.
pub const HASH_HEX_LEN: usize = 64;

/// Hash raw content bytes.
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    ContentHash::compute(bytes)
}

/// Hash prompt text after normalization.
pub fn prompt_hash(text: &str) -> PromptHash {
    PromptHash::compute(text)
}

/// Normalize a prompt before hashing: strip surrounding whitespace.
///
/// No case folding and nothing locale dependent, so every machine agrees.
pub fn normalize_prompt(text: &str) -> &str {
    text.trim()
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Parse a 32-byte digest from hex, accepting an optional `0x` prefix.
///
/// Off-length input is rejected, never padded or truncated.
fn parse_digest(input: &str) -> Result<[u8; 32], ValidationError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if digits.len() != HASH_HEX_LEN {
        return Err(ValidationError::InvalidHashLength { len: digits.len() });
    }

    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| ValidationError::InvalidHex(e.to_string()))?;
    Ok(out)
}

macro_rules! digest_type {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Lowercase hex, no prefix.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Lowercase hex with a `0x` prefix, the form the registry expects.
            pub fn to_prefixed(&self) -> String {
                format!("0x{}", self.to_hex())
            }

            /// Strictly parse 64 hex characters, optionally `0x`-prefixed.
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                parse_digest(input).map(Self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $tag, &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

digest_type!(
    /// SHA-256 of the exact generated content bytes. Primary identity of an artwork.
    ContentHash,
    "Content"
);

digest_type!(
    /// SHA-256 of the normalized prompt text.
    PromptHash,
    "Prompt"
);

impl ContentHash {
    /// Hash the given content. Defined for every byte sequence, including empty.
    pub fn compute(bytes: &[u8]) -> Self {
        Self(sha256(bytes))
    }
}

impl PromptHash {
    /// Hash the normalized form of `text`.
    pub fn compute(text: &str) -> Self {
        Self(sha256(normalize_prompt(text).as_bytes()))
    }
}
