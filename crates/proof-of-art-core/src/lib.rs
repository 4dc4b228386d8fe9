//! # Proof of Art Core
//!
//! Pure primitives for AI-art provenance: content and prompt hashing, proof
//! packages, creator identity, and artwork records.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentHash`] - SHA-256 of the generated bytes, the identity of an artwork
//! - [`PromptHash`] - SHA-256 of the normalized prompt
//! - [`ProofPackage`] - Provenance metadata pinned next to the artwork
//! - [`Creator`] - A wallet address or the anonymous sentinel
//! - [`ArtworkRecord`] - A persisted row keyed by content hash
//!
//! ## Canonicalization
//!
//! Proof package identity is the canonical CBOR encoding of its core fields.
//! See [`canonical`].

pub mod canonical;
pub mod creator;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod proof;
pub mod record;
pub mod validation;

pub use canonical::{canonical_core_bytes, package_digest, PackageDigest};
pub use creator::{Creator, CreatorAddress, ZERO_ADDRESS};
pub use crypto::{EncryptedPrompt, PromptKey};
pub use error::{CoreError, ValidationError};
pub use hash::{content_hash, normalize_prompt, prompt_hash, ContentHash, PromptHash, HASH_HEX_LEN};
pub use proof::{ProofPackage, ProofPackageBuilder, PromptDisclosure, PROOF_PACKAGE_VERSION};
pub use record::{metadata_uri, ArtworkRecord, NewArtwork};
pub use validation::{validate_model_id, validate_prompt, MAX_PROMPT_CHARS};
