//! Error types for Proof of Art core.

use thiserror::Error;

/// Bad input shape. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content bytes are empty")]
    EmptyContent,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("hash must be 64 hex characters, got {len}")]
    InvalidHashLength { len: usize },

    #[error("hash is not valid hex: {0}")]
    InvalidHex(String),

    #[error("invalid creator address: {0}")]
    InvalidAddress(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("prompt is {len} characters, maximum is {max}")]
    PromptTooLong { len: usize, max: usize },

    #[error("model identifier is empty")]
    EmptyModel,

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("{field} does not match the supplied data")]
    HashMismatch { field: &'static str },
}

/// Core errors that can occur while building or reading proof material.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
