//! # Proof of Art Testkit
//!
//! Testing utilities for Proof of Art.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with expected content and prompt hashes
//! - **Generators**: Proptest strategies for hashes, prompts, creators, records
//! - **Fixtures**: Scripted collaborators and a ready-wired orchestrator
//!
//! ## Golden Vectors
//!
//! ```rust
//! use proof_of_art_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, computed) in verify_all_vectors() {
//!     assert!(passed, "{name}: {computed}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use proof_of_art_testkit::generators::content;
//! use proof_of_art_core::ContentHash;
//!
//! proptest! {
//!     #[test]
//!     fn hash_is_deterministic(bytes in content(1024)) {
//!         prop_assert_eq!(ContentHash::compute(&bytes), ContentHash::compute(&bytes));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use proof_of_art_testkit::fixtures::{request, PipelineFixture};
//! use proof_of_art_testkit::vectors::RED_CUBE_PNG;
//!
//! let fixture = PipelineFixture::new(RED_CUBE_PNG);
//! let artwork = fixture.orchestrator.generate(request("a red cube")).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    PinScript, PipelineFixture, ProviderScript, RecordingProgress, ScriptedPins,
    ScriptedProvider, StaticFetcher,
};
pub use vectors::{all_vectors, verify_all_vectors, HashKind, HashVector};
