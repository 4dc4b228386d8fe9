//! Golden hash vectors.
//!
//! Known inputs with their expected digests. Any implementation that agrees
//! on these produces interoperable content and prompt hashes.

use proof_of_art_core::{content_hash, prompt_hash};

/// Which hash a vector exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Content,
    Prompt,
}

/// A golden hash vector.
#[derive(Debug, Clone)]
pub struct HashVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub kind: HashKind,
    /// Raw input. Prompt vectors are UTF-8.
    pub input: &'static [u8],
    /// Expected digest, 64 lowercase hex characters.
    pub expected_hex: &'static str,
}

impl HashVector {
    /// Hash the input the way the vector's kind prescribes.
    pub fn compute_hex(&self) -> String {
        match self.kind {
            HashKind::Content => content_hash(self.input).to_hex(),
            HashKind::Prompt => prompt_hash(&String::from_utf8_lossy(self.input)).to_hex(),
        }
    }
}

/// A PNG signature followed by a short body.
pub const RED_CUBE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n red cube";

/// Digest of `"a red cube"`, with or without surrounding whitespace.
pub const RED_CUBE_PROMPT_HASH: &str =
    "9f967626aad3681265acae6ac6a6a2d349237425eb02f3b3328e403006e1b905";

/// Digest of [`RED_CUBE_PNG`].
pub const RED_CUBE_CONTENT_HASH: &str =
    "2d6e005803c3ac278c4e85996c2d85b81aab0f27722a8b1e1a06fef601b4b613";

/// 0x00 through 0xff.
static ALL_BYTES: [u8; 256] = {
    let mut bytes = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        bytes[i] = i as u8;
        i += 1;
    }
    bytes
};

/// Get all golden hash vectors.
pub fn all_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "empty content",
            kind: HashKind::Content,
            input: b"",
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        HashVector {
            name: "abc",
            kind: HashKind::Content,
            input: b"abc",
            expected_hex: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        HashVector {
            name: "every byte value",
            kind: HashKind::Content,
            input: &ALL_BYTES,
            expected_hex: "40aff2e9d2d8922e47afd4648e6967497158785fbd1da870e7110266bf944880",
        },
        HashVector {
            name: "png content",
            kind: HashKind::Content,
            input: RED_CUBE_PNG,
            expected_hex: RED_CUBE_CONTENT_HASH,
        },
        HashVector {
            name: "prompt",
            kind: HashKind::Prompt,
            input: b"a red cube",
            expected_hex: RED_CUBE_PROMPT_HASH,
        },
        HashVector {
            name: "prompt with surrounding whitespace",
            kind: HashKind::Prompt,
            input: b"  a red cube\n",
            expected_hex: RED_CUBE_PROMPT_HASH,
        },
        HashVector {
            name: "prompt keeps inner spacing",
            kind: HashKind::Prompt,
            input: b"hello world",
            expected_hex: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        },
        HashVector {
            name: "whitespace-only prompt hashes as empty",
            kind: HashKind::Prompt,
            input: b" \t ",
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
    ]
}

/// Check every vector. Returns `(name, passed, computed)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .into_iter()
        .map(|vector| {
            let computed = vector.compute_hex();
            (
                vector.name.to_string(),
                computed == vector.expected_hex,
                computed,
            )
        })
        .collect()
}
