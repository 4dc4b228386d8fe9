//! Canonical CBOR encoding of a proof package's identity.
//!
//! Only the five core fields participate: content hash, prompt hash, creator,
//! content CID, and model. Encoding follows RFC 8949 Core Deterministic
//! Encoding (sorted map keys, shortest integers, definite lengths), so equal
//! fields give equal bytes on every platform.

use std::fmt;

use ciborium::value::Value;
use sha2::{Digest, Sha256};

use crate::proof::ProofPackage;

/// Core field keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const CONTENT_HASH: u64 = 0;
    pub const PROMPT_HASH: u64 = 1;
    pub const CREATOR: u64 = 2;
    pub const IPFS_CID: u64 = 3;
    pub const MODEL_USED: u64 = 4;
}

/// SHA-256 of the canonical core-field encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageDigest(pub [u8; 32]);

impl PackageDigest {
    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PackageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PackageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Encode the package's core fields to canonical CBOR bytes.
pub fn canonical_core_bytes(package: &ProofPackage) -> Vec<u8> {
    let entries = vec![
        (
            Value::Integer(keys::MODEL_USED.into()),
            Value::Text(package.model_used.clone()),
        ),
        (
            Value::Integer(keys::CONTENT_HASH.into()),
            Value::Bytes(package.content_hash.0.to_vec()),
        ),
        (
            Value::Integer(keys::PROMPT_HASH.into()),
            Value::Bytes(package.prompt_hash.0.to_vec()),
        ),
        (
            Value::Integer(keys::CREATOR.into()),
            Value::Text(package.creator_address.as_str().to_string()),
        ),
        (
            Value::Integer(keys::IPFS_CID.into()),
            Value::Text(package.ipfs_cid.clone()),
        ),
    ];

    let mut buf = Vec::new();
    encode_map_canonical(&mut buf, &entries);
    buf
}

/// Digest identifying a package by its core fields.
pub fn package_digest(package: &ProofPackage) -> PackageDigest {
    PackageDigest(Sha256::digest(canonical_core_bytes(package)).into())
}

/// Encode a CBOR value. Only the shapes used by the core fields are supported.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_uint(buf, 0, n as u64);
            } else {
                // CBOR encodes -1 as 0, -2 as 1, etc.
                encode_uint(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Null => buf.push(0xf6),
        _ => buf.push(0xf7), // undefined; never produced for core fields
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map (major type 5) with keys sorted by their encoded bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::Creator;
    use crate::proof::ProofPackageBuilder;

    fn package(cid: &str) -> ProofPackage {
        ProofPackageBuilder::new()
            .creator(Creator::Anonymous)
            .prompt("p")
            .content(b"c".to_vec())
            .ipfs_cid(cid)
            .model_used("m")
            .timestamp(0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_encoding_is_sorted_map() {
        let bytes = canonical_core_bytes(&package("cid"));
        // Map of 5 entries, first key 0.
        assert_eq!(bytes[0], 0xa5);
        assert_eq!(bytes[1], 0x00);
        // Key 0 holds a 32-byte byte string.
        assert_eq!(bytes[2], 0x58);
        assert_eq!(bytes[3], 32);
    }

    #[test]
    fn test_matches_ciborium_decode() {
        let pkg = package("QmCid");
        let bytes = canonical_core_bytes(&pkg);
        let value: Value = ciborium::from_reader(&bytes[..]).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map[3].1, Value::Text("QmCid".into()));
        assert_eq!(map[4].1, Value::Text("m".into()));
    }

    #[test]
    fn test_digest_depends_on_core_fields_only() {
        let a = package("cid-a");
        let mut b = a.clone();
        b.timestamp = 99;
        b.parameters.insert("seed".into(), serde_json::json!(7));
        assert_eq!(package_digest(&a), package_digest(&b));

        let c = package("cid-b");
        assert_ne!(package_digest(&a), package_digest(&c));
    }

    #[test]
    fn test_uint_encoding_sizes() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        encode_uint(&mut buf, 0, 24);
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x17, 0x18, 24, 0x19, 0x01, 0x00]);
    }
}
