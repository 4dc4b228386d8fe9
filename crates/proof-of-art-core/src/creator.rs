//! Creator identity.
//!
//! A creator is either a wallet address or the explicit [`Creator::Anonymous`]
//! sentinel. The sentinel only becomes the zero address at the storage and
//! registry boundary.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// The address anonymous records are stored under.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A lowercase `0x`-prefixed 20-byte wallet address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatorAddress(String);

impl CreatorAddress {
    /// Parse and canonicalize an address.
    ///
    /// The zero address is reserved for anonymous records and rejected here.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(format!("missing 0x prefix: {trimmed}")))?;

        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(trimmed.to_string()));
        }

        let canonical = format!("0x{}", digits.to_ascii_lowercase());
        if canonical == ZERO_ADDRESS {
            return Err(ValidationError::InvalidAddress(
                "zero address is reserved for anonymous records".into(),
            ));
        }
        Ok(Self(canonical))
    }

    /// The canonical lowercase string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 20 address bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated as 40 hex digits at construction.
        let _ = hex::decode_to_slice(&self.0[2..], &mut out);
        out
    }
}

impl fmt::Debug for CreatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for CreatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CreatorAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Who an artwork record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Creator {
    /// An authenticated wallet.
    Wallet(CreatorAddress),
    /// No identity was supplied. Stored as [`ZERO_ADDRESS`].
    Anonymous,
}

impl Creator {
    /// Parse a stored or claimed address. The zero address maps to `Anonymous`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.trim().eq_ignore_ascii_case(ZERO_ADDRESS) {
            return Ok(Creator::Anonymous);
        }
        CreatorAddress::parse(input).map(Creator::Wallet)
    }

    /// The string written to storage and sent to the registry.
    pub fn as_str(&self) -> &str {
        match self {
            Creator::Wallet(addr) => addr.as_str(),
            Creator::Anonymous => ZERO_ADDRESS,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Creator::Anonymous)
    }

    /// The wallet address, if any.
    pub fn address(&self) -> Option<&CreatorAddress> {
        match self {
            Creator::Wallet(addr) => Some(addr),
            Creator::Anonymous => None,
        }
    }
}

impl From<CreatorAddress> for Creator {
    fn from(addr: CreatorAddress) -> Self {
        Creator::Wallet(addr)
    }
}

impl fmt::Display for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Creator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Creator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Creator::parse(&s).map_err(serde::de::Error::custom)
    }
}
