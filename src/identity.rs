//! Caller and recipient identities
//!
//! An identity is a 20-byte account identifier. Its text form is
//! `0x`-prefixed lowercase hex. The all-zero identity is the null
//! identity and is never accepted as a wallet owner.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an identity in bytes
pub const IDENTITY_LEN: usize = 20;

/// Errors from parsing an identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid identity length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 20-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The null identity
    pub const ZERO: Identity = Identity([0u8; IDENTITY_LEN]);

    /// Create an identity from raw bytes
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an identity from a slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.len() != IDENTITY_LEN {
            return Err(IdentityError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; IDENTITY_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Create an identity from a hex string, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let trimmed = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Whether this is the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }

    /// `0x`-prefixed hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Shortened form for console output, e.g. `0x1234…abcd`
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identity::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
