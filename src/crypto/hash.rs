//! Hashing utilities
//!
//! HASH160 (RIPEMD-160 of SHA-256), used to derive deterministic wallet
//! identities.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes RIPEMD160(SHA256(data)), a 20-byte digest
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let inner = Sha256::digest(data);
    let outer = Ripemd160::digest(inner);

    let mut digest = [0u8; 20];
    digest.copy_from_slice(&outer);
    digest
}
