//! Cryptographic utilities
//!
//! HASH160 digests for identity derivation.

pub mod hash;

pub use hash::hash160;
