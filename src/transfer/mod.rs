//! Value transfer
//!
//! The ledger never moves funds itself. Once a transaction reaches quorum
//! it hands `(target, value, payload)` to a [`ValueTransfer`] and trusts
//! the result. [`Treasury`] is an in-memory implementation that tracks
//! balances.

pub mod treasury;

pub use treasury::{Treasury, TransferRecord};

use crate::identity::Identity;
use thiserror::Error;

/// Reasons a send can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },
    #[error("Recipient rejected transfer: {0}")]
    Rejected(Identity),
    #[error("Balance overflow for {0}")]
    Overflow(Identity),
    #[error("Transfer failed: {0}")]
    Other(String),
}

/// Atomic "send value to target with payload" primitive
///
/// An implementation either performs the whole transfer and returns `Ok`,
/// or performs nothing and returns an error.
pub trait ValueTransfer {
    fn send_value(
        &mut self,
        target: &Identity,
        value: u128,
        payload: &[u8],
    ) -> Result<(), TransferError>;
}

impl<F> ValueTransfer for F
where
    F: FnMut(&Identity, u128, &[u8]) -> Result<(), TransferError>,
{
    fn send_value(
        &mut self,
        target: &Identity,
        value: u128,
        payload: &[u8],
    ) -> Result<(), TransferError> {
        self(target, value, payload)
    }
}
