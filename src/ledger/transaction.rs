//! Proposed wallet transactions
//!
//! A transaction record carries its own row of the confirmation matrix,
//! indexed by owner position. Outside the ledger, transactions are only
//! visible as [`Transaction`] snapshots.

use crate::encoding::hex_bytes;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a proposed transaction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Position in the ledger, assigned at proposal
    pub index: usize,
    /// Owner that proposed the transaction
    pub proposer: Identity,
    /// Recipient of the value transfer
    pub target: Identity,
    /// Amount to transfer
    pub value: u128,
    /// Opaque data handed to the send primitive
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    /// Whether the transfer has been performed
    pub executed: bool,
    /// Number of owners currently confirming
    pub confirmation_count: usize,
}

impl Transaction {
    /// Whether the transaction can be executed under the given threshold
    pub fn is_ready(&self, threshold: usize) -> bool {
        !self.executed && self.confirmation_count >= threshold
    }
}

/// Ledger-internal transaction state
#[derive(Clone, Debug)]
pub(crate) struct TransactionRecord {
    pub proposer: Identity,
    pub target: Identity,
    pub value: u128,
    pub payload: Vec<u8>,
    pub executed: bool,
    pub confirmation_count: usize,
    /// `confirmed[p]` is true while the owner at position `p` confirms
    confirmed: Vec<bool>,
}

impl TransactionRecord {
    pub fn new(
        proposer: Identity,
        target: Identity,
        value: u128,
        payload: Vec<u8>,
        owner_count: usize,
    ) -> Self {
        Self {
            proposer,
            target,
            value,
            payload,
            executed: false,
            confirmation_count: 0,
            confirmed: vec![false; owner_count],
        }
    }

    pub fn is_confirmed_by(&self, position: usize) -> bool {
        self.confirmed.get(position).copied().unwrap_or(false)
    }

    /// Record a confirmation. Caller has checked it was not set.
    pub fn set_confirmed(&mut self, position: usize) {
        debug_assert!(!self.confirmed[position]);
        self.confirmed[position] = true;
        self.confirmation_count += 1;
    }

    /// Clear a confirmation. Caller has checked it was set.
    pub fn clear_confirmed(&mut self, position: usize) {
        debug_assert!(self.confirmed[position]);
        self.confirmed[position] = false;
        self.confirmation_count -= 1;
    }

    /// Owner positions currently confirming, ascending
    pub fn confirmed_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.confirmed
            .iter()
            .enumerate()
            .filter_map(|(position, &set)| set.then_some(position))
    }

    pub fn snapshot(&self, index: usize) -> Transaction {
        Transaction {
            index,
            proposer: self.proposer,
            target: self.target,
            value: self.value,
            payload: self.payload.clone(),
            executed: self.executed,
            confirmation_count: self.confirmation_count,
        }
    }
}
