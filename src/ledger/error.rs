//! Ledger error taxonomy
//!
//! Every rejected operation maps to exactly one variant. A rejected
//! operation never changes ledger state.

use crate::identity::Identity;
use thiserror::Error;

/// Errors returned by [`WalletLedger`](super::WalletLedger) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Caller is not an owner: {0}")]
    Unauthorized(Identity),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(usize),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(usize),
    #[error("Transaction {tx_index} already confirmed by {owner}")]
    AlreadyConfirmed { tx_index: usize, owner: Identity },
    #[error("Transaction {tx_index} not confirmed by {owner}")]
    NotConfirmed { tx_index: usize, owner: Identity },
    #[error("Insufficient confirmations for transaction {tx_index}: have {have}, need {need}")]
    InsufficientConfirmations {
        tx_index: usize,
        have: usize,
        need: usize,
    },
    #[error("Transfer failed for transaction {tx_index}: {reason}")]
    TransferFailed { tx_index: usize, reason: String },
}
