//! Multisig-Ledger: an M-of-N multi-signature custody wallet in Rust
//!
//! This crate provides:
//! - A wallet ledger owned by a fixed set of owners with a fixed threshold
//! - Transaction proposal, confirmation, revocation and execution
//! - Execution gated on quorum, with rollback when the transfer fails
//! - Synchronous event observers
//! - An in-memory treasury implementing the value-transfer primitive
//! - JSON wallet configuration and scripted CLI runs
//!
//! # Example
//!
//! ```rust
//! use multisig_ledger::{Identity, LedgerError, Treasury, WalletLedger};
//!
//! let owners: Vec<Identity> = (1..=3u8).map(|b| Identity::from_bytes([b; 20])).collect();
//! let recipient = Identity::from_bytes([9; 20]);
//!
//! let ledger = WalletLedger::new(owners.clone(), 2).unwrap();
//! let mut treasury = Treasury::new(ledger.address());
//!
//! let tx = ledger.propose(&owners[0], recipient, 0, vec![0x14]).unwrap();
//! ledger.confirm(&owners[0], tx).unwrap();
//! ledger.confirm(&owners[1], tx).unwrap();
//! ledger.execute(&owners[0], tx, &mut treasury).unwrap();
//!
//! assert_eq!(
//!     ledger.execute(&owners[0], tx, &mut treasury),
//!     Err(LedgerError::AlreadyExecuted(tx))
//! );
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod identity;
pub mod ledger;
pub mod transfer;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig};
pub use identity::{Identity, IdentityError};
pub use ledger::{
    EventLog, LedgerError, LedgerEvent, LedgerObserver, LogObserver, Transaction, WalletLedger,
};
pub use transfer::{TransferError, Treasury, ValueTransfer};
