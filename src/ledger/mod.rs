//! Multi-signature wallet ledger
//!
//! A fixed set of owners shares one account. Any transfer must be
//! proposed, confirmed by a quorum of owners, and then executed. Owners
//! may revoke their confirmation until the transfer executes.
//!
//! # Example
//!
//! ```rust
//! use multisig_ledger::identity::Identity;
//! use multisig_ledger::ledger::{EventLog, WalletLedger};
//! use multisig_ledger::transfer::Treasury;
//!
//! let alice = Identity::from_bytes([1; 20]);
//! let bob = Identity::from_bytes([2; 20]);
//! let carol = Identity::from_bytes([3; 20]);
//! let shop = Identity::from_bytes([9; 20]);
//!
//! // 2-of-3 wallet
//! let ledger = WalletLedger::new(vec![alice, bob, carol], 2).unwrap();
//! let events = EventLog::new();
//! ledger.subscribe(events.clone());
//!
//! let mut treasury = Treasury::new(ledger.address());
//! treasury.deposit(100).unwrap();
//!
//! let tx = ledger.propose(&alice, shop, 25, vec![]).unwrap();
//! ledger.confirm(&alice, tx).unwrap();
//! ledger.confirm(&bob, tx).unwrap();
//! ledger.execute(&carol, tx, &mut treasury).unwrap();
//!
//! assert!(ledger.get_transaction(tx).unwrap().executed);
//! assert_eq!(treasury.balance_of(&shop), 25);
//! assert_eq!(events.len(), 4);
//! ```

pub mod error;
pub mod events;
pub mod transaction;
pub mod wallet;

pub use error::LedgerError;
pub use events::{EventLog, EventRecord, LedgerEvent, LedgerObserver, LogObserver};
pub use transaction::Transaction;
pub use wallet::WalletLedger;
