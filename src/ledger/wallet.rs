//! The wallet ledger
//!
//! Owns the owner set, the threshold, the append-only transaction list and
//! the confirmation matrix. All mutation goes through [`propose`],
//! [`confirm`], [`revoke`] and [`execute`].
//!
//! Operations take `&self`: state lives behind a `RefCell` and no borrow is
//! held while the send primitive or an observer runs, so either may call
//! back into the same ledger.
//!
//! [`propose`]: WalletLedger::propose
//! [`confirm`]: WalletLedger::confirm
//! [`revoke`]: WalletLedger::revoke
//! [`execute`]: WalletLedger::execute

use crate::config::LedgerConfig;
use crate::crypto::hash160;
use crate::identity::Identity;
use crate::ledger::error::LedgerError;
use crate::ledger::events::{LedgerEvent, LedgerObserver};
use crate::ledger::transaction::{Transaction, TransactionRecord};
use crate::transfer::ValueTransfer;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An M-of-N multi-signature wallet ledger
pub struct WalletLedger {
    /// Owners in position order
    owners: Vec<Identity>,
    /// Owner identity to position in `owners`
    positions: HashMap<Identity, usize>,
    required_confirmations: usize,
    /// Deterministic wallet identity
    address: Identity,
    transactions: RefCell<Vec<TransactionRecord>>,
    observers: RefCell<Vec<Rc<dyn LedgerObserver>>>,
}

impl WalletLedger {
    /// Create a ledger for `owners` requiring `required_confirmations`
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the owner set is empty, contains a
    /// duplicate or the null identity, or if the threshold is 0 or exceeds
    /// the owner count.
    pub fn new(owners: Vec<Identity>, required_confirmations: usize) -> Result<Self, LedgerError> {
        if owners.is_empty() {
            return Err(LedgerError::InvalidConfiguration(
                "owner set must not be empty".to_string(),
            ));
        }

        if required_confirmations == 0 {
            return Err(LedgerError::InvalidConfiguration(
                "threshold must be at least 1".to_string(),
            ));
        }

        if required_confirmations > owners.len() {
            return Err(LedgerError::InvalidConfiguration(format!(
                "threshold {} exceeds owner count {}",
                required_confirmations,
                owners.len()
            )));
        }

        let mut positions = HashMap::with_capacity(owners.len());
        for (position, owner) in owners.iter().enumerate() {
            if owner.is_zero() {
                return Err(LedgerError::InvalidConfiguration(
                    "null identity cannot be an owner".to_string(),
                ));
            }
            if positions.insert(*owner, position).is_some() {
                return Err(LedgerError::InvalidConfiguration(format!(
                    "duplicate owner {}",
                    owner
                )));
            }
        }

        let address = Self::derive_address(&owners, required_confirmations)?;

        log::info!(
            "Wallet {} created ({}-of-{})",
            address,
            required_confirmations,
            owners.len()
        );

        Ok(Self {
            owners,
            positions,
            required_confirmations,
            address,
            transactions: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
        })
    }

    /// Create a ledger from a loaded configuration
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Self::new(config.owners.clone(), config.required_confirmations)
    }

    /// Wallet identity = HASH160(threshold || sorted owners)
    fn derive_address(
        owners: &[Identity],
        required_confirmations: usize,
    ) -> Result<Identity, LedgerError> {
        let threshold = u64::try_from(required_confirmations).map_err(|_| {
            LedgerError::InvalidConfiguration(format!(
                "threshold {} does not fit in 64 bits",
                required_confirmations
            ))
        })?;

        let mut sorted_owners = owners.to_vec();
        sorted_owners.sort();

        let mut data = threshold.to_le_bytes().to_vec();
        for owner in &sorted_owners {
            data.extend_from_slice(owner.as_bytes());
        }

        Ok(Identity::from_bytes(hash160(&data)))
    }

    /// Register an observer for all future events
    pub fn subscribe<O: LedgerObserver + 'static>(&self, observer: O) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn emit(&self, event: LedgerEvent) {
        // Snapshot the list so observers may subscribe or re-enter
        let observers: Vec<Rc<dyn LedgerObserver>> = self.observers.borrow().clone();
        for observer in observers {
            observer.notify(&event);
        }
    }

    fn authorize(&self, caller: &Identity) -> Result<usize, LedgerError> {
        self.positions
            .get(caller)
            .copied()
            .ok_or(LedgerError::Unauthorized(*caller))
    }

    /// Propose a transfer of `value` to `target` carrying `payload`
    ///
    /// Returns the new transaction's index.
    ///
    /// # Errors
    /// * `Unauthorized` - caller is not an owner
    pub fn propose(
        &self,
        caller: &Identity,
        target: Identity,
        value: u128,
        payload: Vec<u8>,
    ) -> Result<usize, LedgerError> {
        self.authorize(caller)?;

        let tx_index = {
            let mut transactions = self.transactions.borrow_mut();
            transactions.push(TransactionRecord::new(
                *caller,
                target,
                value,
                payload.clone(),
                self.owners.len(),
            ));
            transactions.len() - 1
        };

        self.emit(LedgerEvent::Proposed {
            tx_index,
            proposer: *caller,
            target,
            value,
            payload,
        });

        Ok(tx_index)
    }

    /// Record the caller's confirmation of a pending transaction
    ///
    /// # Errors
    /// Checked in order: `TransactionNotFound`, `Unauthorized`,
    /// `AlreadyExecuted`, `AlreadyConfirmed`.
    pub fn confirm(&self, caller: &Identity, tx_index: usize) -> Result<(), LedgerError> {
        {
            let mut transactions = self.transactions.borrow_mut();
            let tx = transactions
                .get_mut(tx_index)
                .ok_or(LedgerError::TransactionNotFound(tx_index))?;
            let position = self.authorize(caller)?;

            if tx.executed {
                return Err(LedgerError::AlreadyExecuted(tx_index));
            }
            if tx.is_confirmed_by(position) {
                return Err(LedgerError::AlreadyConfirmed {
                    tx_index,
                    owner: *caller,
                });
            }

            tx.set_confirmed(position);
        }

        self.emit(LedgerEvent::Confirmed {
            tx_index,
            owner: *caller,
        });
        Ok(())
    }

    /// Withdraw the caller's confirmation of a pending transaction
    ///
    /// # Errors
    /// Checked in order: `TransactionNotFound`, `Unauthorized`,
    /// `AlreadyExecuted`, `NotConfirmed`.
    pub fn revoke(&self, caller: &Identity, tx_index: usize) -> Result<(), LedgerError> {
        {
            let mut transactions = self.transactions.borrow_mut();
            let tx = transactions
                .get_mut(tx_index)
                .ok_or(LedgerError::TransactionNotFound(tx_index))?;
            let position = self.authorize(caller)?;

            if tx.executed {
                return Err(LedgerError::AlreadyExecuted(tx_index));
            }
            if !tx.is_confirmed_by(position) {
                return Err(LedgerError::NotConfirmed {
                    tx_index,
                    owner: *caller,
                });
            }

            tx.clear_confirmed(position);
        }

        self.emit(LedgerEvent::Revoked {
            tx_index,
            owner: *caller,
        });
        Ok(())
    }

    /// Execute a transaction that has reached quorum
    ///
    /// The transaction is marked executed before `transfer` is invoked, so
    /// any call the transfer makes back into this ledger sees it as
    /// executed. If the transfer fails the mark is cleared and the
    /// transaction can be executed again later.
    ///
    /// # Errors
    /// Checked in order: `TransactionNotFound`, `Unauthorized`,
    /// `AlreadyExecuted`, `InsufficientConfirmations`. A failed transfer
    /// returns `TransferFailed`.
    pub fn execute<T>(
        &self,
        caller: &Identity,
        tx_index: usize,
        transfer: &mut T,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        let (target, value, payload) = {
            let mut transactions = self.transactions.borrow_mut();
            let tx = transactions
                .get_mut(tx_index)
                .ok_or(LedgerError::TransactionNotFound(tx_index))?;
            self.authorize(caller)?;

            if tx.executed {
                return Err(LedgerError::AlreadyExecuted(tx_index));
            }
            if tx.confirmation_count < self.required_confirmations {
                return Err(LedgerError::InsufficientConfirmations {
                    tx_index,
                    have: tx.confirmation_count,
                    need: self.required_confirmations,
                });
            }

            tx.executed = true;
            (tx.target, tx.value, tx.payload.clone())
        };

        if let Err(e) = transfer.send_value(&target, value, &payload) {
            // Confirm/revoke/execute all reject an executed transaction, so
            // nothing else about it can have changed during the send.
            self.transactions.borrow_mut()[tx_index].executed = false;
            log::warn!("Transfer for transaction {} failed: {}", tx_index, e);
            return Err(LedgerError::TransferFailed {
                tx_index,
                reason: e.to_string(),
            });
        }

        self.emit(LedgerEvent::Executed {
            tx_index,
            executor: *caller,
        });
        Ok(())
    }

    /// The wallet's own identity
    pub fn address(&self) -> Identity {
        self.address
    }

    /// Number of owners
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Check if an identity is an owner
    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.positions.contains_key(identity)
    }

    /// Owners in position order
    pub fn owners(&self) -> &[Identity] {
        &self.owners
    }

    /// Confirmations needed to execute
    pub fn required_confirmations(&self) -> usize {
        self.required_confirmations
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.required_confirmations, self.owners.len())
    }

    /// Number of proposed transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.borrow().len()
    }

    /// Snapshot of a transaction
    pub fn get_transaction(&self, tx_index: usize) -> Result<Transaction, LedgerError> {
        self.transactions
            .borrow()
            .get(tx_index)
            .map(|tx| tx.snapshot(tx_index))
            .ok_or(LedgerError::TransactionNotFound(tx_index))
    }

    /// Snapshots of all transactions, in index order
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, tx)| tx.snapshot(index))
            .collect()
    }

    /// Whether `owner` currently confirms the transaction
    ///
    /// A non-owner never confirms anything.
    pub fn is_confirmed_by(&self, tx_index: usize, owner: &Identity) -> Result<bool, LedgerError> {
        let transactions = self.transactions.borrow();
        let tx = transactions
            .get(tx_index)
            .ok_or(LedgerError::TransactionNotFound(tx_index))?;

        Ok(self
            .positions
            .get(owner)
            .map_or(false, |&position| tx.is_confirmed_by(position)))
    }

    /// Owners currently confirming the transaction, in owner order
    pub fn confirmations(&self, tx_index: usize) -> Result<Vec<Identity>, LedgerError> {
        let transactions = self.transactions.borrow();
        let tx = transactions
            .get(tx_index)
            .ok_or(LedgerError::TransactionNotFound(tx_index))?;

        Ok(tx
            .confirmed_positions()
            .map(|position| self.owners[position])
            .collect())
    }

    /// Indices of transactions not yet executed
    pub fn pending_transactions(&self) -> Vec<usize> {
        self.transactions
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, tx)| !tx.executed)
            .map(|(index, _)| index)
            .collect()
    }
}

impl fmt::Debug for WalletLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletLedger")
            .field("address", &self.address)
            .field("owners", &self.owners)
            .field("required_confirmations", &self.required_confirmations)
            .field("transactions", &self.transaction_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::events::EventLog;
    use crate::transfer::{TransferError, Treasury};

    fn id(b: u8) -> Identity {
        Identity::from_bytes([b; 20])
    }

    // Owners A, B, C; D is an outsider; X is a recipient
    const A: u8 = 0xa1;
    const B: u8 = 0xb2;
    const C: u8 = 0xc3;
    const D: u8 = 0xd4;
    const X: u8 = 0xee;

    fn ledger() -> WalletLedger {
        WalletLedger::new(vec![id(A), id(B), id(C)], 2).unwrap()
    }

    fn funded_treasury(ledger: &WalletLedger, amount: u128) -> Treasury {
        let mut treasury = Treasury::new(ledger.address());
        treasury.deposit(amount).unwrap();
        treasury
    }

    fn always_ok(_: &Identity, _: u128, _: &[u8]) -> Result<(), TransferError> {
        Ok(())
    }

    fn always_fail(_: &Identity, _: u128, _: &[u8]) -> Result<(), TransferError> {
        Err(TransferError::Other("unreachable recipient".to_string()))
    }

    #[test]
    fn test_ledger_creation() {
        let ledger = ledger();

        assert_eq!(ledger.owner_count(), 3);
        assert_eq!(ledger.required_confirmations(), 2);
        assert_eq!(ledger.description(), "2-of-3");
        assert_eq!(ledger.transaction_count(), 0);
        assert!(ledger.is_owner(&id(A)));
        assert!(ledger.is_owner(&id(B)));
        assert!(ledger.is_owner(&id(C)));
        assert!(!ledger.is_owner(&id(D)));
        assert_eq!(ledger.owners(), &[id(A), id(B), id(C)]);
    }

    #[test]
    fn test_single_owner_ledger() {
        let ledger = WalletLedger::new(vec![id(A)], 1).unwrap();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.execute(&id(A), tx, &mut always_ok).unwrap();
        assert!(ledger.get_transaction(tx).unwrap().executed);
    }

    #[test]
    fn test_invalid_configuration() {
        let owners = vec![id(A), id(B), id(C)];

        let cases = vec![
            WalletLedger::new(vec![], 1),
            WalletLedger::new(vec![], 0),
            WalletLedger::new(owners.clone(), 0),
            WalletLedger::new(owners.clone(), 4),
            WalletLedger::new(vec![id(A), id(B), id(A)], 2),
            WalletLedger::new(vec![id(A), Identity::ZERO], 1),
        ];

        for result in cases {
            assert!(matches!(
                result,
                Err(LedgerError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_from_config() {
        let config = LedgerConfig::new(vec![id(A), id(B)], 2);
        let ledger = WalletLedger::from_config(&config).unwrap();
        assert_eq!(ledger.description(), config.description());

        let bad = LedgerConfig::new(vec![id(A), id(B)], 3);
        assert!(WalletLedger::from_config(&bad).is_err());
    }

    #[test]
    fn test_address_determinism() {
        let first = WalletLedger::new(vec![id(A), id(B), id(C)], 2).unwrap();
        let reordered = WalletLedger::new(vec![id(C), id(A), id(B)], 2).unwrap();
        let other_threshold = WalletLedger::new(vec![id(A), id(B), id(C)], 3).unwrap();

        assert_eq!(first.address(), reordered.address());
        assert_ne!(first.address(), other_threshold.address());
        assert!(!first.address().is_zero());
    }

    #[test]
    fn test_address_encodes_threshold_as_u64() {
        let ledger = WalletLedger::new(vec![id(C), id(A)], 2).unwrap();

        let mut data = 2u64.to_le_bytes().to_vec();
        data.extend_from_slice(id(A).as_bytes());
        data.extend_from_slice(id(C).as_bytes());

        assert_eq!(ledger.address(), Identity::from_bytes(hash160(&data)));
    }

    #[test]
    fn test_propose_assigns_sequential_indices() {
        let ledger = ledger();

        for expected in 0..5 {
            let index = ledger
                .propose(&id(A), id(X), expected as u128, vec![expected as u8])
                .unwrap();
            assert_eq!(index, expected);
        }
        assert_eq!(ledger.transaction_count(), 5);

        let tx = ledger.get_transaction(3).unwrap();
        assert_eq!(tx.index, 3);
        assert_eq!(tx.proposer, id(A));
        assert_eq!(tx.target, id(X));
        assert_eq!(tx.value, 3);
        assert_eq!(tx.payload, vec![3]);
        assert!(!tx.executed);
        assert_eq!(tx.confirmation_count, 0);
    }

    #[test]
    fn test_propose_requires_owner() {
        let ledger = ledger();
        assert_eq!(
            ledger.propose(&id(D), id(X), 1, vec![]),
            Err(LedgerError::Unauthorized(id(D)))
        );
        assert_eq!(ledger.transaction_count(), 0);
    }

    #[test]
    fn test_double_confirm_rejected() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();

        ledger.confirm(&id(A), tx).unwrap();
        assert_eq!(
            ledger.confirm(&id(A), tx),
            Err(LedgerError::AlreadyConfirmed {
                tx_index: tx,
                owner: id(A)
            })
        );
        assert_eq!(ledger.get_transaction(tx).unwrap().confirmation_count, 1);
    }

    #[test]
    fn test_confirm_then_revoke() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();

        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        ledger.revoke(&id(A), tx).unwrap();

        assert_eq!(ledger.get_transaction(tx).unwrap().confirmation_count, 1);
        assert!(!ledger.is_confirmed_by(tx, &id(A)).unwrap());
        assert!(ledger.is_confirmed_by(tx, &id(B)).unwrap());
        assert_eq!(ledger.confirmations(tx).unwrap(), vec![id(B)]);

        // Confirming again after a revoke is allowed
        ledger.confirm(&id(A), tx).unwrap();
        assert_eq!(ledger.confirmations(tx).unwrap(), vec![id(A), id(B)]);
    }

    #[test]
    fn test_revoke_without_confirmation() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();

        assert_eq!(
            ledger.revoke(&id(B), tx),
            Err(LedgerError::NotConfirmed {
                tx_index: tx,
                owner: id(B)
            })
        );
        assert_eq!(ledger.get_transaction(tx).unwrap().confirmation_count, 0);
    }

    #[test]
    fn test_missing_transaction() {
        let ledger = ledger();
        let mut treasury = funded_treasury(&ledger, 10);

        assert_eq!(ledger.confirm(&id(A), 0), Err(LedgerError::TransactionNotFound(0)));
        assert_eq!(ledger.revoke(&id(A), 0), Err(LedgerError::TransactionNotFound(0)));
        assert_eq!(
            ledger.execute(&id(A), 0, &mut treasury),
            Err(LedgerError::TransactionNotFound(0))
        );
        assert_eq!(ledger.get_transaction(0), Err(LedgerError::TransactionNotFound(0)));
        assert_eq!(
            ledger.is_confirmed_by(0, &id(A)),
            Err(LedgerError::TransactionNotFound(0))
        );
        assert_eq!(ledger.confirmations(0), Err(LedgerError::TransactionNotFound(0)));
    }

    #[test]
    fn test_not_found_checked_before_authorization() {
        let ledger = ledger();
        assert_eq!(ledger.confirm(&id(D), 7), Err(LedgerError::TransactionNotFound(7)));
        assert_eq!(ledger.revoke(&id(D), 7), Err(LedgerError::TransactionNotFound(7)));
        assert_eq!(
            ledger.execute(&id(D), 7, &mut always_ok),
            Err(LedgerError::TransactionNotFound(7))
        );
    }

    #[test]
    fn test_outsider_rejected() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        let before = ledger.get_transaction(tx).unwrap();

        assert_eq!(ledger.confirm(&id(D), tx), Err(LedgerError::Unauthorized(id(D))));
        assert_eq!(ledger.revoke(&id(D), tx), Err(LedgerError::Unauthorized(id(D))));
        assert_eq!(
            ledger.execute(&id(D), tx, &mut always_ok),
            Err(LedgerError::Unauthorized(id(D)))
        );

        assert_eq!(ledger.get_transaction(tx).unwrap(), before);
        assert!(!ledger.is_confirmed_by(tx, &id(D)).unwrap());
    }

    #[test]
    fn test_execute_scenario() {
        let ledger = ledger();
        let log = EventLog::new();
        ledger.subscribe(log.clone());
        let mut treasury = Treasury::new(ledger.address());

        let tx = ledger.propose(&id(A), id(X), 0, vec![0x14]).unwrap();
        assert_eq!(tx, 0);
        ledger.confirm(&id(A), 0).unwrap();
        ledger.confirm(&id(B), 0).unwrap();
        assert_eq!(ledger.get_transaction(0).unwrap().confirmation_count, 2);

        ledger.execute(&id(A), 0, &mut treasury).unwrap();
        assert!(ledger.get_transaction(0).unwrap().executed);
        assert_eq!(treasury.history().len(), 1);
        assert_eq!(treasury.history()[0].payload, vec![0x14]);

        assert_eq!(
            ledger.execute(&id(A), 0, &mut treasury),
            Err(LedgerError::AlreadyExecuted(0))
        );
        assert_eq!(treasury.history().len(), 1);

        let events = log.events();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[3],
            LedgerEvent::Executed {
                tx_index: 0,
                executor: id(A)
            }
        );
    }

    #[test]
    fn test_execute_below_quorum() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();

        assert_eq!(
            ledger.execute(&id(A), tx, &mut always_ok),
            Err(LedgerError::InsufficientConfirmations {
                tx_index: tx,
                have: 1,
                need: 2
            })
        );
        assert!(!ledger.get_transaction(tx).unwrap().executed);
    }

    #[test]
    fn test_revoke_drops_below_quorum() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        ledger.revoke(&id(B), tx).unwrap();

        assert!(matches!(
            ledger.execute(&id(C), tx, &mut always_ok),
            Err(LedgerError::InsufficientConfirmations { have: 1, .. })
        ));
    }

    #[test]
    fn test_executed_transaction_is_terminal() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        ledger.execute(&id(C), tx, &mut always_ok).unwrap();

        assert_eq!(ledger.confirm(&id(C), tx), Err(LedgerError::AlreadyExecuted(tx)));
        assert_eq!(ledger.revoke(&id(A), tx), Err(LedgerError::AlreadyExecuted(tx)));
        assert_eq!(
            ledger.execute(&id(B), tx, &mut always_ok),
            Err(LedgerError::AlreadyExecuted(tx))
        );

        let snapshot = ledger.get_transaction(tx).unwrap();
        assert!(snapshot.executed);
        assert_eq!(snapshot.confirmation_count, 2);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_failed_transfer_rolls_back() {
        let ledger = ledger();
        let log = EventLog::new();
        ledger.subscribe(log.clone());
        let mut treasury = Treasury::new(ledger.address());

        let tx = ledger.propose(&id(A), id(X), 40, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        log.drain();

        let err = ledger.execute(&id(A), tx, &mut treasury).unwrap_err();
        assert!(matches!(err, LedgerError::TransferFailed { tx_index: 0, .. }));
        assert!(!ledger.get_transaction(tx).unwrap().executed);
        assert_eq!(ledger.pending_transactions(), vec![tx]);
        assert!(log.is_empty());

        // Still pending: confirmations can change
        ledger.revoke(&id(B), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();

        treasury.deposit(40).unwrap();
        ledger.execute(&id(A), tx, &mut treasury).unwrap();
        assert!(ledger.get_transaction(tx).unwrap().executed);
        assert_eq!(treasury.balance_of(&id(X)), 40);
        assert_eq!(treasury.balance(), 0);
    }

    #[test]
    fn test_transfer_failure_reason() {
        let ledger = ledger();
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(C), tx).unwrap();

        assert_eq!(
            ledger.execute(&id(B), tx, &mut always_fail),
            Err(LedgerError::TransferFailed {
                tx_index: tx,
                reason: "Transfer failed: unreachable recipient".to_string()
            })
        );
    }

    #[test]
    fn test_transactions_are_independent() {
        let ledger = ledger();
        let first = ledger.propose(&id(A), id(X), 1, vec![]).unwrap();
        let second = ledger.propose(&id(B), id(X), 2, vec![]).unwrap();

        ledger.confirm(&id(A), first).unwrap();
        ledger.confirm(&id(B), first).unwrap();
        ledger.confirm(&id(C), second).unwrap();

        ledger.execute(&id(A), first, &mut always_ok).unwrap();

        assert_eq!(ledger.pending_transactions(), vec![second]);
        assert!(!ledger.is_confirmed_by(second, &id(A)).unwrap());
        assert_eq!(ledger.get_transaction(second).unwrap().confirmation_count, 1);

        let all = ledger.transactions();
        assert_eq!(all.len(), 2);
        assert!(all[0].executed);
        assert!(!all[1].executed);
    }

    #[test]
    fn test_event_sequence() {
        let ledger = ledger();
        let log = EventLog::new();
        ledger.subscribe(log.clone());

        let tx = ledger.propose(&id(B), id(X), 9, vec![1, 2]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.revoke(&id(A), tx).unwrap();
        // Rejected operations emit nothing
        let _ = ledger.revoke(&id(A), tx);
        let _ = ledger.confirm(&id(D), tx);

        assert_eq!(
            log.events(),
            vec![
                LedgerEvent::Proposed {
                    tx_index: tx,
                    proposer: id(B),
                    target: id(X),
                    value: 9,
                    payload: vec![1, 2],
                },
                LedgerEvent::Confirmed {
                    tx_index: tx,
                    owner: id(A)
                },
                LedgerEvent::Revoked {
                    tx_index: tx,
                    owner: id(A)
                },
            ]
        );
    }

    /// Send primitive that calls back into the ledger before completing
    struct ReentrantTransfer {
        ledger: Rc<WalletLedger>,
        tx_index: usize,
        fail: bool,
        observed: Vec<Result<(), LedgerError>>,
        executed_during_send: Option<bool>,
    }

    impl ValueTransfer for ReentrantTransfer {
        fn send_value(
            &mut self,
            _target: &Identity,
            _value: u128,
            _payload: &[u8],
        ) -> Result<(), TransferError> {
            let ledger = Rc::clone(&self.ledger);
            self.executed_during_send = ledger
                .get_transaction(self.tx_index)
                .ok()
                .map(|tx| tx.executed);

            self.observed.push(ledger.execute(&id(B), self.tx_index, &mut always_ok));
            self.observed.push(ledger.confirm(&id(C), self.tx_index));
            self.observed.push(ledger.revoke(&id(A), self.tx_index));

            if self.fail {
                Err(TransferError::Other("callee reverted".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn reentrant_setup(fail: bool) -> (Rc<WalletLedger>, ReentrantTransfer, EventLog) {
        let ledger = Rc::new(ledger());
        let log = EventLog::new();
        ledger.subscribe(log.clone());

        let tx = ledger.propose(&id(A), id(X), 5, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();
        log.drain();

        let transfer = ReentrantTransfer {
            ledger: Rc::clone(&ledger),
            tx_index: tx,
            fail,
            observed: Vec::new(),
            executed_during_send: None,
        };
        (ledger, transfer, log)
    }

    #[test]
    fn test_reentrant_calls_see_executed() {
        let (ledger, mut transfer, log) = reentrant_setup(false);

        ledger.execute(&id(A), 0, &mut transfer).unwrap();

        assert_eq!(transfer.executed_during_send, Some(true));
        assert_eq!(
            transfer.observed,
            vec![
                Err(LedgerError::AlreadyExecuted(0)),
                Err(LedgerError::AlreadyExecuted(0)),
                Err(LedgerError::AlreadyExecuted(0)),
            ]
        );

        let tx = ledger.get_transaction(0).unwrap();
        assert!(tx.executed);
        assert_eq!(tx.confirmation_count, 2);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_reentrant_calls_then_failed_send() {
        let (ledger, mut transfer, log) = reentrant_setup(true);

        assert!(matches!(
            ledger.execute(&id(A), 0, &mut transfer),
            Err(LedgerError::TransferFailed { tx_index: 0, .. })
        ));
        assert!(transfer
            .observed
            .iter()
            .all(|r| *r == Err(LedgerError::AlreadyExecuted(0))));

        let tx = ledger.get_transaction(0).unwrap();
        assert!(!tx.executed);
        assert_eq!(tx.confirmation_count, 2);
        assert!(ledger.is_confirmed_by(0, &id(A)).unwrap());
        assert!(!ledger.is_confirmed_by(0, &id(C)).unwrap());
        assert!(log.is_empty());

        // Retry with a well-behaved transfer
        ledger.execute(&id(C), 0, &mut always_ok).unwrap();
        assert!(ledger.get_transaction(0).unwrap().executed);
    }

    #[test]
    fn test_reentrant_propose_during_send() {
        let ledger = Rc::new(ledger());
        let tx = ledger.propose(&id(A), id(X), 0, vec![]).unwrap();
        ledger.confirm(&id(A), tx).unwrap();
        ledger.confirm(&id(B), tx).unwrap();

        let inner = Rc::clone(&ledger);
        let mut proposing = move |_: &Identity, _: u128, _: &[u8]| -> Result<(), TransferError> {
            inner
                .propose(&id(C), id(X), 1, vec![])
                .map(|_| ())
                .map_err(|e| TransferError::Other(e.to_string()))
        };

        ledger.execute(&id(A), tx, &mut proposing).unwrap();
        assert_eq!(ledger.transaction_count(), 2);
        assert_eq!(ledger.pending_transactions(), vec![1]);
    }
}
