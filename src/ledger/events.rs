//! Ledger observations
//!
//! Events are delivered synchronously to every subscribed observer after
//! the state change that produced them has committed.

use crate::encoding::hex_bytes;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A committed ledger state change
///
/// JSON form is keyed by event name, e.g. `{"confirmed": {...}}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Proposed {
        tx_index: usize,
        proposer: Identity,
        target: Identity,
        value: u128,
        #[serde(with = "hex_bytes")]
        payload: Vec<u8>,
    },
    Confirmed {
        tx_index: usize,
        owner: Identity,
    },
    Revoked {
        tx_index: usize,
        owner: Identity,
    },
    Executed {
        tx_index: usize,
        executor: Identity,
    },
}

impl LedgerEvent {
    /// Index of the transaction this event concerns
    pub fn tx_index(&self) -> usize {
        match self {
            LedgerEvent::Proposed { tx_index, .. }
            | LedgerEvent::Confirmed { tx_index, .. }
            | LedgerEvent::Revoked { tx_index, .. }
            | LedgerEvent::Executed { tx_index, .. } => *tx_index,
        }
    }

    /// The identity that triggered the event
    pub fn actor(&self) -> Identity {
        match self {
            LedgerEvent::Proposed { proposer, .. } => *proposer,
            LedgerEvent::Confirmed { owner, .. } | LedgerEvent::Revoked { owner, .. } => *owner,
            LedgerEvent::Executed { executor, .. } => *executor,
        }
    }

    /// Short event name, e.g. for console output
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Proposed { .. } => "proposed",
            LedgerEvent::Confirmed { .. } => "confirmed",
            LedgerEvent::Revoked { .. } => "revoked",
            LedgerEvent::Executed { .. } => "executed",
        }
    }
}

/// Receiver of ledger events
///
/// Observers may call back into the ledger; no internal state is borrowed
/// while they run.
pub trait LedgerObserver {
    fn notify(&self, event: &LedgerEvent);
}

/// An event together with the time it was observed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: LedgerEvent,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory event recorder. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    records: Rc<RefCell<Vec<EventRecord>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.records
            .borrow()
            .iter()
            .map(|r| r.event.clone())
            .collect()
    }

    /// Records recorded so far, oldest first
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Remove and return all recorded events
    pub fn drain(&self) -> Vec<LedgerEvent> {
        self.records
            .borrow_mut()
            .drain(..)
            .map(|r| r.event)
            .collect()
    }
}

impl LedgerObserver for EventLog {
    fn notify(&self, event: &LedgerEvent) {
        self.records.borrow_mut().push(EventRecord {
            event: event.clone(),
            recorded_at: Utc::now(),
        });
    }
}

/// Writes every event through the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl LedgerObserver for LogObserver {
    fn notify(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Proposed {
                tx_index,
                proposer,
                target,
                value,
                payload,
            } => log::info!(
                "Transaction {} proposed by {}: {} to {} ({} payload bytes)",
                tx_index,
                proposer,
                value,
                target,
                payload.len()
            ),
            LedgerEvent::Confirmed { tx_index, owner } => {
                log::info!("Transaction {} confirmed by {}", tx_index, owner)
            }
            LedgerEvent::Revoked { tx_index, owner } => {
                log::info!("Transaction {} confirmation revoked by {}", tx_index, owner)
            }
            LedgerEvent::Executed { tx_index, executor } => {
                log::info!("Transaction {} executed by {}", tx_index, executor)
            }
        }
    }
}
