//! Scripted ledger sessions
//!
//! A scenario is a JSON list of operations applied in order to one ledger
//! and its treasury. A rejected operation is recorded and the run goes on.
//! Each operation is keyed by its name:
//!
//! ```json
//! {"operations": [
//!   {"deposit": {"amount": 100}},
//!   {"confirm": {"caller": "0x…", "tx": 0}}
//! ]}
//! ```

use crate::encoding::hex_bytes;
use crate::identity::Identity;
use crate::ledger::{LedgerError, WalletLedger};
use crate::transfer::{TransferError, Treasury};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One scripted call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Fund the wallet account
    Deposit { amount: u128 },
    Propose {
        caller: Identity,
        target: Identity,
        #[serde(default)]
        value: u128,
        #[serde(default, with = "hex_bytes")]
        payload: Vec<u8>,
    },
    Confirm { caller: Identity, tx: usize },
    Revoke { caller: Identity, tx: usize },
    Execute { caller: Identity, tx: usize },
    /// Make transfers to `target` fail
    Reject { target: Identity },
    /// Let transfers to `target` succeed again
    Accept { target: Identity },
}

/// A list of operations
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    pub operations: Vec<Operation>,
}

/// Why a scripted step was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Result of one step
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Zero-based position in the scenario
    pub step: usize,
    pub operation: Operation,
    /// Short success summary, or the rejection
    pub result: Result<String, StepError>,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self, crate::config::ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Apply every operation in order
    pub fn run(&self, ledger: &WalletLedger, treasury: &mut Treasury) -> Vec<StepOutcome> {
        self.operations
            .iter()
            .enumerate()
            .map(|(step, operation)| {
                let result = apply(ledger, treasury, operation);
                if let Err(e) = &result {
                    log::debug!("Step {} rejected: {}", step, e);
                }
                StepOutcome {
                    step,
                    operation: operation.clone(),
                    result,
                }
            })
            .collect()
    }
}

fn apply(
    ledger: &WalletLedger,
    treasury: &mut Treasury,
    operation: &Operation,
) -> Result<String, StepError> {
    match operation {
        Operation::Deposit { amount } => {
            let balance = treasury.deposit(*amount)?;
            Ok(format!("balance {}", balance))
        }
        Operation::Propose {
            caller,
            target,
            value,
            payload,
        } => {
            let tx = ledger.propose(caller, *target, *value, payload.clone())?;
            Ok(format!("tx {}", tx))
        }
        Operation::Confirm { caller, tx } => {
            ledger.confirm(caller, *tx)?;
            let count = ledger.get_transaction(*tx)?.confirmation_count;
            Ok(format!(
                "{}/{} confirmations",
                count,
                ledger.required_confirmations()
            ))
        }
        Operation::Revoke { caller, tx } => {
            ledger.revoke(caller, *tx)?;
            let count = ledger.get_transaction(*tx)?.confirmation_count;
            Ok(format!(
                "{}/{} confirmations",
                count,
                ledger.required_confirmations()
            ))
        }
        Operation::Execute { caller, tx } => {
            ledger.execute(caller, *tx, treasury)?;
            Ok(format!("executed, balance {}", treasury.balance()))
        }
        Operation::Reject { target } => {
            treasury.reject_target(*target);
            Ok(format!("rejecting {}", target))
        }
        Operation::Accept { target } => {
            treasury.accept_target(target);
            Ok(format!("accepting {}", target))
        }
    }
}
