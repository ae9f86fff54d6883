//! In-memory treasury
//!
//! Holds balances by identity and pays out from a single funding account,
//! normally the wallet's own address.

use crate::encoding::hex_bytes;
use crate::identity::Identity;
use crate::transfer::{TransferError, ValueTransfer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A completed payout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRecord {
    pub to: Identity,
    pub amount: u128,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Balance book that implements [`ValueTransfer`]
#[derive(Clone, Debug)]
pub struct Treasury {
    /// Account that payouts are drawn from
    account: Identity,
    balances: HashMap<Identity, u128>,
    /// Recipients that refuse incoming transfers
    rejected: HashSet<Identity>,
    history: Vec<TransferRecord>,
}

impl Treasury {
    /// Create an empty treasury paying out from `account`
    pub fn new(account: Identity) -> Self {
        Self {
            account,
            balances: HashMap::new(),
            rejected: HashSet::new(),
            history: Vec::new(),
        }
    }

    /// The funding account
    pub fn account(&self) -> Identity {
        self.account
    }

    /// Credit the funding account
    pub fn deposit(&mut self, amount: u128) -> Result<u128, TransferError> {
        let account = self.account;
        let balance = self.credit(&account, amount)?;
        log::info!("Deposit of {} into {}, balance {}", amount, account, balance);
        Ok(balance)
    }

    /// Balance of any identity
    pub fn balance_of(&self, who: &Identity) -> u128 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Balance of the funding account
    pub fn balance(&self) -> u128 {
        self.balance_of(&self.account)
    }

    /// Make every future transfer to `target` fail
    pub fn reject_target(&mut self, target: Identity) {
        self.rejected.insert(target);
    }

    /// Accept transfers to `target` again
    pub fn accept_target(&mut self, target: &Identity) {
        self.rejected.remove(target);
    }

    /// Completed payouts, oldest first
    pub fn history(&self) -> &[TransferRecord] {
        &self.history
    }

    fn credit(&mut self, who: &Identity, amount: u128) -> Result<u128, TransferError> {
        let entry = self.balances.entry(*who).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*who))?;
        Ok(*entry)
    }
}

impl ValueTransfer for Treasury {
    fn send_value(
        &mut self,
        target: &Identity,
        value: u128,
        payload: &[u8],
    ) -> Result<(), TransferError> {
        if self.rejected.contains(target) {
            return Err(TransferError::Rejected(*target));
        }

        let have = self.balance();
        if have < value {
            return Err(TransferError::InsufficientFunds { have, need: value });
        }

        // Check the credit side before touching either balance
        if *target != self.account && self.balance_of(target).checked_add(value).is_none() {
            return Err(TransferError::Overflow(*target));
        }

        self.balances.insert(self.account, have - value);
        self.credit(target, value)?;

        self.history.push(TransferRecord {
            to: *target,
            amount: value,
            payload: payload.to_vec(),
            timestamp: Utc::now(),
        });

        log::debug!("Sent {} from {} to {}", value, self.account, target);
        Ok(())
    }
}
