//! Per-ledger account storage.
//!
//! An [`AccountStore`] is owned by exactly one ledger and mutated only by
//! that ledger's operations. Absent depositors read back as the zero record,
//! and writing a zero-balance record removes the entry, so "never deposited"
//! and "fully withdrawn" are indistinguishable.

use std::collections::HashMap;

use crate::types::{AccountRecord, Address, Amount};

/// Depositor → account mapping.
#[derive(Debug, Clone)]
pub struct AccountStore<R> {
    accounts: HashMap<Address, R>,
}

impl<R> Default for AccountStore<R> {
    fn default() -> Self {
        Self { accounts: HashMap::new() }
    }
}

impl<R: AccountRecord> AccountStore<R> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the depositor's record, or the zero record if absent.
    pub fn get(&self, depositor: &Address) -> R {
        self.accounts.get(depositor).cloned().unwrap_or_default()
    }

    /// Whether the depositor currently holds a non-zero balance.
    pub fn is_active(&self, depositor: &Address) -> bool {
        self.accounts.get(depositor).is_some_and(AccountRecord::is_active)
    }

    /// Store `record` for `depositor`. A zero-balance record removes the entry.
    pub fn put(&mut self, depositor: Address, record: R) {
        if record.is_active() {
            self.accounts.insert(depositor, record);
        } else {
            self.accounts.remove(&depositor);
        }
    }

    /// Reset the depositor to the zero record, returning what was stored.
    pub fn remove(&mut self, depositor: &Address) -> Option<R> {
        self.accounts.remove(depositor)
    }

    /// Number of depositors with a live balance.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all live balances.
    pub fn total_balance(&self) -> u128 {
        self.accounts.values().map(|r| r.balance() as u128).sum()
    }

    /// Iterate over live accounts in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &R)> {
        self.accounts.iter()
    }

    /// Balance of a depositor, zero if absent.
    pub fn balance_of(&self, depositor: &Address) -> Amount {
        self.accounts.get(depositor).map_or(0, AccountRecord::balance)
    }
}
