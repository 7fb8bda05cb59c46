//! Fund-transfer capability.
//!
//! Ledgers never move value themselves. Each operation builds the list of
//! [`Payout`]s it needs and hands them to [`FundTransfer::settle`] as one
//! batch; ledger state is only committed once the batch succeeds.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::TransferError;
use crate::types::{Address, Amount, Payout};

/// Delivers value out of a ledger.
pub trait FundTransfer: Send {
    /// Move `amount` to `to`.
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Deliver every payout of one ledger operation.
    ///
    /// Zero-amount payouts are skipped. The default implementation transfers
    /// in order and stops at the first failure; implementations whose
    /// transfers can fail part-way through must override this so that a
    /// failed batch delivers nothing.
    fn settle(&mut self, payouts: &[Payout]) -> Result<(), TransferError> {
        for payout in payouts.iter().filter(|p| p.amount > 0) {
            self.transfer(&payout.to, payout.amount)?;
        }
        Ok(())
    }
}

/// In-memory settlement that records the total received per address.
///
/// Recipients can be marked as failing to simulate a payee that refuses
/// value. `settle` checks the whole batch before crediting anyone.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransfer {
    received: HashMap<Address, Amount>,
    failing: HashSet<Address>,
    transfers: usize,
}

impl MemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value delivered to `addr` so far.
    pub fn received(&self, addr: &Address) -> Amount {
        self.received.get(addr).copied().unwrap_or(0)
    }

    /// Total value delivered to all recipients.
    pub fn total_paid(&self) -> u128 {
        self.received.values().map(|&v| v as u128).sum()
    }

    /// Number of non-zero transfers delivered.
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }

    /// Make every future transfer to `addr` fail.
    pub fn fail_transfers_to(&mut self, addr: Address) {
        self.failing.insert(addr);
    }

    /// Undo [`fail_transfers_to`](Self::fail_transfers_to).
    pub fn restore_transfers_to(&mut self, addr: &Address) {
        self.failing.remove(addr);
    }

    fn check(&self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        if self.failing.contains(to) {
            return Err(TransferError::Rejected {
                to: *to,
                amount,
                reason: "recipient refuses transfers".to_string(),
            });
        }
        self.received(to).checked_add(amount).ok_or(TransferError::Overflow)?;
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: Amount) {
        *self.received.entry(*to).or_insert(0) += amount;
        self.transfers += 1;
        debug!(%to, amount, "transfer: delivered");
    }
}

impl FundTransfer for MemoryTransfer {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        self.check(to, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    fn settle(&mut self, payouts: &[Payout]) -> Result<(), TransferError> {
        let mut pending: HashMap<Address, Amount> = HashMap::new();
        for payout in payouts.iter().filter(|p| p.amount > 0) {
            let slot = pending.entry(payout.to).or_insert(0);
            *slot = slot.checked_add(payout.amount).ok_or(TransferError::Overflow)?;
            self.check(&payout.to, *slot)?;
        }
        for payout in payouts.iter().filter(|p| p.amount > 0) {
            self.credit(&payout.to, payout.amount);
        }
        Ok(())
    }
}
