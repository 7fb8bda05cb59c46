//! Shared test helpers.

use std::sync::Arc;

use coffer_core::clock::FixedClock;
use coffer_core::transfer::MemoryTransfer;
use coffer_core::types::{Address, Timestamp};
use coffer_ledger::{PenaltyBoxLedger, PooledFeeLedger, TimeLockLedger};

/// Start time for every test clock.
pub const GENESIS: Timestamp = 1_700_000_000;

/// One ether in wei, the unit the reference scenarios are written in.
pub const ETHER: u64 = 1_000_000_000_000_000_000;

pub type TestClock = Arc<FixedClock>;

/// Deterministic identity for a label.
pub fn addr(label: &str) -> Address {
    Address::from_label(label)
}

pub fn owner() -> Address {
    addr("owner")
}

pub fn clock() -> TestClock {
    Arc::new(FixedClock::new(GENESIS))
}

pub fn time_lock() -> (TimeLockLedger<TestClock, MemoryTransfer>, TestClock) {
    let clock = clock();
    (TimeLockLedger::new(owner(), Arc::clone(&clock), MemoryTransfer::new()), clock)
}

pub fn penalty_box() -> (PenaltyBoxLedger<TestClock, MemoryTransfer>, TestClock) {
    let clock = clock();
    (PenaltyBoxLedger::new(owner(), Arc::clone(&clock), MemoryTransfer::new()), clock)
}

pub fn pooled_fee() -> PooledFeeLedger<MemoryTransfer> {
    PooledFeeLedger::new(owner(), MemoryTransfer::new())
}
