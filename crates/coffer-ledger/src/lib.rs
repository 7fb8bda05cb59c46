//! # coffer-ledger — custody ledger variants.
//!
//! Three ledgers share the account, clock and transfer abstractions from
//! `coffer-core` and differ in how value is deducted:
//! - [`TimeLockLedger`]: a flat fee to the owner on every deposit, full
//!   release after the account's release time.
//! - [`PenaltyBoxLedger`]: no deposit fee; an early exit the depositor
//!   explicitly agrees to costs a penalty paid to the owner.
//! - [`PooledFeeLedger`]: single-shot deposits into a shared pool; each
//!   withdrawal fee is spread over the remaining depositors through a
//!   per-account fee offset.
//!
//! Every operation validates its preconditions and computes the resulting
//! account and counters before any value moves. The payouts are settled as
//! one batch and state is committed only if settlement succeeds.

pub mod config;
pub mod error;
pub mod penalty_box;
pub mod policy;
pub mod pooled_fee;
pub mod time_lock;

pub use config::LedgerConfig;
pub use error::ConfigError;
pub use penalty_box::PenaltyBoxLedger;
pub use policy::{PenaltyBoxPolicy, PooledFeePolicy, TimeLockPolicy};
pub use pooled_fee::PooledFeeLedger;
pub use time_lock::TimeLockLedger;

use coffer_core::error::LedgerError;
use coffer_core::types::Timestamp;

/// Reject a release time that is not strictly after `now`.
pub(crate) fn require_future(requested: Timestamp, now: Timestamp) -> Result<(), LedgerError> {
    if requested <= now {
        return Err(LedgerError::InvalidReleaseTime { requested, now });
    }
    Ok(())
}
