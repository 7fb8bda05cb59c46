//! Error types for the Coffer ledgers.
use thiserror::Error;

use crate::types::{Address, Amount, Timestamp};

/// Failure reported by the fund-transfer capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer of {amount} to {to} rejected: {reason}")]
    Rejected { to: Address, amount: Amount, reason: String },
    #[error("transfer total overflows")]
    Overflow,
}

/// Rejection of a ledger operation.
///
/// Every variant means the operation had no effect on ledger state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("release time {requested} is not after current time {now}")]
    InvalidReleaseTime { requested: Timestamp, now: Timestamp },
    #[error("deposit of {value} is below the minimum of {minimum}")]
    BelowMinimumDeposit { value: Amount, minimum: Amount },
    #[error("deposit carries no value")]
    NoValue,
    #[error("account already holds a deposit")]
    AlreadyDeposited,
    #[error("account has no balance")]
    NoBalance,
    #[error("too early: now {now}, release time {release_time}")]
    TooEarly { now: Timestamp, release_time: Timestamp },
    #[error("early withdrawal not agreed: now {now}, release time {release_time}")]
    EarlyWithdrawalNotAgreed { now: Timestamp, release_time: Timestamp },
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("transfer failure: {0}")]
    Transfer(#[from] TransferError),
}
