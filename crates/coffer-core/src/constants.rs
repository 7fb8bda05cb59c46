//! Reference policy constants. All monetary values are in the smallest value unit.

/// Denominator for basis-point rates (10_000 bps = 100%).
pub const BPS_PRECISION: u64 = 10_000;

/// Time-lock deposit fee: 50 bps (0.5%), sent to the owner on every deposit.
pub const TIME_LOCK_FEE_BPS: u64 = 50;

/// Smallest deposit a time-lock ledger accepts.
pub const TIME_LOCK_MIN_DEPOSIT: u64 = 200;

/// Penalty-box early exit penalty: 1_000 bps (10%), sent to the owner.
pub const PENALTY_BOX_PENALTY_BPS: u64 = 1_000;

/// Smallest deposit a penalty-box ledger accepts.
pub const PENALTY_BOX_MIN_DEPOSIT: u64 = 10;

/// Pooled-fee withdrawal fee: 1_000 bps (10%), retained for remaining depositors.
pub const POOLED_WITHDRAW_FEE_BPS: u64 = 1_000;
