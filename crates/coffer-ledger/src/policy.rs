//! Fee and penalty policies for each ledger variant.
//!
//! `Default` gives the reference policy. Rates are in basis points.

use serde::{Deserialize, Serialize};

use coffer_core::constants::{
    BPS_PRECISION, PENALTY_BOX_MIN_DEPOSIT, PENALTY_BOX_PENALTY_BPS, POOLED_WITHDRAW_FEE_BPS,
    TIME_LOCK_FEE_BPS, TIME_LOCK_MIN_DEPOSIT,
};
use coffer_core::types::Amount;

use crate::error::ConfigError;

fn check_bps(name: &'static str, bps: u64) -> Result<(), ConfigError> {
    if bps > BPS_PRECISION {
        return Err(ConfigError::InvalidRate { name, bps });
    }
    Ok(())
}

/// Time-lock policy: a fee on every deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeLockPolicy {
    /// Deposit fee sent to the owner.
    pub fee_bps: u64,
    /// Smallest accepted deposit.
    pub min_deposit: Amount,
}

impl Default for TimeLockPolicy {
    fn default() -> Self {
        Self {
            fee_bps: TIME_LOCK_FEE_BPS,
            min_deposit: TIME_LOCK_MIN_DEPOSIT,
        }
    }
}

impl TimeLockPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bps("time_lock.fee_bps", self.fee_bps)
    }
}

/// Penalty-box policy: a penalty only on agreed early exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyBoxPolicy {
    /// Early exit penalty sent to the owner.
    pub penalty_bps: u64,
    /// Smallest accepted deposit.
    pub min_deposit: Amount,
}

impl Default for PenaltyBoxPolicy {
    fn default() -> Self {
        Self {
            penalty_bps: PENALTY_BOX_PENALTY_BPS,
            min_deposit: PENALTY_BOX_MIN_DEPOSIT,
        }
    }
}

impl PenaltyBoxPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bps("penalty_box.penalty_bps", self.penalty_bps)
    }
}

/// Pooled-fee policy: a fee on every withdrawal but the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PooledFeePolicy {
    /// Withdrawal fee retained in the pool for the remaining depositors.
    pub withdraw_fee_bps: u64,
}

impl Default for PooledFeePolicy {
    fn default() -> Self {
        Self {
            withdraw_fee_bps: POOLED_WITHDRAW_FEE_BPS,
        }
    }
}

impl PooledFeePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bps("pooled_fee.withdraw_fee_bps", self.withdraw_fee_bps)
    }
}
