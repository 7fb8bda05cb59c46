//! Checked integer arithmetic for fee and share computation.
//!
//! All products go through u128 intermediates and truncate toward zero,
//! so results never depend on evaluation order or platform width.

use crate::constants::BPS_PRECISION;
use crate::error::LedgerError;
use crate::types::Amount;

/// `value * numerator / denominator`, truncated.
///
/// Returns 0 when `denominator` is 0. Fails with
/// [`LedgerError::ArithmeticOverflow`] if the result does not fit in `u64`.
pub fn mul_div(value: Amount, numerator: u64, denominator: u64) -> Result<Amount, LedgerError> {
    if denominator == 0 {
        return Ok(0);
    }
    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    u64::try_from(product / denominator as u128).map_err(|_| LedgerError::ArithmeticOverflow)
}

/// Portion of `value` at a basis-point rate, truncated (`value * bps / 10_000`).
pub fn bps_of(value: Amount, bps: u64) -> Result<Amount, LedgerError> {
    mul_div(value, bps, BPS_PRECISION)
}
