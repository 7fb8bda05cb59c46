//! Capabilities composed into each ledger variant.
//!
//! - [`Ownable`]: a single, immutable fee/penalty recipient
//! - [`TimeGated`]: per-account release times checked against a clock

use crate::types::{Address, Timestamp};

/// A ledger with a single owner entitled to deducted fees or penalties.
///
/// The owner is fixed at construction.
pub trait Ownable {
    fn owner(&self) -> &Address;

    /// Whether `addr` is the owner.
    fn is_owner(&self, addr: &Address) -> bool {
        self.owner() == addr
    }
}

/// A ledger whose accounts carry a release time.
pub trait TimeGated {
    /// Current time according to the ledger's clock.
    fn now(&self) -> Timestamp;

    /// Stored release time for `depositor`, or `None` if it holds no balance.
    fn release_time(&self, depositor: &Address) -> Option<Timestamp>;

    /// Whether `depositor` may withdraw unconditionally right now.
    ///
    /// Default implementation: an active account whose release time is not
    /// after [`now`](Self::now).
    fn is_released(&self, depositor: &Address) -> bool {
        self.release_time(depositor).is_some_and(|t| self.now() >= t)
    }
}
