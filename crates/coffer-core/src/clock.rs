//! Injectable time source.
//!
//! Ledgers never read wall time directly; they hold a [`Clock`]. Production
//! code uses [`SystemClock`], tests use [`FixedClock`], and
//! [`OverridableClock`] layers a settable override over any other clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Timestamp;

/// Supplies the current logical time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch system time reads as 0.
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: AtomicU64::new(now) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move time forward by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        // The update closure never returns `None`, so this cannot fail.
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| Some(t.saturating_add(secs)))
            .ok();
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wraps a clock with an optional override.
///
/// `set_now(t)` pins the reported time to `t`; `set_now(0)` clears the
/// override and the inner clock shows through again.
#[derive(Debug, Default)]
pub struct OverridableClock<C> {
    inner: C,
    override_now: AtomicU64,
}

impl<C: Clock> OverridableClock<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, override_now: AtomicU64::new(0) }
    }

    pub fn set_now(&self, now: Timestamp) {
        self.override_now.store(now, Ordering::SeqCst);
    }

    pub fn is_overridden(&self) -> bool {
        self.override_now.load(Ordering::SeqCst) != 0
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Clock> Clock for OverridableClock<C> {
    fn now(&self) -> Timestamp {
        match self.override_now.load(Ordering::SeqCst) {
            0 => self.inner.now(),
            t => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_set_and_advance() {
        let clock = FixedClock::new(100);
        assert_eq!(clock.now(), 100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);
        clock.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn fixed_clock_advance_saturates() {
        let clock = FixedClock::new(u64::MAX - 1);
        clock.advance(10);
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn fixed_clock_concurrent_advances_all_land() {
        let clock = FixedClock::new(0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        clock.advance(1);
                    }
                });
            }
        });
        assert_eq!(clock.now(), 4_000);
    }

    #[test]
    fn shared_clock_sees_updates() {
        let clock = Arc::new(FixedClock::new(1));
        let held: Arc<FixedClock> = Arc::clone(&clock);
        clock.set(42);
        assert_eq!(held.now(), 42);
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn override_and_reset() {
        let clock = OverridableClock::new(FixedClock::new(1_000));
        assert_eq!(clock.now(), 1_000);
        assert!(!clock.is_overridden());

        clock.set_now(5_000);
        assert!(clock.is_overridden());
        assert_eq!(clock.now(), 5_000);

        clock.inner().set(2_000);
        assert_eq!(clock.now(), 5_000);

        clock.set_now(0);
        assert_eq!(clock.now(), 2_000);
    }
}
