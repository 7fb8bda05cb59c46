//! Flat time-lock ledger.
//!
//! Every deposit pays a fixed-rate fee straight to the owner; the rest is
//! credited to the depositor and locked until the account's release time.
//! After that time the whole balance can be withdrawn with no further
//! deduction. Repeated deposits top up the balance and can only push the
//! release time later.

use tracing::{debug, info, warn};

use coffer_core::clock::Clock;
use coffer_core::error::LedgerError;
use coffer_core::event::LedgerEvent;
use coffer_core::math::bps_of;
use coffer_core::store::AccountStore;
use coffer_core::traits::{Ownable, TimeGated};
use coffer_core::transfer::FundTransfer;
use coffer_core::types::{AccountRecord, Address, Amount, LockedAccount, Payout, Timestamp};

use crate::policy::TimeLockPolicy;
use crate::require_future;

/// Time-locked custody with a deposit fee.
pub struct TimeLockLedger<C, T> {
    owner: Address,
    policy: TimeLockPolicy,
    clock: C,
    transfer: T,
    accounts: AccountStore<LockedAccount>,
    events: Vec<LedgerEvent>,
}

impl<C: Clock, T: FundTransfer> TimeLockLedger<C, T> {
    /// Create a ledger with the reference policy (0.5% fee, 200 minimum).
    pub fn new(owner: Address, clock: C, transfer: T) -> Self {
        Self::with_policy(owner, TimeLockPolicy::default(), clock, transfer)
    }

    pub fn with_policy(owner: Address, policy: TimeLockPolicy, clock: C, transfer: T) -> Self {
        Self {
            owner,
            policy,
            clock,
            transfer,
            accounts: AccountStore::new(),
            events: Vec::new(),
        }
    }

    /// Deposit `value`, locking the account until at least `release_time`.
    ///
    /// The fee (`value * fee_bps / 10_000`, truncated) is sent to the owner
    /// and `value - fee` is credited.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidReleaseTime`] if `release_time` is not after now
    /// - [`LedgerError::BelowMinimumDeposit`] if `value` is below the policy minimum
    /// - [`LedgerError::ArithmeticOverflow`] if the fee exceeds `value`
    /// - [`LedgerError::Transfer`] if the fee cannot be delivered to the owner
    pub fn deposit(
        &mut self,
        depositor: Address,
        release_time: Timestamp,
        value: Amount,
    ) -> Result<LedgerEvent, LedgerError> {
        let now = self.clock.now();
        let (account, fee) = self
            .prepare_deposit(&depositor, release_time, value, now)
            .inspect_err(|e| debug!(%depositor, value, error = %e, "time_lock: deposit rejected"))?;

        self.transfer
            .settle(&[Payout::new(self.owner, fee)])
            .inspect_err(|e| warn!(%depositor, fee, error = %e, "time_lock: fee transfer failed"))?;

        self.accounts.put(depositor, account);
        let event = LedgerEvent::Deposit {
            depositor,
            amount: value - fee,
            balance: Some(account.balance),
            release_time: Some(account.release_time),
        };
        info!(
            %depositor,
            value,
            fee,
            balance = account.balance,
            release_time = account.release_time,
            "time_lock: deposit"
        );
        self.events.push(event.clone());
        Ok(event)
    }

    fn prepare_deposit(
        &self,
        depositor: &Address,
        release_time: Timestamp,
        value: Amount,
        now: Timestamp,
    ) -> Result<(LockedAccount, Amount), LedgerError> {
        require_future(release_time, now)?;
        if value < self.policy.min_deposit {
            return Err(LedgerError::BelowMinimumDeposit {
                value,
                minimum: self.policy.min_deposit,
            });
        }
        let fee = bps_of(value, self.policy.fee_bps)?;
        let net = value.checked_sub(fee).ok_or(LedgerError::ArithmeticOverflow)?;
        let account = self.accounts.get(depositor).credited(net, release_time)?;
        Ok((account, fee))
    }

    /// Withdraw the whole balance once the release time has passed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoBalance`] if the account is empty
    /// - [`LedgerError::TooEarly`] if now is before the release time
    /// - [`LedgerError::Transfer`] if the payout cannot be delivered
    pub fn withdraw(&mut self, depositor: Address) -> Result<LedgerEvent, LedgerError> {
        let now = self.clock.now();
        let account = self.accounts.get(&depositor);
        if !account.is_active() {
            debug!(%depositor, "time_lock: withdraw rejected, no balance");
            return Err(LedgerError::NoBalance);
        }
        if !account.is_released(now) {
            debug!(%depositor, now, release_time = account.release_time, "time_lock: withdraw rejected, too early");
            return Err(LedgerError::TooEarly { now, release_time: account.release_time });
        }

        self.transfer
            .settle(&[Payout::new(depositor, account.balance)])
            .inspect_err(|e| warn!(%depositor, error = %e, "time_lock: payout failed"))?;

        self.accounts.remove(&depositor);
        let event = LedgerEvent::Withdrawal { depositor, amount: account.balance };
        info!(%depositor, amount = account.balance, "time_lock: withdrawal");
        self.events.push(event.clone());
        Ok(event)
    }

    /// Read-only copy of the depositor's account (zero record if absent).
    pub fn account(&self, depositor: &Address) -> LockedAccount {
        self.accounts.get(depositor)
    }

    pub fn accounts(&self) -> &AccountStore<LockedAccount> {
        &self.accounts
    }

    pub fn policy(&self) -> &TimeLockPolicy {
        &self.policy
    }

    /// Events of every committed operation, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }
}

impl<C, T> Ownable for TimeLockLedger<C, T> {
    fn owner(&self) -> &Address {
        &self.owner
    }
}

impl<C: Clock, T> TimeGated for TimeLockLedger<C, T> {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn release_time(&self, depositor: &Address) -> Option<Timestamp> {
        let account = self.accounts.get(depositor);
        account.is_active().then_some(account.release_time)
    }
}
