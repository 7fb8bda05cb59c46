//! Penalty-box ledger.
//!
//! Deposits are credited in full. Once the release time has passed the
//! depositor withdraws everything. Before that, a withdrawal is only possible
//! if the depositor explicitly agrees to the early exit terms, in which case
//! a penalty is paid to the owner out of the balance.

use tracing::{debug, info, warn};

use coffer_core::clock::Clock;
use coffer_core::error::LedgerError;
use coffer_core::event::LedgerEvent;
use coffer_core::math::bps_of;
use coffer_core::store::AccountStore;
use coffer_core::traits::{Ownable, TimeGated};
use coffer_core::transfer::FundTransfer;
use coffer_core::types::{AccountRecord, Address, Amount, LockedAccount, Payout, Timestamp};

use crate::policy::PenaltyBoxPolicy;
use crate::require_future;

/// Outcome of a penalty-box withdrawal before it is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExitTerms {
    payout: Amount,
    penalty: Amount,
}

/// Time-gated custody with an opt-in early exit penalty.
pub struct PenaltyBoxLedger<C, T> {
    owner: Address,
    policy: PenaltyBoxPolicy,
    clock: C,
    transfer: T,
    accounts: AccountStore<LockedAccount>,
    events: Vec<LedgerEvent>,
}

impl<C: Clock, T: FundTransfer> PenaltyBoxLedger<C, T> {
    /// Create a ledger with the reference policy (10% penalty, 10 minimum).
    pub fn new(owner: Address, clock: C, transfer: T) -> Self {
        Self::with_policy(owner, PenaltyBoxPolicy::default(), clock, transfer)
    }

    pub fn with_policy(owner: Address, policy: PenaltyBoxPolicy, clock: C, transfer: T) -> Self {
        Self {
            owner,
            policy,
            clock,
            transfer,
            accounts: AccountStore::new(),
            events: Vec::new(),
        }
    }

    /// Deposit `value` in full, locking the account until at least `release_time`.
    ///
    /// No value moves on deposit, so this cannot fail on transfer.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidReleaseTime`] if `release_time` is not after now
    /// - [`LedgerError::BelowMinimumDeposit`] if `value` is below the policy minimum
    pub fn deposit(
        &mut self,
        depositor: Address,
        release_time: Timestamp,
        value: Amount,
    ) -> Result<LedgerEvent, LedgerError> {
        let now = self.clock.now();
        let account = self
            .prepare_deposit(&depositor, release_time, value, now)
            .inspect_err(|e| debug!(%depositor, value, error = %e, "penalty_box: deposit rejected"))?;

        self.accounts.put(depositor, account);
        let event = LedgerEvent::Deposit {
            depositor,
            amount: value,
            balance: Some(account.balance),
            release_time: Some(account.release_time),
        };
        info!(
            %depositor,
            value,
            balance = account.balance,
            release_time = account.release_time,
            "penalty_box: deposit"
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
    ) -> Result<LockedAccount, LedgerError> {
        require_future(release_time, now)?;
        if value < self.policy.min_deposit {
            return Err(LedgerError::BelowMinimumDeposit {
                value,
                minimum: self.policy.min_deposit,
            });
        }
        self.accounts.get(depositor).credited(value, release_time)
    }

    /// Withdraw the whole balance.
    ///
    /// At or after the release time the full balance is returned and
    /// `early_agreement` is ignored. Before it, the depositor must pass
    /// `early_agreement = true`; the penalty (`balance * penalty_bps / 10_000`)
    /// goes to the owner and the remainder to the depositor. The returned
    /// event carries the amount the depositor actually received.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoBalance`] if the account is empty
    /// - [`LedgerError::EarlyWithdrawalNotAgreed`] if early without agreement
    /// - [`LedgerError::Transfer`] if settlement fails
    pub fn withdraw(
        &mut self,
        depositor: Address,
        early_agreement: bool,
    ) -> Result<LedgerEvent, LedgerError> {
        let now = self.clock.now();
        let account = self.accounts.get(&depositor);
        let terms = self
            .exit_terms(&account, early_agreement, now)
            .inspect_err(|e| debug!(%depositor, early_agreement, error = %e, "penalty_box: withdraw rejected"))?;

        self.transfer
            .settle(&[
                Payout::new(self.owner, terms.penalty),
                Payout::new(depositor, terms.payout),
            ])
            .inspect_err(|e| warn!(%depositor, error = %e, "penalty_box: settlement failed"))?;

        self.accounts.remove(&depositor);
        let event = LedgerEvent::Withdrawal { depositor, amount: terms.payout };
        info!(
            %depositor,
            amount = terms.payout,
            penalty = terms.penalty,
            early = !account.is_released(now),
            "penalty_box: withdrawal"
        );
        self.events.push(event.clone());
        Ok(event)
    }

    fn exit_terms(
        &self,
        account: &LockedAccount,
        early_agreement: bool,
        now: Timestamp,
    ) -> Result<ExitTerms, LedgerError> {
        if !account.is_active() {
            return Err(LedgerError::NoBalance);
        }
        if account.is_released(now) {
            return Ok(ExitTerms { payout: account.balance, penalty: 0 });
        }
        if !early_agreement {
            return Err(LedgerError::EarlyWithdrawalNotAgreed {
                now,
                release_time: account.release_time,
            });
        }
        let penalty = bps_of(account.balance, self.policy.penalty_bps)?;
        let payout = account
            .balance
            .checked_sub(penalty)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(ExitTerms { payout, penalty })
    }

    /// Read-only copy of the depositor's account (zero record if absent).
    pub fn account(&self, depositor: &Address) -> LockedAccount {
        self.accounts.get(depositor)
    }

    pub fn accounts(&self) -> &AccountStore<LockedAccount> {
        &self.accounts
    }

    pub fn policy(&self) -> &PenaltyBoxPolicy {
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

impl<C, T> Ownable for PenaltyBoxLedger<C, T> {
    fn owner(&self) -> &Address {
        &self.owner
    }
}

impl<C: Clock, T> TimeGated for PenaltyBoxLedger<C, T> {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn release_time(&self, depositor: &Address) -> Option<Timestamp> {
        let account = self.accounts.get(depositor);
        account.is_active().then_some(account.release_time)
    }
}
