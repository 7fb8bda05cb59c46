//! Pooled-fee ledger: a shared pool with withdrawal fees redistributed to
//! the depositors who stay.
//!
//! Each depositor makes one deposit and one eventual withdrawal. Every
//! withdrawal except the last pays a fee into `collected_fees`; the remaining
//! depositors claim their share of it when they leave. Nothing iterates over
//! accounts: on deposit the account snapshots the current `collected_fees`
//! level as its `fee_offset`, and on withdrawal the share is
//!
//! ```text
//! fee_share = (collected_fees - fee_offset) * balance / total_user_balances
//! ```
//!
//! with `total_user_balances` read before the withdrawer is removed. The
//! share is paid out and subtracted from `collected_fees`, and the new fee is
//! added to it, so at all times
//!
//! ```text
//! deposited == paid_out + total_user_balances + collected_fees
//! ```
//!
//! # Known hazard: late deposits dilute earlier fees
//!
//! The share divides by the *current* `total_user_balances`, which includes
//! depositors who joined after a fee was collected. Their offset excludes
//! them from claiming that fee, but their balance still enlarges the
//! denominator, so earlier depositors are under-credited and the difference
//! stays stranded in `collected_fees`. For example, with A and B holding 101
//! each, A's withdrawal collects a fee of 10. If C then deposits 303, B's
//! share of that fee is `10 * 101 / 404 = 2` instead of 10.
//!
//! Correcting this needs per-epoch accounting or a checkpointed
//! reward-per-share accumulator, which changes payouts; this ledger keeps
//! the straightforward arithmetic.

use tracing::{debug, info, warn};

use coffer_core::error::LedgerError;
use coffer_core::event::LedgerEvent;
use coffer_core::math::{bps_of, mul_div};
use coffer_core::store::AccountStore;
use coffer_core::traits::Ownable;
use coffer_core::transfer::FundTransfer;
use coffer_core::types::{AccountRecord, Address, Amount, Payout, PoolAccount};

use crate::policy::PooledFeePolicy;

/// Ledger-wide pool state.
#[derive(Debug, Clone, Default)]
pub struct PoolState {
    accounts: AccountStore<PoolAccount>,
    /// Sum of every live account balance.
    total_user_balances: Amount,
    /// Fees collected and not yet paid out as shares.
    collected_fees: Amount,
}

impl PoolState {
    pub fn accounts(&self) -> &AccountStore<PoolAccount> {
        &self.accounts
    }

    pub fn total_user_balances(&self) -> Amount {
        self.total_user_balances
    }

    pub fn collected_fees(&self) -> Amount {
        self.collected_fees
    }
}

/// Breakdown of a withdrawal, computed before anything is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExit {
    /// Principal the depositor is withdrawing.
    pub balance: Amount,
    /// Fee retained in the pool for the remaining depositors.
    pub fee: Amount,
    /// Share of previously collected fees credited to the depositor.
    pub fee_share: Amount,
    /// What the depositor receives: `balance - fee + fee_share`.
    pub payout: Amount,
    /// `collected_fees` after the withdrawal.
    pub collected_fees: Amount,
    /// `total_user_balances` after the withdrawal.
    pub total_user_balances: Amount,
}

/// Shared-pool custody with withdrawal fees distributed to remaining depositors.
pub struct PooledFeeLedger<T> {
    owner: Address,
    policy: PooledFeePolicy,
    transfer: T,
    state: PoolState,
    events: Vec<LedgerEvent>,
}

impl<T: FundTransfer> PooledFeeLedger<T> {
    /// Create a ledger with the reference policy (10% withdrawal fee).
    pub fn new(owner: Address, transfer: T) -> Self {
        Self::with_policy(owner, PooledFeePolicy::default(), transfer)
    }

    pub fn with_policy(owner: Address, policy: PooledFeePolicy, transfer: T) -> Self {
        Self {
            owner,
            policy,
            transfer,
            state: PoolState::default(),
            events: Vec::new(),
        }
    }

    /// Join the pool with `value`.
    ///
    /// The account's fee offset is set to the current `collected_fees`, so
    /// fees collected before this deposit are never credited to it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoValue`] if `value` is zero
    /// - [`LedgerError::AlreadyDeposited`] if the account already holds a deposit
    pub fn deposit(&mut self, depositor: Address, value: Amount) -> Result<LedgerEvent, LedgerError> {
        let (account, total) = self
            .prepare_deposit(&depositor, value)
            .inspect_err(|e| debug!(%depositor, value, error = %e, "pooled_fee: deposit rejected"))?;

        self.state.accounts.put(depositor, account);
        self.state.total_user_balances = total;
        let event = LedgerEvent::Deposit {
            depositor,
            amount: value,
            balance: None,
            release_time: None,
        };
        info!(
            %depositor,
            value,
            fee_offset = account.fee_offset,
            total_user_balances = total,
            "pooled_fee: deposit"
        );
        self.events.push(event.clone());
        Ok(event)
    }

    fn prepare_deposit(
        &self,
        depositor: &Address,
        value: Amount,
    ) -> Result<(PoolAccount, Amount), LedgerError> {
        if value == 0 {
            return Err(LedgerError::NoValue);
        }
        if self.state.accounts.is_active(depositor) {
            return Err(LedgerError::AlreadyDeposited);
        }
        let total = self
            .state
            .total_user_balances
            .checked_add(value)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let account = PoolAccount {
            balance: value,
            fee_offset: self.state.collected_fees,
        };
        Ok((account, total))
    }

    /// Compute what a withdrawal by `depositor` would pay, without changing state.
    ///
    /// The fee is `balance * withdraw_fee_bps / 10_000`, waived when the
    /// depositor holds the entire pool. If later withdrawals have drawn
    /// `collected_fees` below the account's offset the accrued amount
    /// saturates at zero.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoBalance`] if the account is empty
    pub fn quote_withdrawal(&self, depositor: &Address) -> Result<PoolExit, LedgerError> {
        let account = self.state.accounts.get(depositor);
        if !account.is_active() {
            return Err(LedgerError::NoBalance);
        }
        let total = self.state.total_user_balances;
        let accrued = self.state.collected_fees.saturating_sub(account.fee_offset);
        let fee_share = mul_div(accrued, account.balance, total)?;
        let fee = if account.balance >= total {
            0
        } else {
            bps_of(account.balance, self.policy.withdraw_fee_bps)?
        };
        let payout = account
            .balance
            .checked_sub(fee)
            .and_then(|net| net.checked_add(fee_share))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let collected_fees = self
            .state
            .collected_fees
            .checked_sub(fee_share)
            .and_then(|c| c.checked_add(fee))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let total_user_balances = total
            .checked_sub(account.balance)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        Ok(PoolExit {
            balance: account.balance,
            fee,
            fee_share,
            payout,
            collected_fees,
            total_user_balances,
        })
    }

    /// Leave the pool, receiving principal minus fee plus accrued fee share.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoBalance`] if the account is empty
    /// - [`LedgerError::Transfer`] if the payout cannot be delivered
    pub fn withdraw(&mut self, depositor: Address) -> Result<LedgerEvent, LedgerError> {
        let exit = self
            .quote_withdrawal(&depositor)
            .inspect_err(|e| debug!(%depositor, error = %e, "pooled_fee: withdraw rejected"))?;

        self.transfer
            .settle(&[Payout::new(depositor, exit.payout)])
            .inspect_err(|e| warn!(%depositor, payout = exit.payout, error = %e, "pooled_fee: payout failed"))?;

        self.state.accounts.remove(&depositor);
        self.state.collected_fees = exit.collected_fees;
        self.state.total_user_balances = exit.total_user_balances;
        let event = LedgerEvent::Withdrawal { depositor, amount: exit.payout };
        info!(
            %depositor,
            amount = exit.payout,
            fee = exit.fee,
            fee_share = exit.fee_share,
            collected_fees = exit.collected_fees,
            total_user_balances = exit.total_user_balances,
            "pooled_fee: withdrawal"
        );
        self.events.push(event.clone());
        Ok(event)
    }

    /// Read-only copy of the depositor's account (zero record if absent).
    pub fn account(&self, depositor: &Address) -> PoolAccount {
        self.state.accounts.get(depositor)
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn total_user_balances(&self) -> Amount {
        self.state.total_user_balances
    }

    pub fn collected_fees(&self) -> Amount {
        self.state.collected_fees
    }

    pub fn policy(&self) -> &PooledFeePolicy {
        &self.policy
    }

    /// Events of every committed operation, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }
}

impl<T> Ownable for PooledFeeLedger<T> {
    fn owner(&self) -> &Address {
        &self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_core::transfer::MemoryTransfer;
    use proptest::prelude::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn ledger() -> PooledFeeLedger<MemoryTransfer> {
        PooledFeeLedger::new(addr("owner"), MemoryTransfer::new())
    }

    // ------------------------------------------------------------------
    // deposit
    // ------------------------------------------------------------------

    #[test]
    fn rejects_zero_value() {
        let mut l = ledger();
        assert_eq!(l.deposit(addr("a"), 0), Err(LedgerError::NoValue));
        assert_eq!(l.total_user_balances(), 0);
    }

    #[test]
    fn records_deposit() {
        let mut l = ledger();
        let ev = l.deposit(addr("a"), 100).unwrap();
        assert_eq!(
            ev,
            LedgerEvent::Deposit { depositor: addr("a"), amount: 100, balance: None, release_time: None }
        );
        assert_eq!(l.collected_fees(), 0);
        assert_eq!(l.total_user_balances(), 100);
        assert_eq!(l.account(&addr("a")), PoolAccount { balance: 100, fee_offset: 0 });
    }

    #[test]
    fn rejects_second_deposit() {
        let mut l = ledger();
        l.deposit(addr("a"), 100).unwrap();
        l.deposit(addr("b"), 100).unwrap();
        assert_eq!(l.total_user_balances(), 200);
        assert_eq!(l.deposit(addr("b"), 100), Err(LedgerError::AlreadyDeposited));
        assert_eq!(l.total_user_balances(), 200);
        assert_eq!(l.account(&addr("b")).balance, 100);
        assert_eq!(l.events().len(), 2);
    }

    #[test]
    fn fee_offset_snapshots_collected_fees() {
        let mut l = ledger();
        l.deposit(addr("single"), 100).unwrap();
        l.deposit(addr("multi"), 100).unwrap();
        l.deposit(addr("a"), 100).unwrap();
        l.withdraw(addr("multi")).unwrap();
        assert_eq!(l.collected_fees(), 10);

        l.deposit(addr("c"), 100).unwrap();
        assert_eq!(l.account(&addr("c")), PoolAccount { balance: 100, fee_offset: 10 });
        assert_eq!(l.account(&addr("a")).fee_offset, 0);
    }

    #[test]
    fn deposit_overflow_rejected() {
        let mut l = ledger();
        l.deposit(addr("a"), u64::MAX).unwrap();
        assert_eq!(l.deposit(addr("b"), 1), Err(LedgerError::ArithmeticOverflow));
        assert!(!l.state().accounts().is_active(&addr("b")));
    }

    // ------------------------------------------------------------------
    // withdraw
    // ------------------------------------------------------------------

    #[test]
    fn withdraw_rejects_empty_account() {
        let mut l = ledger();
        assert_eq!(l.withdraw(addr("a")), Err(LedgerError::NoBalance));
        assert_eq!(l.quote_withdrawal(&addr("a")), Err(LedgerError::NoBalance));
    }

    #[test]
    fn sole_depositor_pays_no_fee() {
        let mut l = ledger();
        l.deposit(addr("a"), 100).unwrap();
        let ev = l.withdraw(addr("a")).unwrap();
        assert_eq!(ev, LedgerEvent::Withdrawal { depositor: addr("a"), amount: 100 });
        assert_eq!(l.collected_fees(), 0);
        assert_eq!(l.total_user_balances(), 0);
        assert_eq!(l.account(&addr("a")), PoolAccount::default());
        assert_eq!(l.transfer().received(&addr("a")), 100);
    }

    #[test]
    fn first_of_two_pays_fee_into_pool() {
        let mut l = ledger();
        l.deposit(addr("a"), 101).unwrap();
        l.deposit(addr("b"), 101).unwrap();
        assert_eq!(l.total_user_balances(), 202);

        let ev = l.withdraw(addr("a")).unwrap();
        assert_eq!(ev, LedgerEvent::Withdrawal { depositor: addr("a"), amount: 91 });
        assert_eq!(l.collected_fees(), 10);
        assert_eq!(l.total_user_balances(), 101);
        assert_eq!(l.account(&addr("a")).balance, 0);
        assert_eq!(l.transfer().received(&addr("a")), 91);
    }

    #[test]
    fn last_depositor_collects_accrued_fees() {
        let mut l = ledger();
        l.deposit(addr("a"), 101).unwrap();
        l.deposit(addr("b"), 101).unwrap();
        l.withdraw(addr("a")).unwrap();

        let exit = l.quote_withdrawal(&addr("b")).unwrap();
        assert_eq!(exit.fee, 0);
        assert_eq!(exit.fee_share, 10);
        assert_eq!(exit.payout, 111);

        l.withdraw(addr("b")).unwrap();
        assert_eq!(l.transfer().received(&addr("b")), 111);
        assert_eq!(l.collected_fees(), 0);
        assert_eq!(l.total_user_balances(), 0);
        assert_eq!(l.transfer().total_paid(), 202);
    }

    #[test]
    fn late_deposit_dilutes_earlier_fee_share() {
        let mut l = ledger();
        l.deposit(addr("a"), 101).unwrap();
        l.deposit(addr("b"), 101).unwrap();
        l.withdraw(addr("a")).unwrap();
        l.deposit(addr("c"), 303).unwrap();
        assert_eq!(l.account(&addr("c")).fee_offset, 10);
        assert_eq!(l.total_user_balances(), 404);

        // B alone was owed the whole fee of 10 but the denominator now
        // includes C, who cannot claim it.
        let exit = l.quote_withdrawal(&addr("b")).unwrap();
        assert_eq!(exit.fee_share, 2);
        assert_eq!(exit.fee, 10);
        assert_eq!(exit.payout, 93);
        l.withdraw(addr("b")).unwrap();
        assert_eq!(l.collected_fees(), 18);

        // C, now alone, claims only what accrued above its offset.
        let ev = l.withdraw(addr("c")).unwrap();
        assert_eq!(ev.amount(), 311);

        // The diluted remainder is stranded with no depositor left.
        assert_eq!(l.total_user_balances(), 0);
        assert_eq!(l.collected_fees(), 10);
        assert_eq!(l.transfer().total_paid(), 91 + 93 + 311);
    }

    #[test]
    fn offset_above_collected_fees_accrues_nothing() {
        let mut l = ledger();
        l.deposit(addr("a"), 50).unwrap();
        l.deposit(addr("b"), 9).unwrap();
        l.deposit(addr("x"), 90).unwrap();
        l.withdraw(addr("x")).unwrap();
        assert_eq!(l.collected_fees(), 9);

        l.deposit(addr("c"), 1).unwrap();
        // B's fee truncates to zero while it still takes a share.
        let exit = l.quote_withdrawal(&addr("b")).unwrap();
        assert_eq!((exit.fee, exit.fee_share), (0, 1));
        l.withdraw(addr("b")).unwrap();
        assert_eq!(l.collected_fees(), 8);
        assert!(l.account(&addr("c")).fee_offset > l.collected_fees());

        l.withdraw(addr("a")).unwrap();
        assert_eq!(l.transfer().received(&addr("a")), 52);
        assert_eq!(l.collected_fees(), 6);

        let ev = l.withdraw(addr("c")).unwrap();
        assert_eq!(ev.amount(), 1);
    }

    #[test]
    fn second_withdraw_has_no_balance() {
        let mut l = ledger();
        l.deposit(addr("a"), 100).unwrap();
        l.withdraw(addr("a")).unwrap();
        assert_eq!(l.withdraw(addr("a")), Err(LedgerError::NoBalance));
    }

    #[test]
    fn can_rejoin_after_withdrawal() {
        let mut l = ledger();
        l.deposit(addr("a"), 100).unwrap();
        l.deposit(addr("b"), 100).unwrap();
        l.withdraw(addr("a")).unwrap();
        l.deposit(addr("a"), 50).unwrap();
        assert_eq!(l.account(&addr("a")), PoolAccount { balance: 50, fee_offset: 10 });
    }

    #[test]
    fn payout_failure_leaves_pool_unchanged() {
        let mut l = ledger();
        l.deposit(addr("a"), 101).unwrap();
        l.deposit(addr("b"), 101).unwrap();
        l.transfer_mut().fail_transfers_to(addr("a"));

        assert!(matches!(l.withdraw(addr("a")), Err(LedgerError::Transfer(_))));
        assert_eq!(l.collected_fees(), 0);
        assert_eq!(l.total_user_balances(), 202);
        assert_eq!(l.account(&addr("a")).balance, 101);
        assert_eq!(l.events().len(), 2);
    }

    #[test]
    fn owner_receives_nothing() {
        let mut l = ledger();
        l.deposit(addr("a"), 1_000).unwrap();
        l.deposit(addr("b"), 1_000).unwrap();
        l.withdraw(addr("a")).unwrap();
        assert_eq!(l.owner(), &addr("owner"));
        assert_eq!(l.transfer().received(&addr("owner")), 0);
    }

    #[test]
    fn fee_above_balance_is_rejected() {
        let policy = PooledFeePolicy { withdraw_fee_bps: 20_000 };
        let mut l = PooledFeeLedger::with_policy(addr("owner"), policy, MemoryTransfer::new());
        l.deposit(addr("a"), 100).unwrap();
        l.deposit(addr("b"), 100).unwrap();

        assert_eq!(l.withdraw(addr("a")), Err(LedgerError::ArithmeticOverflow));
        assert_eq!(l.quote_withdrawal(&addr("a")), Err(LedgerError::ArithmeticOverflow));
        assert_eq!(l.account(&addr("a")).balance, 100);
        assert_eq!(l.total_user_balances(), 200);
        assert_eq!(l.collected_fees(), 0);
        assert_eq!(l.transfer().total_paid(), 0);
    }

    // ------------------------------------------------------------------
    // proptest
    // ------------------------------------------------------------------

    proptest! {
        #[test]
        fn value_is_conserved(
            ops in proptest::collection::vec((0usize..6, 1u64..1_000_000, any::<bool>()), 1..64),
        ) {
            let mut l = ledger();
            let names = ["a", "b", "c", "d", "e", "f"];
            let mut deposited: u128 = 0;

            for (who, value, is_deposit) in ops {
                let depositor = addr(names[who]);
                if is_deposit {
                    if l.deposit(depositor, value).is_ok() {
                        deposited += value as u128;
                    }
                } else {
                    let _ = l.withdraw(depositor);
                }

                let held = l.total_user_balances() as u128 + l.collected_fees() as u128;
                prop_assert_eq!(deposited, l.transfer().total_paid() + held);
                prop_assert_eq!(
                    l.total_user_balances() as u128,
                    l.state().accounts().total_balance()
                );
            }
        }
    }
}
