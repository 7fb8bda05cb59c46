//! Scenario scripts and the runner that replays them against a ledger.
//!
//! A scenario is a JSON document with a list of steps. Each step sets the
//! clock to `at` and then performs one deposit or withdrawal for a depositor
//! named by label.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use coffer_core::clock::{Clock, FixedClock};
use coffer_core::event::LedgerEvent;
use coffer_core::traits::Ownable;
use coffer_core::transfer::MemoryTransfer;
use coffer_core::types::{Address, Amount, Timestamp};
use coffer_ledger::{LedgerConfig, PenaltyBoxLedger, PooledFeeLedger, TimeLockLedger};

/// Which ledger a scenario runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    TimeLock,
    PenaltyBox,
    PooledFee,
}

/// A scenario script.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing scenario {}", path.display()))
    }
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Clock time at which the operation runs.
    pub at: Timestamp,
    #[serde(flatten)]
    pub op: Op,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Deposit {
        depositor: String,
        value: Amount,
        /// Required by the time-gated variants, ignored by the pooled one.
        #[serde(default)]
        release_time: Option<Timestamp>,
    },
    Withdraw {
        depositor: String,
        /// Early exit agreement, penalty-box only.
        #[serde(default)]
        early: bool,
    },
}

impl Op {
    fn depositor(&self) -> &str {
        match self {
            Op::Deposit { depositor, .. } | Op::Withdraw { depositor, .. } => depositor,
        }
    }
}

type Shared = Arc<FixedClock>;

enum AnyLedger {
    TimeLock(TimeLockLedger<Shared, MemoryTransfer>),
    PenaltyBox(PenaltyBoxLedger<Shared, MemoryTransfer>),
    PooledFee(PooledFeeLedger<MemoryTransfer>),
}

/// Final state of one depositor after a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub address: Address,
    pub balance: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_offset: Option<Amount>,
    /// Total value paid out to this depositor.
    pub received: Amount,
}

/// End-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub variant: Variant,
    pub now: Timestamp,
    pub owner: Address,
    pub owner_received: Amount,
    pub accounts: BTreeMap<String, AccountSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_user_balances: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_fees: Option<Amount>,
}

/// Replays steps against one ledger instance on a deterministic clock.
pub struct Runner {
    variant: Variant,
    clock: Shared,
    ledger: AnyLedger,
    labels: BTreeMap<String, Address>,
}

impl Runner {
    pub fn new(variant: Variant, config: &LedgerConfig) -> Self {
        let clock = Arc::new(FixedClock::new(0));
        let owner = config.owner_address();
        let ledger = match variant {
            Variant::TimeLock => AnyLedger::TimeLock(TimeLockLedger::with_policy(
                owner,
                config.time_lock,
                Arc::clone(&clock),
                MemoryTransfer::new(),
            )),
            Variant::PenaltyBox => AnyLedger::PenaltyBox(PenaltyBoxLedger::with_policy(
                owner,
                config.penalty_box,
                Arc::clone(&clock),
                MemoryTransfer::new(),
            )),
            Variant::PooledFee => AnyLedger::PooledFee(PooledFeeLedger::with_policy(
                owner,
                config.pooled_fee,
                MemoryTransfer::new(),
            )),
        };
        Self { variant, clock, ledger, labels: BTreeMap::new() }
    }

    /// Run one step. A rejected operation returns the ledger's error.
    pub fn apply(&mut self, step: &Step) -> Result<LedgerEvent> {
        if step.at < self.clock.now() {
            warn!(from = self.clock.now(), to = step.at, "scenario: clock moves backwards");
        }
        self.clock.set(step.at);

        let label = step.op.depositor();
        let depositor = Address::from_label(label);
        self.labels.entry(label.to_string()).or_insert(depositor);
        debug!(at = step.at, depositor = label, "scenario: step");

        let event = match (&mut self.ledger, &step.op) {
            (AnyLedger::TimeLock(l), Op::Deposit { value, release_time, .. }) => {
                let Some(release_time) = release_time else {
                    bail!("time-lock deposit requires release_time");
                };
                l.deposit(depositor, *release_time, *value)?
            }
            (AnyLedger::TimeLock(l), Op::Withdraw { .. }) => l.withdraw(depositor)?,
            (AnyLedger::PenaltyBox(l), Op::Deposit { value, release_time, .. }) => {
                let Some(release_time) = release_time else {
                    bail!("penalty-box deposit requires release_time");
                };
                l.deposit(depositor, *release_time, *value)?
            }
            (AnyLedger::PenaltyBox(l), Op::Withdraw { early, .. }) => l.withdraw(depositor, *early)?,
            (AnyLedger::PooledFee(l), Op::Deposit { value, .. }) => l.deposit(depositor, *value)?,
            (AnyLedger::PooledFee(l), Op::Withdraw { .. }) => l.withdraw(depositor)?,
        };
        Ok(event)
    }

    /// Events of every committed step, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        match &self.ledger {
            AnyLedger::TimeLock(l) => l.events(),
            AnyLedger::PenaltyBox(l) => l.events(),
            AnyLedger::PooledFee(l) => l.events(),
        }
    }

    fn transfer(&self) -> &MemoryTransfer {
        match &self.ledger {
            AnyLedger::TimeLock(l) => l.transfer(),
            AnyLedger::PenaltyBox(l) => l.transfer(),
            AnyLedger::PooledFee(l) => l.transfer(),
        }
    }

    fn owner(&self) -> Address {
        match &self.ledger {
            AnyLedger::TimeLock(l) => *l.owner(),
            AnyLedger::PenaltyBox(l) => *l.owner(),
            AnyLedger::PooledFee(l) => *l.owner(),
        }
    }

    fn account_summary(&self, address: Address) -> AccountSummary {
        let received = self.transfer().received(&address);
        match &self.ledger {
            AnyLedger::TimeLock(l) => {
                let a = l.account(&address);
                AccountSummary {
                    address,
                    balance: a.balance,
                    release_time: Some(a.release_time),
                    fee_offset: None,
                    received,
                }
            }
            AnyLedger::PenaltyBox(l) => {
                let a = l.account(&address);
                AccountSummary {
                    address,
                    balance: a.balance,
                    release_time: Some(a.release_time),
                    fee_offset: None,
                    received,
                }
            }
            AnyLedger::PooledFee(l) => {
                let a = l.account(&address);
                AccountSummary {
                    address,
                    balance: a.balance,
                    release_time: None,
                    fee_offset: Some(a.fee_offset),
                    received,
                }
            }
        }
    }

    pub fn summary(&self) -> Summary {
        let owner = self.owner();
        let accounts = self
            .labels
            .iter()
            .map(|(label, addr)| (label.clone(), self.account_summary(*addr)))
            .collect();
        let (total_user_balances, collected_fees) = match &self.ledger {
            AnyLedger::PooledFee(l) => (Some(l.total_user_balances()), Some(l.collected_fees())),
            _ => (None, None),
        };
        Summary {
            variant: self.variant,
            now: self.clock.now(),
            owner,
            owner_received: self.transfer().received(&owner),
            accounts,
            total_user_balances,
            collected_fees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_core::error::LedgerError;

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).unwrap()
    }

    fn run(variant: Variant, s: &Scenario) -> (Runner, Vec<Result<LedgerEvent>>) {
        let mut runner = Runner::new(variant, &LedgerConfig::default());
        let results = s.steps.iter().map(|step| runner.apply(step)).collect();
        (runner, results)
    }

    #[test]
    fn parses_steps() {
        let s = scenario(
            r#"{"steps": [
                {"at": 1, "op": "deposit", "depositor": "alice", "value": 500, "release_time": 10},
                {"at": 11, "op": "withdraw", "depositor": "alice", "early": true}
            ]}"#,
        );
        assert_eq!(s.steps.len(), 2);
        assert!(matches!(s.steps[0].op, Op::Deposit { value: 500, release_time: Some(10), .. }));
        assert!(matches!(s.steps[1].op, Op::Withdraw { early: true, .. }));
    }

    #[test]
    fn early_defaults_to_false() {
        let s = scenario(r#"{"steps": [{"at": 1, "op": "withdraw", "depositor": "bob"}]}"#);
        assert!(matches!(s.steps[0].op, Op::Withdraw { early: false, .. }));
    }

    #[test]
    fn pooled_fee_reference_run() {
        let s = scenario(
            r#"{"steps": [
                {"at": 1, "op": "deposit", "depositor": "a", "value": 101},
                {"at": 2, "op": "deposit", "depositor": "b", "value": 101},
                {"at": 3, "op": "withdraw", "depositor": "a"}
            ]}"#,
        );
        let (runner, results) = run(Variant::PooledFee, &s);
        assert!(results.iter().all(Result::is_ok));
        let summary = runner.summary();
        assert_eq!(summary.collected_fees, Some(10));
        assert_eq!(summary.total_user_balances, Some(101));
        assert_eq!(summary.accounts["a"].received, 91);
        assert_eq!(summary.accounts["b"].fee_offset, Some(0));
        assert_eq!(summary.now, 3);
    }

    #[test]
    fn time_lock_rejection_is_reported() {
        let s = scenario(
            r#"{"steps": [
                {"at": 100, "op": "deposit", "depositor": "a", "value": 1000, "release_time": 200},
                {"at": 150, "op": "withdraw", "depositor": "a"},
                {"at": 200, "op": "withdraw", "depositor": "a"}
            ]}"#,
        );
        let (runner, results) = run(Variant::TimeLock, &s);
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::TooEarly { now: 150, release_time: 200 })
        );
        assert!(results[2].is_ok());
        let summary = runner.summary();
        assert_eq!(summary.owner_received, 5);
        assert_eq!(summary.accounts["a"].received, 995);
        assert_eq!(runner.events().len(), 2);
    }

    #[test]
    fn missing_release_time_is_an_error() {
        let s = scenario(r#"{"steps": [{"at": 1, "op": "deposit", "depositor": "a", "value": 50}]}"#);
        let (runner, results) = run(Variant::PenaltyBox, &s);
        assert!(results[0].is_err());
        assert!(runner.events().is_empty());
    }

    #[test]
    fn penalty_box_early_exit() {
        let s = scenario(
            r#"{"steps": [
                {"at": 1, "op": "deposit", "depositor": "a", "value": 1000, "release_time": 100},
                {"at": 2, "op": "withdraw", "depositor": "a", "early": true}
            ]}"#,
        );
        let (runner, _) = run(Variant::PenaltyBox, &s);
        let summary = runner.summary();
        assert_eq!(summary.owner_received, 100);
        assert_eq!(summary.accounts["a"].received, 900);
        assert_eq!(summary.accounts["a"].balance, 0);
    }

    #[test]
    fn loads_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, r#"{"steps": []}"#).unwrap();
        assert!(Scenario::from_file(&path).unwrap().steps.is_empty());
        assert!(Scenario::from_file(&dir.path().join("nope.json")).is_err());
    }
}
