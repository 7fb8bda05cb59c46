//! Ledger events: the audit trail from which balance history is reconstructed.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Timestamp};

/// An event emitted by a committed ledger operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Value credited to a depositor's account.
    Deposit {
        depositor: Address,
        /// Amount credited (net of any deposit fee).
        amount: Amount,
        /// Account balance after the deposit. Absent for the pooled ledger.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        balance: Option<Amount>,
        /// Effective release time after the deposit. Absent for the pooled ledger.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        release_time: Option<Timestamp>,
    },
    /// Account emptied; `amount` is what the depositor actually received.
    Withdrawal { depositor: Address, amount: Amount },
}

impl LedgerEvent {
    pub fn depositor(&self) -> &Address {
        match self {
            Self::Deposit { depositor, .. } | Self::Withdrawal { depositor, .. } => depositor,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::Deposit { amount, .. } | Self::Withdrawal { amount, .. } => *amount,
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit { .. })
    }
}
