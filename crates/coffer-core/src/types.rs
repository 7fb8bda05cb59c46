//! Core ledger types: depositor identities and per-account records.
//!
//! All monetary values are unsigned integers in the smallest value unit.
//! Timestamps are Unix seconds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerError;

/// Monetary amount in the smallest value unit.
pub type Amount = u64;

/// Logical time in Unix seconds.
pub type Timestamp = u64;

/// A 32-byte depositor or owner identity.
///
/// Displays and serializes as lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a human-readable label.
    ///
    /// The address is the BLAKE3 hash of the label's UTF-8 bytes. Used for
    /// scenario scripts and tests where identities are named, not keyed.
    ///
    /// # Examples
    ///
    /// ```
    /// use coffer_core::types::Address;
    /// assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
    /// assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single value movement out of a ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient of the value.
    pub to: Address,
    /// Amount in the smallest value unit.
    pub amount: Amount,
}

impl Payout {
    pub fn new(to: Address, amount: Amount) -> Self {
        Self { to, amount }
    }
}

/// Common view over per-depositor account records.
///
/// A record with a zero balance is treated as absent.
pub trait AccountRecord: Clone + Default + fmt::Debug {
    /// Current net stake held for the depositor.
    fn balance(&self) -> Amount;

    /// Whether the record holds any value.
    fn is_active(&self) -> bool {
        self.balance() > 0
    }
}

/// Account record for the time-gated ledgers (time-lock and penalty-box).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAccount {
    /// Net stake credited to the depositor.
    pub balance: Amount,
    /// Earliest time an unconditional withdrawal is permitted.
    pub release_time: Timestamp,
}

impl LockedAccount {
    /// The record after crediting `amount` with a requested release time.
    ///
    /// The release time only ever ratchets upward: a later deposit with an
    /// earlier release time keeps the existing one.
    pub fn credited(&self, amount: Amount, release_time: Timestamp) -> Result<Self, LedgerError> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(Self {
            balance,
            release_time: self.release_time.max(release_time),
        })
    }

    /// Whether the release time has been reached at `now`.
    pub fn is_released(&self, now: Timestamp) -> bool {
        now >= self.release_time
    }
}

impl AccountRecord for LockedAccount {
    fn balance(&self) -> Amount {
        self.balance
    }
}

/// Account record for the pooled-fee ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAccount {
    /// Amount deposited into the shared pool.
    pub balance: Amount,
    /// Collected-fee level at the moment the balance was established.
    pub fee_offset: Amount,
}

impl AccountRecord for PoolAccount {
    fn balance(&self) -> Amount {
        self.balance
    }
}
