//! Ledger configuration.
//!
//! Provides [`LedgerConfig`]: the owner identity plus one policy per ledger
//! variant. Loaded from JSON; any missing field takes its reference default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use coffer_core::types::Address;

use crate::error::ConfigError;
use crate::policy::{PenaltyBoxPolicy, PooledFeePolicy, TimeLockPolicy};

/// Configuration shared by every ledger variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Label of the owner identity; the address is derived with
    /// [`Address::from_label`].
    pub owner: String,
    pub time_lock: TimeLockPolicy,
    pub penalty_box: PenaltyBoxPolicy,
    pub pooled_fee: PooledFeePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            time_lock: TimeLockPolicy::default(),
            penalty_box: PenaltyBoxPolicy::default(),
            pooled_fee: PooledFeePolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check every policy rate and the owner label.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.trim().is_empty() {
            return Err(ConfigError::EmptyOwner);
        }
        self.time_lock.validate()?;
        self.penalty_box.validate()?;
        self.pooled_fee.validate()
    }

    /// Address of the fee/penalty recipient.
    pub fn owner_address(&self) -> Address {
        Address::from_label(&self.owner)
    }
}
