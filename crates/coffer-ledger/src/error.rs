//! Configuration error types.

use thiserror::Error;

/// Errors loading or validating a [`LedgerConfig`](crate::LedgerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected layout.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A basis-point rate exceeds 100%.
    #[error("invalid rate for {name}: {bps} bps exceeds 10000")]
    InvalidRate { name: &'static str, bps: u64 },

    /// The owner label is empty.
    #[error("owner must not be empty")]
    EmptyOwner,
}
