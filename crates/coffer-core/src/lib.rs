//! # coffer-core
//! Foundation types and capabilities shared by the Coffer custody ledgers.
//!
//! - [`types`]: addresses, account records, payouts
//! - [`store::AccountStore`]: per-ledger depositor → account mapping
//! - [`clock`]: injectable time source
//! - [`transfer`]: the fund-transfer (settlement) capability
//! - [`traits`]: `Ownable` / `TimeGated` capabilities composed into ledgers

pub mod clock;
pub mod constants;
pub mod error;
pub mod event;
pub mod math;
pub mod store;
pub mod traits;
pub mod transfer;
pub mod types;

pub use clock::{Clock, FixedClock, OverridableClock, SystemClock};
pub use error::{LedgerError, TransferError};
pub use event::LedgerEvent;
pub use store::AccountStore;
pub use traits::{Ownable, TimeGated};
pub use transfer::{FundTransfer, MemoryTransfer};
pub use types::{AccountRecord, Address, Amount, LockedAccount, Payout, PoolAccount, Timestamp};
