//! Integration and property test suite for the Coffer ledgers.
//!
//! Tests in this crate drive the ledgers only through their public API and
//! check the cross-variant invariants: atomic rejection, fee arithmetic,
//! release-time ratchets, and pooled-fee value conservation.

pub mod helpers;
