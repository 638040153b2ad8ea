//! MDBX-backed persistence for the tideline indexer.
//!
//! The storage layer projects decoded blocks into typed tables and keeps the
//! projection reversible: every aggregate the forward apply touches can be
//! reconstructed and reversed, byte for byte, when the indexed chain diverges
//! from the canonical chain. One block apply and one block rollback each run
//! as a single MDBX read-write transaction; nothing is durable until that
//! transaction commits, and any error aborts it with no partial effects.

mod error;
pub use error::StorageError;

pub mod models;

mod aggregate;
pub use aggregate::{
    AccountAdjustment, RollupAdjustment, account_reversals, net_balance_changes, rollup_reversals,
};

mod providers;

mod traits;
pub use traits::{ApplyOutcome, BlockStore, HeadBlock};

mod db;
pub use db::IndexerDb;

/// Block signatures older than this many heights are eligible for pruning.
pub const SIGNATURE_RETENTION: u64 = 10_000;

/// Signature pruning runs every this many heights, inside the applying
/// transaction of the block that crosses the cadence.
pub const SIGNATURE_PRUNE_INTERVAL: u64 = 1_000;
