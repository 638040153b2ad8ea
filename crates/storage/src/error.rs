use alloy_primitives::{Address, B256};
use reth_db::DatabaseError;
use thiserror::Error;

/// Errors surfaced by the indexer storage layer.
///
/// Every error aborts the enclosing transaction; callers never observe
/// partially applied blocks or partially rolled-back heights.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying database failure. Surfaced as-is; retry policy belongs to
    /// the caller.
    #[error("database error")]
    Database(#[from] DatabaseError),

    /// Failure while creating or opening the database environment.
    #[error("database initialization failed: {0}")]
    Init(String),

    /// The expected entry was not found in the database.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// A write conflicted with the persisted state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The block references an address absent from both its own batch and
    /// the database.
    #[error("unknown address {0}")]
    UnknownAddress(Address),

    /// The block's proposer does not resolve to a known validator.
    #[error("unknown proposer {0}")]
    UnknownProposer(B256),

    /// A block signature does not resolve to a known validator.
    #[error("unknown validator {0}")]
    UnknownValidator(B256),

    /// A referenced rollup is absent from both the block and the database.
    #[error("unknown rollup {0}")]
    UnknownRollup(B256),

    /// A deposit targets a bridge account with no registered bridge.
    #[error("unknown bridge for account {0}")]
    UnknownBridge(Address),

    /// An action payload failed to decode during rollback byte accounting.
    /// Fatal: skipping it would silently desynchronize byte totals.
    #[error("malformed action payload at height {height}, action {seq}")]
    MalformedPayload {
        /// Height being rolled back.
        height: u64,
        /// Sequence number of the offending action within the block.
        seq: u32,
    },
}
