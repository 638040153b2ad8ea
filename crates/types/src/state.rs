//! The singleton network-state summary published by the indexer.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Running summary of indexing progress and network-wide totals.
///
/// Exactly one state exists per logical indexer instance. Every total is the
/// sum of all forward deltas minus all rolled-back deltas applied so far; the
/// storage layer updates it exactly once per block, inside that block's
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkState {
    /// Name of the indexer instance.
    pub name: String,
    /// Height of the most recently applied block.
    pub last_height: u64,
    /// Hash of the most recently applied block.
    pub last_hash: B256,
    /// Timestamp of the most recently applied block.
    pub last_time: u64,
    /// Total transactions across all persisted blocks.
    pub total_tx: u64,
    /// Total live accounts.
    pub total_accounts: u64,
    /// Total live rollups.
    pub total_rollups: u64,
    /// Total live bridges.
    pub total_bridges: u64,
    /// Total token supply.
    pub total_supply: i128,
    /// Total bytes committed to rollups.
    pub total_bytes: u64,
}
