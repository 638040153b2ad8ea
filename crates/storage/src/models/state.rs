//! The singleton indexer state row.

use super::codec::{Reader, put_b256, put_i128, put_str, put_u64};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};
use tideline_types::NetworkState;

/// Fixed key of the singleton state row.
pub const STATE_KEY: u64 = 0;

/// The persisted indexing summary. Exactly one row per indexer instance,
/// rewritten once per applied or rolled-back block inside that block's
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredState {
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

impl Compact for StoredState {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_str(buf, &self.name) +
            put_u64(buf, self.last_height) +
            put_b256(buf, &self.last_hash) +
            put_u64(buf, self.last_time) +
            put_u64(buf, self.total_tx) +
            put_u64(buf, self.total_accounts) +
            put_u64(buf, self.total_rollups) +
            put_u64(buf, self.total_bridges) +
            put_i128(buf, self.total_supply) +
            put_u64(buf, self.total_bytes)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let state = Self {
            name: reader.string(),
            last_height: reader.u64(),
            last_hash: reader.b256(),
            last_time: reader.u64(),
            total_tx: reader.u64(),
            total_accounts: reader.u64(),
            total_rollups: reader.u64(),
            total_bridges: reader.u64(),
            total_supply: reader.i128(),
            total_bytes: reader.u64(),
        };
        (state, reader.rest())
    }
}

impl From<StoredState> for NetworkState {
    fn from(state: StoredState) -> Self {
        Self {
            name: state.name,
            last_height: state.last_height,
            last_hash: state.last_hash,
            last_time: state.last_time,
            total_tx: state.total_tx,
            total_accounts: state.total_accounts,
            total_rollups: state.total_rollups,
            total_bridges: state.total_bridges,
            total_supply: state.total_supply,
            total_bytes: state.total_bytes,
        }
    }
}

/// The singleton state table. Always keyed by [`STATE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct IndexerState;

impl Table for IndexerState {
    const NAME: &'static str = "indexer_state";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredState;
}
