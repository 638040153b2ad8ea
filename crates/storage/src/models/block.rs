//! Block rows and their 1:1 statistics.

use super::codec::{Reader, put_i128, put_u64, put_u128};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// One committed block, keyed by height in [`Blocks`].
///
/// Created by the block applier; deleted by height on rollback. All dependent
/// rows are deleted explicitly, no cascades are assumed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
pub struct StoredBlock {
    /// Hash of the block.
    pub hash: B256,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Hash over the block's transaction data.
    pub data_hash: B256,
    /// Hash over the consensus parameters in effect.
    pub consensus_hash: B256,
    /// Internal id of the proposing validator.
    pub proposer_id: u64,
    /// Block timestamp, seconds since the Unix epoch.
    pub time: u64,
}

/// Per-block statistics, 1:1 with [`StoredBlock`] by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredBlockStats {
    /// Number of transactions in the block.
    pub tx_count: u64,
    /// Total serialized byte size of the block's transactions.
    pub bytes_total: u64,
    /// Sum of all fees charged in the block.
    pub fee_total: u128,
    /// Seconds elapsed since the previous head block.
    pub block_time: u64,
    /// Signed delta to the total token supply caused by this block.
    pub supply_change: i128,
}

impl Compact for StoredBlockStats {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.tx_count) +
            put_u64(buf, self.bytes_total) +
            put_u128(buf, self.fee_total) +
            put_u64(buf, self.block_time) +
            put_i128(buf, self.supply_change)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let stats = Self {
            tx_count: reader.u64(),
            bytes_total: reader.u64(),
            fee_total: reader.u128(),
            block_time: reader.u64(),
            supply_change: reader.i128(),
        };
        (stats, reader.rest())
    }
}

/// Blocks by height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Blocks;

impl Table for Blocks {
    const NAME: &'static str = "blocks";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredBlock;
}

/// Block statistics by height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BlockStats;

impl Table for BlockStats {
    const NAME: &'static str = "block_stats";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredBlockStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_stats_compact_roundtrip() {
        let stats = StoredBlockStats {
            tx_count: 12,
            bytes_total: 4096,
            fee_total: u128::MAX / 3,
            block_time: 2,
            supply_change: -77,
        };
        let mut buf = Vec::new();
        let written = stats.to_compact(&mut buf);
        assert_eq!(written, buf.len());
        let (decoded, rest) = StoredBlockStats::from_compact(&buf, written);
        assert_eq!(decoded, stats);
        assert!(rest.is_empty());
    }
}
