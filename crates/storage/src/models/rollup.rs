//! Rollup rows, join tables and per-height rollback indexes.

use super::{
    codec::{Reader, put_u8, put_u32, put_u64},
    keys::{BlockScopedKey, RollupAccountKey},
    list::{IdPairList, U64List},
};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// A unique child chain, keyed by internal id in [`Rollups`].
///
/// Created on first occurrence, merged additively thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
pub struct StoredRollup {
    /// Opaque rollup identifier.
    pub rollup_id: B256,
    /// Height at which the rollup first appeared.
    pub first_height: u64,
    /// Total actions targeting the rollup.
    pub actions_count: u64,
    /// Total bridges registered for the rollup.
    pub bridge_count: u64,
    /// Total bytes contributed to the rollup.
    pub size: u64,
}

/// Join row linking an action to the rollup it targeted.
///
/// Carries the action's sequence number so rollback can find the stored
/// payload and re-derive the byte size the action contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredRollupAction {
    /// Internal id of the targeted rollup.
    pub rollup_id: u64,
    /// Sequence number of the action within its block.
    pub action_seq: u32,
    /// Action kind discriminant.
    pub kind: u8,
    /// Block timestamp.
    pub time: u64,
}

impl Compact for StoredRollupAction {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.rollup_id) +
            put_u32(buf, self.action_seq) +
            put_u8(buf, self.kind) +
            put_u64(buf, self.time)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let row = Self {
            rollup_id: reader.u64(),
            action_seq: reader.u32(),
            kind: reader.u8(),
            time: reader.u64(),
        };
        (row, reader.rest())
    }
}

/// Rollups by internal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Rollups;

impl Table for Rollups {
    const NAME: &'static str = "rollups";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredRollup;
}

/// Internal rollup id by external identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupIds;

impl Table for RollupIds {
    const NAME: &'static str = "rollup_ids";
    const DUPSORT: bool = false;
    type Key = B256;
    type Value = u64;
}

/// Ids of rollups first created at a height. Rollback index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupsByHeight;

impl Table for RollupsByHeight {
    const NAME: &'static str = "rollups_by_height";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = U64List;
}

/// Rollup/action join rows, keyed by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupActions;

impl Table for RollupActions {
    const NAME: &'static str = "rollup_actions";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredRollupAction;
}

/// First height at which an account interacted with a rollup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupAccounts;

impl Table for RollupAccounts {
    const NAME: &'static str = "rollup_accounts";
    const DUPSORT: bool = false;
    type Key = RollupAccountKey;
    type Value = u64;
}

/// (rollup, account) pairs first joined at a height. Rollback index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupAccountsByHeight;

impl Table for RollupAccountsByHeight {
    const NAME: &'static str = "rollup_accounts_by_height";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = IdPairList;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollup_action_compact_roundtrip() {
        let row = StoredRollupAction { rollup_id: 3, action_seq: 11, kind: 0, time: 99 };
        let mut buf = Vec::new();
        let written = row.to_compact(&mut buf);
        let (decoded, rest) = StoredRollupAction::from_compact(&buf, written);
        assert_eq!(decoded, row);
        assert!(rest.is_empty());
    }
}
