//! Bridge account rows and lookups.

use super::{
    codec::{Reader, put_opt_b256, put_opt_u64, put_u64},
    list::U64List,
};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// A bridge account, keyed by internal id in [`Bridges`] and unique per
/// controlling account.
///
/// Upserted with partial-field semantics: only fields the incoming delta
/// actually sets overwrite existing values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredBridge {
    /// Internal id of the controlling account.
    pub account_id: u64,
    /// Internal id of the rollup the bridge serves.
    pub rollup_id: u64,
    /// Internal id of the sudo account, if configured.
    pub sudo_id: Option<u64>,
    /// Internal id of the withdrawer account, if configured.
    pub withdrawer_id: Option<u64>,
    /// Asset the bridge locks, if configured.
    pub asset: Option<B256>,
    /// Asset the bridge pays fees in, if configured.
    pub fee_asset: Option<B256>,
    /// Height at which the bridge was registered.
    pub init_height: u64,
}

impl Compact for StoredBridge {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.account_id) +
            put_u64(buf, self.rollup_id) +
            put_opt_u64(buf, self.sudo_id) +
            put_opt_u64(buf, self.withdrawer_id) +
            put_opt_b256(buf, &self.asset) +
            put_opt_b256(buf, &self.fee_asset) +
            put_u64(buf, self.init_height)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let bridge = Self {
            account_id: reader.u64(),
            rollup_id: reader.u64(),
            sudo_id: reader.opt_u64(),
            withdrawer_id: reader.opt_u64(),
            asset: reader.opt_b256(),
            fee_asset: reader.opt_b256(),
            init_height: reader.u64(),
        };
        (bridge, reader.rest())
    }
}

/// Bridges by internal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Bridges;

impl Table for Bridges {
    const NAME: &'static str = "bridges";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredBridge;
}

/// Bridge id by controlling account id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BridgeIds;

impl Table for BridgeIds {
    const NAME: &'static str = "bridge_ids";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = u64;
}

/// Ids of bridges registered at a height. Rollback index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BridgesByHeight;

impl Table for BridgesByHeight {
    const NAME: &'static str = "bridges_by_height";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = U64List;
}
