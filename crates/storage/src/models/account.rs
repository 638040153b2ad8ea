//! Account rows, id lookups, balances and the append-only balance ledger.

use super::{
    codec::{Reader, put_address, put_b256, put_bool, put_i128, put_u8, put_u32, put_u64},
    keys::{BalanceKey, BlockScopedKey},
    list::U64List,
};
use alloy_primitives::Address;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// A deduplicated account, keyed by internal id in [`Accounts`].
///
/// Counters are additive across blocks; the nonce advances by max-merge.
/// Created on first occurrence and deleted only when the block that created
/// it is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredAccount {
    /// The account address.
    pub address: Address,
    /// Height at which the account first appeared.
    pub first_height: u64,
    /// Highest nonce observed for the account.
    pub nonce: u32,
    /// Total action involvements plus transactions signed.
    pub actions_count: u64,
    /// Total transactions signed.
    pub signed_tx_count: u64,
    /// Whether the account is a bridge account.
    pub is_bridge: bool,
    /// Whether the account has acted as an IBC relayer.
    pub is_ibc_relayer: bool,
}

impl Compact for StoredAccount {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_address(buf, &self.address) +
            put_u64(buf, self.first_height) +
            put_u32(buf, self.nonce) +
            put_u64(buf, self.actions_count) +
            put_u64(buf, self.signed_tx_count) +
            put_bool(buf, self.is_bridge) +
            put_bool(buf, self.is_ibc_relayer)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let account = Self {
            address: reader.address(),
            first_height: reader.u64(),
            nonce: reader.u32(),
            actions_count: reader.u64(),
            signed_tx_count: reader.u64(),
            is_bridge: reader.bool(),
            is_ibc_relayer: reader.bool(),
        };
        (account, reader.rest())
    }
}

/// A materialized per-account, per-asset running total.
///
/// Not an event log: mutated only by applying or reversing balance updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredBalance {
    /// Current total.
    pub total: i128,
}

impl Compact for StoredBalance {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_i128(buf, self.total)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let balance = Self { total: reader.i128() };
        (balance, reader.rest())
    }
}

/// An immutable signed balance delta, the ledger [`StoredBalance`] is derived
/// from. Never mutated; deleted only on rollback of its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredBalanceUpdate {
    /// Internal id of the affected account.
    pub account_id: u64,
    /// Asset the delta applies to.
    pub asset: alloy_primitives::B256,
    /// Signed amount.
    pub amount: i128,
}

impl Compact for StoredBalanceUpdate {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.account_id) + put_b256(buf, &self.asset) + put_i128(buf, self.amount)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let update = Self { account_id: reader.u64(), asset: reader.b256(), amount: reader.i128() };
        (update, reader.rest())
    }
}

/// Join row linking an action to an account it affected, denormalized enough
/// to support rollback without re-reading the action payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredAccountAction {
    /// Internal id of the affected account.
    pub account_id: u64,
    /// Action kind discriminant.
    pub kind: u8,
    /// Block timestamp.
    pub time: u64,
}

impl Compact for StoredAccountAction {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.account_id) + put_u8(buf, self.kind) + put_u64(buf, self.time)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let row = Self { account_id: reader.u64(), kind: reader.u8(), time: reader.u64() };
        (row, reader.rest())
    }
}

/// Accounts by internal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Accounts;

impl Table for Accounts {
    const NAME: &'static str = "accounts";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredAccount;
}

/// Internal account id by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountIds;

impl Table for AccountIds {
    const NAME: &'static str = "account_ids";
    const DUPSORT: bool = false;
    type Key = Address;
    type Value = u64;
}

/// Ids of accounts first created at a height. Rollback index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountsByHeight;

impl Table for AccountsByHeight {
    const NAME: &'static str = "accounts_by_height";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = U64List;
}

/// Balances by (account, asset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Balances;

impl Table for Balances {
    const NAME: &'static str = "balances";
    const DUPSORT: bool = false;
    type Key = BalanceKey;
    type Value = StoredBalance;
}

/// The append-only balance ledger, keyed by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BalanceUpdates;

impl Table for BalanceUpdates {
    const NAME: &'static str = "balance_updates";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredBalanceUpdate;
}

/// Account/action join rows, keyed by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountActions;

impl Table for AccountActions {
    const NAME: &'static str = "account_actions";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredAccountAction;
}
