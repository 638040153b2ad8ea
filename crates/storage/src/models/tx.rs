//! Transaction, action and block-scoped fact rows.

use super::{
    codec::{Reader, put_b256, put_str, put_u8, put_u32, put_u64, put_u128},
    keys::BlockScopedKey,
};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// A persisted transaction, keyed by (height, index) in [`Transactions`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredTx {
    /// Transaction hash.
    pub hash: B256,
    /// Internal id of the signer account.
    pub signer_id: u64,
    /// Nonce used by the signer.
    pub nonce: u32,
    /// Number of actions carried.
    pub action_count: u32,
}

impl Compact for StoredTx {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_b256(buf, &self.hash) +
            put_u64(buf, self.signer_id) +
            put_u32(buf, self.nonce) +
            put_u32(buf, self.action_count)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let tx = Self {
            hash: reader.b256(),
            signer_id: reader.u64(),
            nonce: reader.u32(),
            action_count: reader.u32(),
        };
        (tx, reader.rest())
    }
}

/// A persisted action, keyed by (height, sequence) in [`Actions`].
///
/// The hex payload is stored verbatim; rollback byte accounting re-decodes it
/// and treats malformed payloads as corrupted history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredAction {
    /// Index of the carrying transaction within the block.
    pub tx_index: u32,
    /// Action kind discriminant.
    pub kind: u8,
    /// Hex-encoded payload as submitted on chain.
    pub data: String,
}

impl Compact for StoredAction {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u32(buf, self.tx_index) + put_u8(buf, self.kind) + put_str(buf, &self.data)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let action = Self { tx_index: reader.u32(), kind: reader.u8(), data: reader.string() };
        (action, reader.rest())
    }
}

/// A fee charged for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredFee {
    /// Index of the carrying transaction within the block.
    pub tx_index: u32,
    /// Internal id of the paying account.
    pub payer_id: u64,
    /// Asset the fee was paid in.
    pub asset: B256,
    /// Fee amount.
    pub amount: u128,
}

impl Compact for StoredFee {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u32(buf, self.tx_index) +
            put_u64(buf, self.payer_id) +
            put_b256(buf, &self.asset) +
            put_u128(buf, self.amount)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let fee = Self {
            tx_index: reader.u32(),
            payer_id: reader.u64(),
            asset: reader.b256(),
            amount: reader.u128(),
        };
        (fee, reader.rest())
    }
}

/// A deposit into a rollup through a bridge account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredDeposit {
    /// Internal id of the receiving bridge.
    pub bridge_id: u64,
    /// Internal id of the destination rollup.
    pub rollup_id: u64,
    /// Asset deposited.
    pub asset: B256,
    /// Amount deposited.
    pub amount: u128,
    /// Recipient on the rollup side.
    pub destination: String,
}

impl Compact for StoredDeposit {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.bridge_id) +
            put_u64(buf, self.rollup_id) +
            put_b256(buf, &self.asset) +
            put_u128(buf, self.amount) +
            put_str(buf, &self.destination)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let deposit = Self {
            bridge_id: reader.u64(),
            rollup_id: reader.u64(),
            asset: reader.b256(),
            amount: reader.u128(),
            destination: reader.string(),
        };
        (deposit, reader.rest())
    }
}

/// A plain value transfer between two accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredTransfer {
    /// Internal id of the sending account.
    pub sender_id: u64,
    /// Internal id of the receiving account.
    pub recipient_id: u64,
    /// Asset transferred.
    pub asset: B256,
    /// Amount transferred.
    pub amount: u128,
}

impl Compact for StoredTransfer {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_u64(buf, self.sender_id) +
            put_u64(buf, self.recipient_id) +
            put_b256(buf, &self.asset) +
            put_u128(buf, self.amount)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let transfer = Self {
            sender_id: reader.u64(),
            recipient_id: reader.u64(),
            asset: reader.b256(),
            amount: reader.u128(),
        };
        (transfer, reader.rest())
    }
}

/// Transactions by (height, index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Transactions;

impl Table for Transactions {
    const NAME: &'static str = "transactions";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredTx;
}

/// Actions by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Actions;

impl Table for Actions {
    const NAME: &'static str = "actions";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredAction;
}

/// Fees by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Fees;

impl Table for Fees {
    const NAME: &'static str = "fees";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredFee;
}

/// Deposits by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Deposits;

impl Table for Deposits {
    const NAME: &'static str = "deposits";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredDeposit;
}

/// Transfers by (height, sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Transfers;

impl Table for Transfers {
    const NAME: &'static str = "transfers";
    const DUPSORT: bool = false;
    type Key = BlockScopedKey;
    type Value = StoredTransfer;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_action_compact_roundtrip() {
        let action =
            StoredAction { tx_index: 1, kind: 0, data: "deadbeef".to_string() };
        let mut buf = Vec::new();
        let written = action.to_compact(&mut buf);
        let (decoded, rest) = StoredAction::from_compact(&buf, written);
        assert_eq!(decoded, action);
        assert!(rest.is_empty());
    }

    #[test]
    fn stored_deposit_compact_roundtrip() {
        let deposit = StoredDeposit {
            bridge_id: 7,
            rollup_id: 2,
            asset: B256::repeat_byte(2),
            amount: 1_000_000,
            destination: "0xabc123".to_string(),
        };
        let mut buf = Vec::new();
        let written = deposit.to_compact(&mut buf);
        let (decoded, rest) = StoredDeposit::from_compact(&buf, written);
        assert_eq!(decoded, deposit);
        assert!(rest.is_empty());
    }
}
