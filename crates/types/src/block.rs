//! The decoded block and its nested transaction/action payloads.

use crate::{AccountDelta, AssetId, BlockSignature, BridgeDelta, RollupDelta, ValidatorUpdate};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// One fully-decoded block as delivered by the upstream decoder.
///
/// All nested entities are populated, but no internal-id foreign keys are
/// resolved; resolution happens inside the applying transaction. The
/// per-block entity lists (`accounts`, `rollups`, `bridges`) are deduplicated
/// by the decoder and carry the block's net contribution per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBlock {
    /// Height of the block. Strictly monotonic per chain.
    pub height: u64,
    /// Hash of the block.
    pub hash: B256,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Public key of the validator that proposed the block.
    pub proposer: B256,
    /// Hash over the block's transaction data.
    pub data_hash: B256,
    /// Hash over the consensus parameters in effect.
    pub consensus_hash: B256,
    /// Block timestamp, seconds since the Unix epoch.
    pub time: u64,
    /// Precomputed per-block totals.
    pub totals: BlockTotals,
    /// Accounts referenced anywhere in the block, deduplicated by address.
    pub accounts: Vec<AccountDelta>,
    /// Signed transactions in block order.
    pub txs: Vec<SignedTx>,
    /// Rollups touched by the block, deduplicated by rollup id.
    pub rollups: Vec<RollupDelta>,
    /// Bridge account registrations or updates.
    pub bridges: Vec<BridgeDelta>,
    /// Validator set updates taking effect after this block.
    pub validators: Vec<ValidatorUpdate>,
    /// Attestations over the previous block by known validators.
    pub signatures: Vec<BlockSignature>,
}

/// Summary statistics the decoder derives for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockTotals {
    /// Number of transactions in the block.
    pub tx_count: u64,
    /// Total serialized byte size of the block's transactions.
    pub bytes_total: u64,
    /// Sum of all fees charged in the block.
    pub fee_total: u128,
    /// Signed delta to the total token supply caused by this block.
    pub supply_change: i128,
}

/// A signed transaction with its decoded actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    /// Transaction hash.
    pub hash: B256,
    /// Address that signed the transaction.
    pub signer: Address,
    /// Nonce used by the signer.
    pub nonce: u32,
    /// Actions carried by the transaction, in execution order.
    pub actions: Vec<Action>,
}

/// A single state-changing operation inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// What the action does.
    pub kind: ActionKind,
    /// Rollup this action contributes data to, if any.
    pub rollup: Option<B256>,
    /// Hex-encoded action payload as submitted on chain.
    pub data: String,
    /// Addresses this action affected, in decoder order.
    pub accounts: Vec<Address>,
    /// Balance deltas caused by this action.
    pub balance_deltas: Vec<BalanceDelta>,
    /// Fee charged for this action, if any.
    pub fee: Option<Fee>,
    /// Bridge deposit carried by this action, if any.
    pub deposit: Option<Deposit>,
    /// Value transfer carried by this action, if any.
    pub transfer: Option<Transfer>,
}

/// Kind discriminant for [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Data submission to a rollup.
    RollupDataSubmission,
    /// Native asset transfer.
    Transfer,
    /// Lock of funds into a bridge account.
    BridgeLock,
    /// Unlock of funds out of a bridge account.
    BridgeUnlock,
    /// Registration of a new bridge account.
    InitBridgeAccount,
    /// Change of a bridge account's sudo or withdrawer role.
    BridgeSudoChange,
    /// Validator power update.
    ValidatorUpdate,
    /// IBC relay message.
    IbcRelay,
    /// Fee parameter change.
    FeeChange,
}

impl ActionKind {
    /// Stable wire discriminant used by the storage layer.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::RollupDataSubmission => 0,
            Self::Transfer => 1,
            Self::BridgeLock => 2,
            Self::BridgeUnlock => 3,
            Self::InitBridgeAccount => 4,
            Self::BridgeSudoChange => 5,
            Self::ValidatorUpdate => 6,
            Self::IbcRelay => 7,
            Self::FeeChange => 8,
        }
    }

    /// Inverse of [`Self::as_u8`]. Returns `None` for unknown discriminants.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::RollupDataSubmission),
            1 => Some(Self::Transfer),
            2 => Some(Self::BridgeLock),
            3 => Some(Self::BridgeUnlock),
            4 => Some(Self::InitBridgeAccount),
            5 => Some(Self::BridgeSudoChange),
            6 => Some(Self::ValidatorUpdate),
            7 => Some(Self::IbcRelay),
            8 => Some(Self::FeeChange),
            _ => None,
        }
    }
}

/// A signed balance delta applied to one account and asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Account whose balance changes.
    pub account: Address,
    /// Asset the delta applies to.
    pub asset: AssetId,
    /// Signed amount. Positive credits, negative debits.
    pub amount: i128,
}

/// A fee charged for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Account the fee was charged to.
    pub payer: Address,
    /// Asset the fee was paid in.
    pub asset: AssetId,
    /// Fee amount.
    pub amount: u128,
}

/// A deposit into a rollup through a bridge account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// The bridge account receiving the deposit.
    pub bridge: Address,
    /// Destination rollup, when it differs from the bridge's default.
    pub rollup: Option<B256>,
    /// Asset deposited.
    pub asset: AssetId,
    /// Amount deposited.
    pub amount: u128,
    /// Recipient on the rollup side, in the rollup's own address format.
    pub destination: String,
}

/// A plain value transfer between two accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Sending account.
    pub sender: Address,
    /// Receiving account.
    pub recipient: Address,
    /// Asset transferred.
    pub asset: AssetId,
    /// Amount transferred.
    pub amount: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_discriminants_roundtrip() {
        let kinds = [
            ActionKind::RollupDataSubmission,
            ActionKind::Transfer,
            ActionKind::BridgeLock,
            ActionKind::BridgeUnlock,
            ActionKind::InitBridgeAccount,
            ActionKind::BridgeSudoChange,
            ActionKind::ValidatorUpdate,
            ActionKind::IbcRelay,
            ActionKind::FeeChange,
        ];
        for kind in kinds {
            assert_eq!(ActionKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(ActionKind::from_u8(200), None);
    }
}
