//! Per-block entity deltas for accounts, rollups, bridges and validators.

use crate::AssetId;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// One account's net contribution within a single block.
///
/// The decoder folds every occurrence of an address inside a block into one
/// delta, so the indexer upserts each account at most once per block. An
/// account's `actions_count` counts the action links it appears in plus the
/// transactions it signed; the rollback path relies on that convention when
/// it reconstructs reversals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDelta {
    /// The account address.
    pub address: Address,
    /// Highest nonce observed for the account in this block.
    pub nonce: u32,
    /// Number of action involvements contributed by this block.
    pub actions_count: u64,
    /// Number of transactions signed by the account in this block.
    pub signed_tx_count: u64,
    /// Whether this block marks the account as a bridge account.
    pub is_bridge: bool,
    /// IBC relayer flag. `None` leaves the persisted value untouched.
    pub is_ibc_relayer: Option<bool>,
    /// Initial balances, persisted only when the account is first created.
    pub balances: Vec<(AssetId, i128)>,
}

/// One rollup's net contribution within a single block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupDelta {
    /// Opaque rollup identifier.
    pub rollup_id: B256,
    /// Number of actions targeting the rollup in this block.
    pub actions_count: u64,
    /// Number of bridges registered for the rollup in this block.
    pub bridge_count: u64,
    /// Bytes contributed to the rollup by this block.
    pub size: u64,
    /// Addresses that interacted with the rollup in this block.
    pub accounts: Vec<Address>,
}

/// A bridge account registration or partial update.
///
/// Optional fields follow partial-upsert semantics: `None` never overwrites
/// a previously persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDelta {
    /// The controlling bridge account.
    pub account: Address,
    /// Rollup this bridge moves value for.
    pub rollup_id: B256,
    /// Account allowed to reconfigure the bridge.
    pub sudo: Option<Address>,
    /// Account allowed to withdraw from the bridge.
    pub withdrawer: Option<Address>,
    /// Asset the bridge locks.
    pub asset: Option<AssetId>,
    /// Asset the bridge pays fees in.
    pub fee_asset: Option<AssetId>,
}

/// A validator set update carried by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// Validator public key.
    pub pubkey: B256,
    /// New voting power. Always refreshed on upsert.
    pub power: u64,
    /// Validator moniker. Empty strings leave the persisted name untouched.
    pub name: String,
}

/// An attestation over a block by one validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignature {
    /// Public key of the attesting validator.
    pub validator: B256,
}
