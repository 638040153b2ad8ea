//! Pure fold helpers shared by the forward apply and the rollback path.
//!
//! These fold a batch of per-action effects into the minimal set of aggregate
//! updates. Results are keyed with `BTreeMap` so batch writes happen in a
//! deterministic order regardless of input order.

use crate::models::{StoredAccountAction, StoredRollupAction, StoredTx};
use alloy_primitives::B256;
use std::collections::BTreeMap;

/// Counter reversals owed to one account by a rolled-back block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountAdjustment {
    /// How many action involvements to remove.
    pub actions_count: u64,
    /// How many signed transactions to remove.
    pub signed_tx_count: u64,
    /// Whether the account signed a rolled-back transaction, requiring a
    /// fresh nonce lookup over the remaining history.
    pub refresh_nonce: bool,
}

/// Counter reversals owed to one surviving rollup by a rolled-back block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollupAdjustment {
    /// How many actions to remove.
    pub actions_count: u64,
    /// How many contributed bytes to remove.
    pub size: u64,
}

/// Folds signed balance deltas into one net amount per (account, asset).
///
/// Zero nets are kept: the caller decides whether a zero delta still needs a
/// write (it never does, but dropping it here would hide information from
/// conservation checks in tests).
pub fn net_balance_changes(
    deltas: impl IntoIterator<Item = (u64, B256, i128)>,
) -> BTreeMap<(u64, B256), i128> {
    let mut net = BTreeMap::new();
    for (account_id, asset, amount) in deltas {
        *net.entry((account_id, asset)).or_insert(0i128) += amount;
    }
    net
}

/// Reconstructs the account-counter reversals for one rolled-back block.
///
/// Every account/action join row removes one action involvement; every
/// rolled-back transaction additionally removes one involvement and one
/// signed transaction from its signer. Each occurrence past the first only
/// deepens the in-memory accumulator, so the persisted row is read and
/// written once per account.
pub fn account_reversals(
    account_actions: &[StoredAccountAction],
    txs: &[StoredTx],
) -> BTreeMap<u64, AccountAdjustment> {
    let mut adjustments: BTreeMap<u64, AccountAdjustment> = BTreeMap::new();
    for row in account_actions {
        adjustments.entry(row.account_id).or_default().actions_count += 1;
    }
    for tx in txs {
        let adjustment = adjustments.entry(tx.signer_id).or_default();
        adjustment.actions_count += 1;
        adjustment.signed_tx_count += 1;
        adjustment.refresh_nonce = true;
    }
    adjustments
}

/// Reconstructs the rollup-counter reversals for one rolled-back block from
/// (join row, decoded payload byte length) pairs. Payload decoding happens at
/// the caller, where a failure is fatal.
pub fn rollup_reversals(
    actions: impl IntoIterator<Item = (StoredRollupAction, u64)>,
) -> BTreeMap<u64, RollupAdjustment> {
    let mut adjustments: BTreeMap<u64, RollupAdjustment> = BTreeMap::new();
    for (row, bytes) in actions {
        let adjustment = adjustments.entry(row.rollup_id).or_default();
        adjustment.actions_count += 1;
        adjustment.size += bytes;
    }
    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_balance_changes_folds_per_account_and_asset() {
        let asset_a = B256::repeat_byte(1);
        let asset_b = B256::repeat_byte(2);
        let net = net_balance_changes(vec![
            (1, asset_a, 10),
            (1, asset_a, -4),
            (1, asset_b, 3),
            (2, asset_a, 7),
        ]);
        assert_eq!(net.len(), 3);
        assert_eq!(net[&(1, asset_a)], 6);
        assert_eq!(net[&(1, asset_b)], 3);
        assert_eq!(net[&(2, asset_a)], 7);
    }

    #[test]
    fn net_balance_changes_keeps_zero_nets() {
        let asset = B256::repeat_byte(1);
        let net = net_balance_changes(vec![(1, asset, 5), (1, asset, -5)]);
        assert_eq!(net[&(1, asset)], 0);
    }

    #[test]
    fn account_reversals_accumulate_in_memory() {
        let actions = vec![
            StoredAccountAction { account_id: 1, kind: 0, time: 0 },
            StoredAccountAction { account_id: 1, kind: 1, time: 0 },
            StoredAccountAction { account_id: 2, kind: 0, time: 0 },
        ];
        let txs = vec![StoredTx {
            hash: B256::repeat_byte(9),
            signer_id: 1,
            nonce: 3,
            action_count: 2,
        }];
        let adjustments = account_reversals(&actions, &txs);
        assert_eq!(
            adjustments[&1],
            AccountAdjustment { actions_count: 3, signed_tx_count: 1, refresh_nonce: true }
        );
        assert_eq!(
            adjustments[&2],
            AccountAdjustment { actions_count: 1, signed_tx_count: 0, refresh_nonce: false }
        );
    }

    #[test]
    fn rollup_reversals_sum_actions_and_bytes() {
        let row = |rollup_id| StoredRollupAction { rollup_id, action_seq: 0, kind: 0, time: 0 };
        let adjustments = rollup_reversals(vec![(row(1), 10), (row(1), 5), (row(2), 7)]);
        assert_eq!(adjustments[&1], RollupAdjustment { actions_count: 2, size: 15 });
        assert_eq!(adjustments[&2], RollupAdjustment { actions_count: 1, size: 7 });
    }
}
