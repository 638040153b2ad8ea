//! Reversal of the most recently applied block.
//!
//! The walk order is capture-then-delete: every block-scoped row is read and
//! removed in one pass, then the captured rows drive the aggregate reversals.
//! Any error aborts the enclosing transaction, so a failed rollback leaves
//! the projection exactly as it was.

use super::StateProvider;
use crate::{
    aggregate,
    error::StorageError,
    models::{
        AccountActions, AccountIds, Accounts, AccountsByHeight, Actions, BalanceKey,
        BalanceUpdates, Balances, BlockScopedKey, BlockSignatures, BlockStats, Blocks, BridgeIds,
        Bridges, BridgesByHeight, Deposits, Fees, RollupAccountKey, RollupAccounts,
        RollupAccountsByHeight, RollupActions, RollupIds, Rollups, RollupsByHeight, SignatureKey,
        StoredAccount, StoredAccountAction, StoredAction, StoredBalance, StoredBalanceUpdate,
        StoredBridge, StoredRollup, StoredRollupAction, StoredState, StoredTx, StoredValidator,
        Transactions, Transfers, ValidatorIds, Validators, ValidatorsByHeight,
    },
};
use alloy_primitives::{B256, hex};
use reth_db_api::{
    cursor::{DbCursorRO, DbCursorRW},
    table::Table,
    transaction::{DbTx, DbTxMut},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Reverses the head block within a transaction.
#[derive(Debug)]
pub(crate) struct RollbackProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> RollbackProvider<'tx, TX> {
    /// Creates a new [`RollbackProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> RollbackProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Discards the head block and reverses every aggregate it produced.
    /// Returns the corrected state.
    pub(crate) fn rollback_block(&self) -> Result<StoredState, StorageError> {
        let state_provider = StateProvider::new(self.tx);
        let (height, _) = state_provider
            .head_block()?
            .ok_or_else(|| StorageError::EntryNotFound("no block to roll back".to_string()))?;
        let stats = self
            .tx
            .get::<BlockStats>(height)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("block stats at {height}")))?;

        self.tx.delete::<Blocks>(height, None)?;
        self.tx.delete::<BlockStats>(height, None)?;

        // Capture everything block-scoped before touching aggregates.
        let txs = self.drain_height::<Transactions>(height)?;
        let actions = self.drain_height::<Actions>(height)?;
        let account_actions = self.drain_height::<AccountActions>(height)?;
        let rollup_actions = self.drain_height::<RollupActions>(height)?;
        let balance_updates = self.drain_height::<BalanceUpdates>(height)?;
        self.drain_height::<Fees>(height)?;
        self.drain_height::<Deposits>(height)?;
        self.drain_height::<Transfers>(height)?;

        let deleted_accounts = self.delete_created_accounts(height)?;
        self.reverse_account_counters(&account_actions, &txs, &deleted_accounts)?;
        self.reverse_balances(&balance_updates, &deleted_accounts)?;

        let deleted_rollups = self.delete_created_rollups(height)?;
        let reversed_bytes =
            self.reverse_rollup_counters(height, &rollup_actions, &actions, &deleted_rollups)?;
        self.delete_rollup_joins(height)?;

        self.delete_created_validators(height)?;
        self.delete_signatures(height)?;
        let deleted_bridges = self.delete_created_bridges(height, &deleted_rollups)?;

        let mut state = state_provider.require_state()?;
        match state_provider.head_block()? {
            Some((new_height, new_head)) => {
                state.last_height = new_height;
                state.last_hash = new_head.hash;
                state.last_time = new_head.time;
            }
            None => {
                state.last_height = 0;
                state.last_hash = B256::ZERO;
                state.last_time = 0;
            }
        }
        state.total_tx = state.total_tx.saturating_sub(stats.tx_count);
        state.total_accounts = state.total_accounts.saturating_sub(deleted_accounts.len() as u64);
        state.total_rollups = state.total_rollups.saturating_sub(deleted_rollups.len() as u64);
        state.total_bridges = state.total_bridges.saturating_sub(deleted_bridges);
        state.total_supply = state.total_supply.checked_sub(stats.supply_change).ok_or(
            StorageError::Conflict(format!("total supply underflow rolling back {height}")),
        )?;
        state.total_bytes = state.total_bytes.saturating_sub(reversed_bytes);
        state_provider.put_state(state.clone())?;

        warn!(
            target: "tideline_storage",
            height,
            new_head = state.last_height,
            deleted_accounts = deleted_accounts.len(),
            deleted_rollups = deleted_rollups.len(),
            "Rolled back block"
        );
        Ok(state)
    }

    /// Deletes and returns every row of a block-scoped table at `height`, in
    /// sequence order.
    fn drain_height<T>(&self, height: u64) -> Result<Vec<T::Value>, StorageError>
    where
        T: Table<Key = BlockScopedKey>,
    {
        let mut cursor = self.tx.cursor_write::<T>()?;
        let mut walker =
            cursor.walk_range(BlockScopedKey::first(height)..=BlockScopedKey::last(height))?;
        let mut rows = Vec::new();
        while let Some(entry) = walker.next() {
            let (_, value) = entry?;
            rows.push(value);
            walker.delete_current()?;
        }
        Ok(rows)
    }

    /// Deletes accounts first created at `height`, their id lookups and all
    /// their balances. Returns the deleted ids.
    fn delete_created_accounts(&self, height: u64) -> Result<HashSet<u64>, StorageError> {
        let created = self.tx.get::<AccountsByHeight>(height)?.map(|list| list.0).unwrap_or_default();
        self.tx.delete::<AccountsByHeight>(height, None)?;

        let mut deleted = HashSet::with_capacity(created.len());
        for id in created {
            let account = self.require_account(id)?;
            self.tx.delete::<Accounts>(id, None)?;
            self.tx.delete::<AccountIds>(account.address, None)?;

            let mut cursor = self.tx.cursor_write::<Balances>()?;
            let mut walker = cursor.walk_range(BalanceKey::first(id)..=BalanceKey::last(id))?;
            while let Some(entry) = walker.next() {
                entry?;
                walker.delete_current()?;
            }
            deleted.insert(id);
        }
        Ok(deleted)
    }

    /// Reverses per-account counters for accounts that survive the rollback.
    /// A signer's nonce cannot be decremented blindly; it is recomputed from
    /// the remaining transaction history.
    fn reverse_account_counters(
        &self,
        account_actions: &[StoredAccountAction],
        txs: &[StoredTx],
        deleted: &HashSet<u64>,
    ) -> Result<(), StorageError> {
        let adjustments = aggregate::account_reversals(account_actions, txs);
        let signers: HashSet<u64> = adjustments
            .iter()
            .filter(|(id, adjustment)| adjustment.refresh_nonce && !deleted.contains(*id))
            .map(|(id, _)| *id)
            .collect();
        let nonces = self.remaining_max_nonces(&signers)?;

        for (account_id, adjustment) in adjustments {
            if deleted.contains(&account_id) {
                continue;
            }
            let mut account = self.require_account(account_id)?;
            account.actions_count = account.actions_count.saturating_sub(adjustment.actions_count);
            account.signed_tx_count =
                account.signed_tx_count.saturating_sub(adjustment.signed_tx_count);
            if adjustment.refresh_nonce {
                account.nonce = nonces.get(&account_id).copied().unwrap_or_default();
            }
            self.tx.put::<Accounts>(account_id, account)?;
        }
        Ok(())
    }

    /// Highest nonce each of `signers` used in any surviving transaction,
    /// gathered in a single table walk.
    fn remaining_max_nonces(
        &self,
        signers: &HashSet<u64>,
    ) -> Result<HashMap<u64, u32>, StorageError> {
        let mut nonces = HashMap::with_capacity(signers.len());
        if signers.is_empty() {
            return Ok(nonces);
        }
        let mut cursor = self.tx.cursor_read::<Transactions>()?;
        let mut walker = cursor.walk(None)?;
        while let Some(entry) = walker.next() {
            let (_, tx) = entry?;
            if signers.contains(&tx.signer_id) {
                let max_nonce = nonces.entry(tx.signer_id).or_insert(0u32);
                *max_nonce = (*max_nonce).max(tx.nonce);
            }
        }
        Ok(nonces)
    }

    /// Subtracts the net balance change per (account, asset). Accounts whose
    /// rows were just deleted are skipped; a surviving account whose balance
    /// row is missing gets one recreated from the negated net. A reversal
    /// landing on zero deletes the row, since a zero total reads the same as
    /// an absent one and rows this block created must not leave residue.
    fn reverse_balances(
        &self,
        updates: &[StoredBalanceUpdate],
        deleted: &HashSet<u64>,
    ) -> Result<(), StorageError> {
        let net = aggregate::net_balance_changes(
            updates.iter().map(|update| (update.account_id, update.asset, update.amount)),
        );
        for ((account_id, asset), amount) in net {
            if amount == 0 || deleted.contains(&account_id) {
                continue;
            }
            let key = BalanceKey { account_id, asset };
            let balance = self.tx.get::<Balances>(key)?.unwrap_or_default();
            let total = balance.total.checked_sub(amount).ok_or_else(|| {
                StorageError::Conflict(format!("balance underflow for account {account_id}"))
            })?;
            if total == 0 {
                self.tx.delete::<Balances>(key, None)?;
            } else {
                self.tx.put::<Balances>(key, StoredBalance { total })?;
            }
        }
        Ok(())
    }

    /// Deletes rollups first created at `height` and their id lookups.
    fn delete_created_rollups(&self, height: u64) -> Result<HashSet<u64>, StorageError> {
        let created = self.tx.get::<RollupsByHeight>(height)?.map(|list| list.0).unwrap_or_default();
        self.tx.delete::<RollupsByHeight>(height, None)?;

        let mut deleted = HashSet::with_capacity(created.len());
        for id in created {
            let rollup = self.require_rollup(id)?;
            self.tx.delete::<Rollups>(id, None)?;
            self.tx.delete::<RollupIds>(rollup.rollup_id, None)?;
            deleted.insert(id);
        }
        Ok(deleted)
    }

    /// Re-derives the byte size every rolled-back rollup action contributed
    /// by decoding its stored payload, reverses surviving rollup counters,
    /// and returns the total bytes to remove from the network state.
    ///
    /// A payload that no longer decodes is corrupted history; continuing
    /// would desynchronize byte totals, so the whole rollback fails.
    fn reverse_rollup_counters(
        &self,
        height: u64,
        rollup_actions: &[StoredRollupAction],
        actions: &[StoredAction],
        deleted: &HashSet<u64>,
    ) -> Result<u64, StorageError> {
        let mut reversed_bytes = 0u64;
        let mut surviving = Vec::with_capacity(rollup_actions.len());
        for row in rollup_actions {
            // Action sequence numbers are dense within a block, so the drain
            // position doubles as the lookup index.
            let action = actions.get(row.action_seq as usize).ok_or_else(|| {
                StorageError::EntryNotFound(format!("action {} at {height}", row.action_seq))
            })?;
            let bytes = hex::decode(&action.data)
                .map_err(|_| StorageError::MalformedPayload { height, seq: row.action_seq })?
                .len() as u64;
            reversed_bytes += bytes;
            if !deleted.contains(&row.rollup_id) {
                surviving.push((*row, bytes));
            }
        }

        for (rollup_id, adjustment) in aggregate::rollup_reversals(surviving) {
            let mut rollup = self.require_rollup(rollup_id)?;
            rollup.actions_count = rollup.actions_count.saturating_sub(adjustment.actions_count);
            rollup.size = rollup.size.saturating_sub(adjustment.size);
            self.tx.put::<Rollups>(rollup_id, rollup)?;
        }
        Ok(reversed_bytes)
    }

    /// Deletes (rollup, account) join rows first recorded at `height`.
    fn delete_rollup_joins(&self, height: u64) -> Result<(), StorageError> {
        let joined =
            self.tx.get::<RollupAccountsByHeight>(height)?.map(|list| list.0).unwrap_or_default();
        self.tx.delete::<RollupAccountsByHeight>(height, None)?;
        for (rollup_id, account_id) in joined {
            self.tx.delete::<RollupAccounts>(RollupAccountKey { rollup_id, account_id }, None)?;
        }
        Ok(())
    }

    /// Deletes validators first seen at `height` and their id lookups.
    fn delete_created_validators(&self, height: u64) -> Result<(), StorageError> {
        let created =
            self.tx.get::<ValidatorsByHeight>(height)?.map(|list| list.0).unwrap_or_default();
        self.tx.delete::<ValidatorsByHeight>(height, None)?;
        for id in created {
            let validator = self.require_validator(id)?;
            self.tx.delete::<Validators>(id, None)?;
            self.tx.delete::<ValidatorIds>(validator.pubkey, None)?;
        }
        Ok(())
    }

    /// Deletes every attestation recorded at `height`. Rows past the
    /// retention window may already be pruned; an empty range is a no-op.
    fn delete_signatures(&self, height: u64) -> Result<(), StorageError> {
        let mut cursor = self.tx.cursor_write::<BlockSignatures>()?;
        let mut walker = cursor.walk_range(
            SignatureKey { height, validator_id: 0 }..=
                SignatureKey { height, validator_id: u64::MAX },
        )?;
        while let Some(entry) = walker.next() {
            entry?;
            walker.delete_current()?;
        }
        Ok(())
    }

    /// Deletes bridges registered at `height` and their id lookups, giving
    /// each deleted bridge's registration back to its owning rollup when that
    /// rollup survives the rollback. Returns how many were deleted.
    fn delete_created_bridges(
        &self,
        height: u64,
        deleted_rollups: &HashSet<u64>,
    ) -> Result<u64, StorageError> {
        let created =
            self.tx.get::<BridgesByHeight>(height)?.map(|list| list.0).unwrap_or_default();
        self.tx.delete::<BridgesByHeight>(height, None)?;
        let deleted = created.len() as u64;
        for id in created {
            let bridge = self.require_bridge(id)?;
            self.tx.delete::<Bridges>(id, None)?;
            self.tx.delete::<BridgeIds>(bridge.account_id, None)?;
            if !deleted_rollups.contains(&bridge.rollup_id) {
                let mut rollup = self.require_rollup(bridge.rollup_id)?;
                rollup.bridge_count = rollup.bridge_count.saturating_sub(1);
                self.tx.put::<Rollups>(bridge.rollup_id, rollup)?;
            }
        }
        if deleted > 0 {
            debug!(target: "tideline_storage", height, deleted, "Deleted bridges at rolled-back height");
        }
        Ok(deleted)
    }

    fn require_account(&self, id: u64) -> Result<StoredAccount, StorageError> {
        self.tx
            .get::<Accounts>(id)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("account {id}")))
    }

    fn require_rollup(&self, id: u64) -> Result<StoredRollup, StorageError> {
        self.tx
            .get::<Rollups>(id)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("rollup {id}")))
    }

    fn require_bridge(&self, id: u64) -> Result<StoredBridge, StorageError> {
        self.tx
            .get::<Bridges>(id)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("bridge {id}")))
    }

    fn require_validator(&self, id: u64) -> Result<StoredValidator, StorageError> {
        self.tx
            .get::<Validators>(id)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("validator {id}")))
    }
}
