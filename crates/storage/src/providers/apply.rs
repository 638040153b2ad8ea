//! Forward projection of one decoded block.
//!
//! Everything here runs inside one caller-owned read-write transaction. Write
//! order within a batch is fixed by sorting on the natural key, so two
//! indexers applying the same block produce byte-identical databases.

use super::StateProvider;
use crate::{
    SIGNATURE_PRUNE_INTERVAL, SIGNATURE_RETENTION,
    error::StorageError,
    models::{
        AccountActions, AccountIds, Accounts, AccountsByHeight, Actions, BalanceKey,
        BalanceUpdates, Balances, BlockScopedKey, BlockSignatures, BlockStats, Blocks, BridgeIds,
        Bridges, BridgesByHeight, Deposits, Fees, IdPairList, RollupAccountKey, RollupAccounts,
        RollupAccountsByHeight, RollupActions, RollupIds, Rollups, RollupsByHeight, SignatureKey,
        StoredAccount, StoredAccountAction, StoredAction, StoredBalance, StoredBalanceUpdate,
        StoredBlock, StoredBlockStats, StoredBridge, StoredDeposit, StoredFee, StoredRollup,
        StoredRollupAction, StoredState, StoredTransfer, StoredTx, StoredValidator, Transactions,
        Transfers, U64List, ValidatorIds, Validators, ValidatorsByHeight,
    },
    traits::ApplyOutcome,
};
use alloy_primitives::{Address, B256};
use reth_db_api::{
    cursor::{DbCursorRO, DbCursorRW},
    table::Table,
    transaction::{DbTx, DbTxMut},
};
use std::collections::HashMap;
use tideline_types::{DecodedBlock, Deposit, ValidatorUpdate};
use tracing::{debug, warn};

/// Applies one decoded block within a transaction.
#[derive(Debug)]
pub(crate) struct ApplyProvider<'tx, TX> {
    tx: &'tx TX,
    instance: &'tx str,
}

impl<'tx, TX> ApplyProvider<'tx, TX> {
    /// Creates a new [`ApplyProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX, instance: &'tx str) -> Self {
        Self { tx, instance }
    }
}

impl<TX> ApplyProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Projects `block` into the database.
    ///
    /// Duplicate deliveries (height at or below the persisted head) return
    /// without writing. A height gap or a parent-hash mismatch is a conflict:
    /// the caller must roll back before re-applying.
    pub(crate) fn apply_block(
        &self,
        block: &DecodedBlock,
        known_validators: &HashMap<B256, u64>,
    ) -> Result<ApplyOutcome, StorageError> {
        let state_provider = StateProvider::new(self.tx);
        let mut state = state_provider.get_state()?.unwrap_or_else(|| StoredState {
            name: self.instance.to_string(),
            ..Default::default()
        });

        if state.last_height != 0 && block.height <= state.last_height {
            warn!(
                target: "tideline_storage",
                height = block.height,
                last_height = state.last_height,
                "Skipping duplicate block delivery"
            );
            return Ok(ApplyOutcome {
                state: state.into(),
                applied: false,
                resolved_validators: Vec::new(),
            });
        }
        if state.last_height != 0 {
            if block.height != state.last_height + 1 {
                return Err(StorageError::Conflict(format!(
                    "height gap: applying {} on top of {}",
                    block.height, state.last_height
                )));
            }
            if block.parent_hash != state.last_hash {
                return Err(StorageError::Conflict(format!(
                    "parent hash mismatch at height {}",
                    block.height
                )));
            }
        }

        let mut resolved_validators = Vec::new();
        let proposer_id = self
            .resolve_validator(&block.proposer, known_validators, &mut resolved_validators)?
            .ok_or(StorageError::UnknownProposer(block.proposer))?;

        // First block of an instance has no predecessor to measure against.
        let block_time =
            if state.last_time == 0 { 0 } else { block.time.saturating_sub(state.last_time) };

        self.tx.put::<Blocks>(
            block.height,
            StoredBlock {
                hash: block.hash,
                parent_hash: block.parent_hash,
                data_hash: block.data_hash,
                consensus_hash: block.consensus_hash,
                proposer_id,
                time: block.time,
            },
        )?;
        self.tx.put::<BlockStats>(
            block.height,
            StoredBlockStats {
                tx_count: block.totals.tx_count,
                bytes_total: block.totals.bytes_total,
                fee_total: block.totals.fee_total,
                block_time,
                supply_change: block.totals.supply_change,
            },
        )?;

        let (account_ids, new_accounts) = self.upsert_accounts(block)?;
        let (rollup_ids, new_rollups) = self.upsert_rollups(block, &account_ids)?;
        self.insert_transactions(block, &account_ids, &rollup_ids)?;
        self.insert_signatures(block, known_validators, &mut resolved_validators)?;
        self.upsert_validators(block, &mut resolved_validators)?;
        let new_bridges = self.upsert_bridges(block, &account_ids, &rollup_ids)?;

        state.last_height = block.height;
        state.last_hash = block.hash;
        state.last_time = block.time;
        state.total_tx += block.totals.tx_count;
        state.total_accounts += new_accounts;
        state.total_rollups += new_rollups;
        state.total_bridges += new_bridges;
        state.total_supply = state.total_supply.checked_add(block.totals.supply_change).ok_or(
            StorageError::Conflict(format!("total supply overflow at height {}", block.height)),
        )?;
        state.total_bytes += block.rollups.iter().map(|rollup| rollup.size).sum::<u64>();
        state_provider.put_state(state.clone())?;

        debug!(
            target: "tideline_storage",
            height = block.height,
            tx_count = block.totals.tx_count,
            new_accounts,
            "Applied block"
        );
        Ok(ApplyOutcome { state: state.into(), applied: true, resolved_validators })
    }

    /// Installs the genesis validator set. Idempotent per public key.
    pub(crate) fn seed_validators(&self, set: &[ValidatorUpdate]) -> Result<(), StorageError> {
        let mut next = self.next_id::<Validators>()?;
        for update in set {
            if self.tx.get::<ValidatorIds>(update.pubkey)?.is_some() {
                continue;
            }
            self.tx.put::<Validators>(
                next,
                StoredValidator {
                    pubkey: update.pubkey,
                    power: update.power,
                    name: update.name.clone(),
                    first_height: 0,
                },
            )?;
            self.tx.put::<ValidatorIds>(update.pubkey, next)?;
            next += 1;
        }
        Ok(())
    }

    /// Allocates the next internal id for an id-keyed table.
    fn next_id<T>(&self) -> Result<u64, StorageError>
    where
        T: Table<Key = u64>,
    {
        let mut cursor = self.tx.cursor_read::<T>()?;
        Ok(cursor.last()?.map_or(1, |(id, _)| id + 1))
    }

    /// Resolves a validator public key to an internal id: the caller's cache
    /// first, then ids already resolved within this block, then the database.
    fn resolve_validator(
        &self,
        pubkey: &B256,
        known: &HashMap<B256, u64>,
        resolved: &mut Vec<(B256, u64)>,
    ) -> Result<Option<u64>, StorageError> {
        if let Some(id) = known.get(pubkey) {
            return Ok(Some(*id));
        }
        if let Some((_, id)) = resolved.iter().find(|(key, _)| key == pubkey) {
            return Ok(Some(*id));
        }
        match self.tx.get::<ValidatorIds>(*pubkey)? {
            Some(id) => {
                resolved.push((*pubkey, id));
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Upserts the block's account deltas in address order. Returns the
    /// address-to-id map for the rest of the apply and the number of accounts
    /// created.
    fn upsert_accounts(
        &self,
        block: &DecodedBlock,
    ) -> Result<(HashMap<Address, u64>, u64), StorageError> {
        let mut ids = HashMap::with_capacity(block.accounts.len());
        let mut created = Vec::new();
        let mut next = self.next_id::<Accounts>()?;

        let mut deltas: Vec<_> = block.accounts.iter().collect();
        deltas.sort_by_key(|delta| delta.address);

        for delta in deltas {
            // The point lookup doubles as the conflict check: a hit means
            // merge, a miss means this transaction owns the row.
            match self.tx.get::<AccountIds>(delta.address)? {
                Some(id) => {
                    let mut account = self.require_account(id)?;
                    account.nonce = account.nonce.max(delta.nonce);
                    account.actions_count += delta.actions_count;
                    account.signed_tx_count += delta.signed_tx_count;
                    account.is_bridge |= delta.is_bridge;
                    if let Some(flag) = delta.is_ibc_relayer {
                        account.is_ibc_relayer = flag;
                    }
                    self.tx.put::<Accounts>(id, account)?;
                    ids.insert(delta.address, id);
                }
                None => {
                    let id = next;
                    next += 1;
                    self.tx.put::<Accounts>(
                        id,
                        StoredAccount {
                            address: delta.address,
                            first_height: block.height,
                            nonce: delta.nonce,
                            actions_count: delta.actions_count,
                            signed_tx_count: delta.signed_tx_count,
                            is_bridge: delta.is_bridge,
                            is_ibc_relayer: delta.is_ibc_relayer.unwrap_or(false),
                        },
                    )?;
                    self.tx.put::<AccountIds>(delta.address, id)?;
                    for (asset, total) in &delta.balances {
                        self.tx.put::<Balances>(
                            BalanceKey { account_id: id, asset: *asset },
                            StoredBalance { total: *total },
                        )?;
                    }
                    ids.insert(delta.address, id);
                    created.push(id);
                }
            }
        }

        let new_accounts = created.len() as u64;
        if !created.is_empty() {
            self.tx.put::<AccountsByHeight>(block.height, U64List(created))?;
        }
        Ok((ids, new_accounts))
    }

    /// Upserts the block's rollup deltas in rollup-id order, including the
    /// first-interaction join rows. Returns the external-to-internal id map
    /// and the number of rollups created.
    fn upsert_rollups(
        &self,
        block: &DecodedBlock,
        account_ids: &HashMap<Address, u64>,
    ) -> Result<(HashMap<B256, u64>, u64), StorageError> {
        let mut ids = HashMap::with_capacity(block.rollups.len());
        let mut created = Vec::new();
        let mut joined = Vec::new();
        let mut next = self.next_id::<Rollups>()?;

        let mut deltas: Vec<_> = block.rollups.iter().collect();
        deltas.sort_by_key(|delta| delta.rollup_id);

        for delta in deltas {
            let id = match self.tx.get::<RollupIds>(delta.rollup_id)? {
                Some(id) => {
                    let mut rollup = self.require_rollup(id)?;
                    rollup.actions_count += delta.actions_count;
                    rollup.bridge_count += delta.bridge_count;
                    rollup.size += delta.size;
                    self.tx.put::<Rollups>(id, rollup)?;
                    id
                }
                None => {
                    let id = next;
                    next += 1;
                    self.tx.put::<Rollups>(
                        id,
                        StoredRollup {
                            rollup_id: delta.rollup_id,
                            first_height: block.height,
                            actions_count: delta.actions_count,
                            bridge_count: delta.bridge_count,
                            size: delta.size,
                        },
                    )?;
                    self.tx.put::<RollupIds>(delta.rollup_id, id)?;
                    created.push(id);
                    id
                }
            };
            ids.insert(delta.rollup_id, id);

            for address in &delta.accounts {
                let account_id = lookup_account(account_ids, *address)?;
                let key = RollupAccountKey { rollup_id: id, account_id };
                if self.tx.get::<RollupAccounts>(key)?.is_none() {
                    self.tx.put::<RollupAccounts>(key, block.height)?;
                    joined.push((id, account_id));
                }
            }
        }

        let new_rollups = created.len() as u64;
        if !created.is_empty() {
            self.tx.put::<RollupsByHeight>(block.height, U64List(created))?;
        }
        if !joined.is_empty() {
            self.tx.put::<RollupAccountsByHeight>(block.height, IdPairList(joined))?;
        }
        Ok((ids, new_rollups))
    }

    /// Inserts the block's transactions, actions and block-scoped fact rows,
    /// and applies balance deltas to the materialized totals.
    fn insert_transactions(
        &self,
        block: &DecodedBlock,
        account_ids: &HashMap<Address, u64>,
        rollup_ids: &HashMap<B256, u64>,
    ) -> Result<(), StorageError> {
        let height = block.height;
        let mut action_seq = 0u32;
        let mut account_action_seq = 0u32;
        let mut balance_seq = 0u32;

        for (tx_index, signed_tx) in block.txs.iter().enumerate() {
            let tx_index = tx_index as u32;
            let signer_id = lookup_account(account_ids, signed_tx.signer)?;
            self.tx.put::<Transactions>(
                BlockScopedKey { height, seq: tx_index },
                StoredTx {
                    hash: signed_tx.hash,
                    signer_id,
                    nonce: signed_tx.nonce,
                    action_count: signed_tx.actions.len() as u32,
                },
            )?;

            for action in &signed_tx.actions {
                let key = BlockScopedKey { height, seq: action_seq };
                let kind = action.kind.as_u8();
                self.tx.put::<Actions>(
                    key,
                    StoredAction { tx_index, kind, data: action.data.clone() },
                )?;

                if let Some(rollup) = action.rollup {
                    let rollup_id = self.lookup_rollup(rollup_ids, rollup)?;
                    self.tx.put::<RollupActions>(
                        key,
                        StoredRollupAction { rollup_id, action_seq, kind, time: block.time },
                    )?;
                }

                for address in &action.accounts {
                    let account_id = lookup_account(account_ids, *address)?;
                    self.tx.put::<AccountActions>(
                        BlockScopedKey { height, seq: account_action_seq },
                        StoredAccountAction { account_id, kind, time: block.time },
                    )?;
                    account_action_seq += 1;
                }

                for delta in &action.balance_deltas {
                    let account_id = lookup_account(account_ids, delta.account)?;
                    self.tx.put::<BalanceUpdates>(
                        BlockScopedKey { height, seq: balance_seq },
                        StoredBalanceUpdate { account_id, asset: delta.asset, amount: delta.amount },
                    )?;
                    self.apply_balance(account_id, delta.asset, delta.amount)?;
                    balance_seq += 1;
                }

                if let Some(fee) = &action.fee {
                    let payer_id = lookup_account(account_ids, fee.payer)?;
                    self.tx.put::<Fees>(
                        key,
                        StoredFee { tx_index, payer_id, asset: fee.asset, amount: fee.amount },
                    )?;
                }
                if let Some(deposit) = &action.deposit {
                    self.insert_deposit(key, deposit, account_ids, rollup_ids)?;
                }
                if let Some(transfer) = &action.transfer {
                    self.tx.put::<Transfers>(
                        key,
                        StoredTransfer {
                            sender_id: lookup_account(account_ids, transfer.sender)?,
                            recipient_id: lookup_account(account_ids, transfer.recipient)?,
                            asset: transfer.asset,
                            amount: transfer.amount,
                        },
                    )?;
                }

                action_seq += 1;
            }
        }
        Ok(())
    }

    /// Adds a signed delta to the materialized per-asset total.
    fn apply_balance(&self, account_id: u64, asset: B256, amount: i128) -> Result<(), StorageError> {
        let key = BalanceKey { account_id, asset };
        let balance = self.tx.get::<Balances>(key)?.unwrap_or_default();
        let total = balance.total.checked_add(amount).ok_or_else(|| {
            StorageError::Conflict(format!("balance overflow for account {account_id}"))
        })?;
        self.tx.put::<Balances>(key, StoredBalance { total })?;
        Ok(())
    }

    /// Resolves a deposit's bridge and destination rollup, then persists it.
    /// A deposit with no explicit rollup lands on the bridge's default.
    fn insert_deposit(
        &self,
        key: BlockScopedKey,
        deposit: &Deposit,
        account_ids: &HashMap<Address, u64>,
        rollup_ids: &HashMap<B256, u64>,
    ) -> Result<(), StorageError> {
        let account_id = match account_ids.get(&deposit.bridge) {
            Some(id) => *id,
            None => self
                .tx
                .get::<AccountIds>(deposit.bridge)?
                .ok_or(StorageError::UnknownAddress(deposit.bridge))?,
        };
        let bridge_id = self
            .tx
            .get::<BridgeIds>(account_id)?
            .ok_or(StorageError::UnknownBridge(deposit.bridge))?;
        let rollup_id = match deposit.rollup {
            Some(rollup) => self.lookup_rollup(rollup_ids, rollup)?,
            None => self.require_bridge(bridge_id)?.rollup_id,
        };
        self.tx.put::<Deposits>(
            key,
            StoredDeposit {
                bridge_id,
                rollup_id,
                asset: deposit.asset,
                amount: deposit.amount,
                destination: deposit.destination.clone(),
            },
        )?;
        Ok(())
    }

    /// Records the block's attestations and prunes expired ones on the
    /// retention cadence. Signatures only resolve validators that already
    /// exist; this block's own set updates take effect afterwards.
    fn insert_signatures(
        &self,
        block: &DecodedBlock,
        known: &HashMap<B256, u64>,
        resolved: &mut Vec<(B256, u64)>,
    ) -> Result<(), StorageError> {
        for signature in &block.signatures {
            let validator_id = self
                .resolve_validator(&signature.validator, known, resolved)?
                .ok_or(StorageError::UnknownValidator(signature.validator))?;
            self.tx.put::<BlockSignatures>(
                SignatureKey { height: block.height, validator_id },
                block.time,
            )?;
        }

        if block.height > SIGNATURE_RETENTION && block.height % SIGNATURE_PRUNE_INTERVAL == 0 {
            let horizon = block.height - SIGNATURE_RETENTION;
            let mut pruned = 0u64;
            let mut cursor = self.tx.cursor_write::<BlockSignatures>()?;
            let mut walker = cursor.walk_range(
                SignatureKey { height: 0, validator_id: 0 }..
                    SignatureKey { height: horizon, validator_id: 0 },
            )?;
            while let Some(entry) = walker.next() {
                entry?;
                walker.delete_current()?;
                pruned += 1;
            }
            if pruned > 0 {
                debug!(
                    target: "tideline_storage",
                    height = block.height,
                    horizon,
                    pruned,
                    "Pruned expired block signatures"
                );
            }
        }
        Ok(())
    }

    /// Applies the block's validator set updates. Power always wins; an empty
    /// incoming name keeps the persisted one.
    fn upsert_validators(
        &self,
        block: &DecodedBlock,
        resolved: &mut Vec<(B256, u64)>,
    ) -> Result<(), StorageError> {
        let mut created = Vec::new();
        let mut next = self.next_id::<Validators>()?;

        for update in &block.validators {
            match self.tx.get::<ValidatorIds>(update.pubkey)? {
                Some(id) => {
                    let mut validator = self.require_validator(id)?;
                    validator.power = update.power;
                    if !update.name.is_empty() {
                        validator.name = update.name.clone();
                    }
                    self.tx.put::<Validators>(id, validator)?;
                }
                None => {
                    let id = next;
                    next += 1;
                    self.tx.put::<Validators>(
                        id,
                        StoredValidator {
                            pubkey: update.pubkey,
                            power: update.power,
                            name: update.name.clone(),
                            first_height: block.height,
                        },
                    )?;
                    self.tx.put::<ValidatorIds>(update.pubkey, id)?;
                    created.push(id);
                    resolved.push((update.pubkey, id));
                }
            }
        }

        if !created.is_empty() {
            self.tx.put::<ValidatorsByHeight>(block.height, U64List(created))?;
        }
        Ok(())
    }

    /// Upserts the block's bridge registrations in account order. Optional
    /// fields only overwrite when the incoming delta sets them. Returns the
    /// number of bridges created.
    fn upsert_bridges(
        &self,
        block: &DecodedBlock,
        account_ids: &HashMap<Address, u64>,
        rollup_ids: &HashMap<B256, u64>,
    ) -> Result<u64, StorageError> {
        let mut created = Vec::new();
        let mut next = self.next_id::<Bridges>()?;

        let mut deltas: Vec<_> = block.bridges.iter().collect();
        deltas.sort_by_key(|delta| delta.account);

        for delta in deltas {
            let account_id = lookup_account(account_ids, delta.account)?;
            let rollup_id = self.lookup_rollup(rollup_ids, delta.rollup_id)?;
            let sudo_id =
                delta.sudo.map(|address| lookup_account(account_ids, address)).transpose()?;
            let withdrawer_id =
                delta.withdrawer.map(|address| lookup_account(account_ids, address)).transpose()?;

            match self.tx.get::<BridgeIds>(account_id)? {
                Some(id) => {
                    let mut bridge = self.require_bridge(id)?;
                    bridge.rollup_id = rollup_id;
                    if sudo_id.is_some() {
                        bridge.sudo_id = sudo_id;
                    }
                    if withdrawer_id.is_some() {
                        bridge.withdrawer_id = withdrawer_id;
                    }
                    if delta.asset.is_some() {
                        bridge.asset = delta.asset;
                    }
                    if delta.fee_asset.is_some() {
                        bridge.fee_asset = delta.fee_asset;
                    }
                    self.tx.put::<Bridges>(id, bridge)?;
                }
                None => {
                    let id = next;
                    next += 1;
                    self.tx.put::<Bridges>(
                        id,
                        StoredBridge {
                            account_id,
                            rollup_id,
                            sudo_id,
                            withdrawer_id,
                            asset: delta.asset,
                            fee_asset: delta.fee_asset,
                            init_height: block.height,
                        },
                    )?;
                    self.tx.put::<BridgeIds>(account_id, id)?;
                    created.push(id);
                }
            }
        }

        let new_bridges = created.len() as u64;
        if !created.is_empty() {
            self.tx.put::<BridgesByHeight>(block.height, U64List(created))?;
        }
        Ok(new_bridges)
    }

    /// Resolves an external rollup id: this block's batch first, then the
    /// database.
    fn lookup_rollup(
        &self,
        rollup_ids: &HashMap<B256, u64>,
        rollup: B256,
    ) -> Result<u64, StorageError> {
        if let Some(id) = rollup_ids.get(&rollup) {
            return Ok(*id);
        }
        self.tx.get::<RollupIds>(rollup)?.ok_or(StorageError::UnknownRollup(rollup))
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

/// Resolves an address against the block's account batch. Every address a
/// block references must appear in its own account list.
fn lookup_account(ids: &HashMap<Address, u64>, address: Address) -> Result<u64, StorageError> {
    ids.get(&address).copied().ok_or(StorageError::UnknownAddress(address))
}
