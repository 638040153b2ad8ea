//! MDBX-backed [`BlockStore`] implementation.

use crate::{
    error::StorageError,
    models::{
        AccountIds, Accounts, BalanceKey, Balances, BridgeIds, Bridges, IndexerTables, RollupIds,
        Rollups, StoredAccount, StoredBridge, StoredRollup, StoredValidator, ValidatorIds,
        Validators,
    },
    providers::{ApplyProvider, RollbackProvider, StateProvider},
    traits::{ApplyOutcome, BlockStore, HeadBlock},
};
use alloy_primitives::{Address, B256};
use reth_db::{
    DatabaseEnv,
    mdbx::{DatabaseArguments, init_db_for},
};
use reth_db_api::{database::Database, transaction::DbTx};
use std::{collections::HashMap, path::Path};
use tideline_types::{DecodedBlock, NetworkState, ValidatorUpdate};
use tracing::{error, info};

/// A single indexer instance's database.
///
/// Wraps one MDBX environment. Every [`BlockStore`] call opens its own
/// transaction; a write transaction commits only when the whole operation
/// succeeded and aborts otherwise.
#[derive(Debug)]
pub struct IndexerDb {
    env: DatabaseEnv,
    instance: String,
}

impl IndexerDb {
    /// Creates or reopens the database at `path`.
    ///
    /// `instance` names the indexer and seeds the state row's `name` field on
    /// first apply.
    pub fn new(path: &Path, instance: impl Into<String>) -> Result<Self, StorageError> {
        let instance = instance.into();
        let env = init_db_for::<_, IndexerTables>(path, DatabaseArguments::default())
            .map_err(|err| StorageError::Init(err.to_string()))?;
        info!(target: "tideline_storage", %instance, ?path, "Opened indexer database");
        Ok(Self { env, instance })
    }

    /// Runs `f` in a read-write transaction, committing on success and
    /// aborting on any error.
    fn update<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&<DatabaseEnv as Database>::TXMut) -> Result<T, StorageError>,
    {
        let tx = self.env.tx_mut()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                error!(target: "tideline_storage", %err, "Aborting storage transaction");
                tx.abort();
                Err(err)
            }
        }
    }

    /// Runs `f` in a read-only transaction.
    fn view<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&<DatabaseEnv as Database>::TX) -> Result<T, StorageError>,
    {
        let tx = self.env.tx()?;
        let result = f(&tx);
        tx.abort();
        result
    }

    /// Point lookup of an account row by address.
    pub fn get_account(&self, address: Address) -> Result<Option<StoredAccount>, StorageError> {
        self.view(|tx| match tx.get::<AccountIds>(address)? {
            Some(id) => Ok(tx.get::<Accounts>(id)?),
            None => Ok(None),
        })
    }

    /// Point lookup of an account's balance in one asset.
    pub fn get_balance(
        &self,
        address: Address,
        asset: B256,
    ) -> Result<Option<i128>, StorageError> {
        self.view(|tx| match tx.get::<AccountIds>(address)? {
            Some(account_id) => Ok(tx
                .get::<Balances>(BalanceKey { account_id, asset })?
                .map(|balance| balance.total)),
            None => Ok(None),
        })
    }

    /// Point lookup of a rollup row by external rollup id.
    pub fn get_rollup(&self, rollup_id: B256) -> Result<Option<StoredRollup>, StorageError> {
        self.view(|tx| match tx.get::<RollupIds>(rollup_id)? {
            Some(id) => Ok(tx.get::<Rollups>(id)?),
            None => Ok(None),
        })
    }

    /// Point lookup of a bridge row by controlling account address.
    pub fn get_bridge(&self, account: Address) -> Result<Option<StoredBridge>, StorageError> {
        self.view(|tx| {
            let Some(account_id) = tx.get::<AccountIds>(account)? else {
                return Ok(None);
            };
            match tx.get::<BridgeIds>(account_id)? {
                Some(id) => Ok(tx.get::<Bridges>(id)?),
                None => Ok(None),
            }
        })
    }

    /// Point lookup of a validator row by public key.
    pub fn get_validator(&self, pubkey: B256) -> Result<Option<StoredValidator>, StorageError> {
        self.view(|tx| match tx.get::<ValidatorIds>(pubkey)? {
            Some(id) => Ok(tx.get::<Validators>(id)?),
            None => Ok(None),
        })
    }
}

impl BlockStore for IndexerDb {
    fn apply_block(
        &self,
        block: &DecodedBlock,
        known_validators: &HashMap<B256, u64>,
    ) -> Result<ApplyOutcome, StorageError> {
        self.update(|tx| {
            ApplyProvider::new(tx, &self.instance).apply_block(block, known_validators)
        })
    }

    fn rollback_block(&self) -> Result<NetworkState, StorageError> {
        self.update(|tx| RollbackProvider::new(tx).rollback_block().map(Into::into))
    }

    fn head_block(&self) -> Result<Option<HeadBlock>, StorageError> {
        self.view(|tx| {
            Ok(StateProvider::new(tx).head_block()?.map(|(height, block)| HeadBlock {
                height,
                hash: block.hash,
                parent_hash: block.parent_hash,
                time: block.time,
            }))
        })
    }

    fn network_state(&self) -> Result<NetworkState, StorageError> {
        self.view(|tx| Ok(StateProvider::new(tx).require_state()?.into()))
    }

    fn seed_validators(&self, set: &[ValidatorUpdate]) -> Result<(), StorageError> {
        self.update(|tx| ApplyProvider::new(tx, &self.instance).seed_validators(set))
    }
}
