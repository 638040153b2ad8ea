//! State and head-block reads within a transaction.

use crate::{
    error::StorageError,
    models::{Blocks, IndexerState, STATE_KEY, StoredBlock, StoredState},
};
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use tracing::error;

/// Provides access to the singleton state row and the persisted chain head.
#[derive(Debug)]
pub(crate) struct StateProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> StateProvider<'tx, TX> {
    /// Creates a new [`StateProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> StateProvider<'_, TX>
where
    TX: DbTx,
{
    /// Reads the state row, if the indexer has applied anything yet.
    pub(crate) fn get_state(&self) -> Result<Option<StoredState>, StorageError> {
        Ok(self.tx.get::<IndexerState>(STATE_KEY).inspect_err(|err| {
            error!(target: "tideline_storage", ?err, "Failed to read indexer state");
        })?)
    }

    /// Reads the state row, failing if it was never initialized.
    pub(crate) fn require_state(&self) -> Result<StoredState, StorageError> {
        self.get_state()?
            .ok_or_else(|| StorageError::EntryNotFound("indexer state not initialized".to_string()))
    }

    /// Returns the most recently applied block, by height.
    pub(crate) fn head_block(&self) -> Result<Option<(u64, StoredBlock)>, StorageError> {
        let mut cursor = self.tx.cursor_read::<Blocks>().inspect_err(|err| {
            error!(target: "tideline_storage", ?err, "Failed to get cursor for blocks");
        })?;
        Ok(cursor.last()?)
    }
}

impl<TX> StateProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Rewrites the state row.
    pub(crate) fn put_state(&self, state: StoredState) -> Result<(), StorageError> {
        Ok(self.tx.put::<IndexerState>(STATE_KEY, state)?)
    }
}
