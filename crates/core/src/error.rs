use crate::oracle::OracleError;
use thiserror::Error;
use tideline_storage::StorageError;

/// Errors surfaced by the indexing core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The storage layer failed. The enclosing transaction was aborted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The canonical-chain oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A rollback walked back more blocks than the configured limit without
    /// finding a canonical ancestor.
    #[error("reorg deeper than {0} blocks")]
    ReorgTooDeep(u64),
}
