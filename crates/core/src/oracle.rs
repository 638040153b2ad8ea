//! The canonical-chain oracle consulted before rolling back.

use alloy_primitives::B256;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a [`NodeOracle`].
#[derive(Debug, Error)]
pub enum OracleError {
    /// The node request failed (transport, timeout, malformed response).
    #[error("node request failed: {0}")]
    Request(String),
}

/// A view onto the canonical chain, typically backed by a full node RPC.
///
/// The rollback engine compares the indexed head against this oracle and
/// rolls back until the hashes agree.
#[async_trait]
pub trait NodeOracle: Send + Sync {
    /// Hash of the canonical block at `height`, or `None` when the canonical
    /// chain is shorter than `height`.
    async fn canonical_hash(&self, height: u64) -> Result<Option<B256>, OracleError>;
}
