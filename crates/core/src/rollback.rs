//! Walks the indexed head back to the canonical chain after a reorg.

use crate::{error::CoreError, oracle::NodeOracle};
use std::sync::Arc;
use tideline_storage::BlockStore;
use tideline_types::NetworkState;
use tracing::{info, warn};

/// Hard ceiling on how many blocks one rollback run may discard. A deeper
/// divergence points at a misconfigured node or a corrupted projection and
/// needs an operator.
pub const MAX_REORG_DEPTH: u64 = 100;

/// Result of one rollback run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// State after the last reversed block. `None` when nothing was reversed.
    pub state: Option<NetworkState>,
    /// Number of blocks discarded.
    pub rolled_back: u64,
}

/// Repeatedly compares the indexed head against the canonical chain and
/// discards diverged blocks until the head matches again.
#[derive(Debug)]
pub struct RollbackEngine<S, O> {
    store: Arc<S>,
    oracle: Arc<O>,
    max_depth: u64,
}

impl<S, O> RollbackEngine<S, O>
where
    S: BlockStore + Send + Sync,
    O: NodeOracle,
{
    /// Creates a new [`RollbackEngine`] with the default depth limit.
    pub fn new(store: Arc<S>, oracle: Arc<O>) -> Self {
        Self { store, oracle, max_depth: MAX_REORG_DEPTH }
    }

    /// Overrides the depth limit.
    pub const fn with_max_depth(mut self, max_depth: u64) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rolls back until the indexed head matches the canonical chain, the
    /// database is empty, or the depth limit trips.
    pub async fn run(&self) -> Result<RollbackOutcome, CoreError> {
        let mut rolled_back = 0u64;
        let mut state = None;

        loop {
            let Some(head) = self.store.head_block()? else {
                break;
            };
            let canonical = self.oracle.canonical_hash(head.height).await?;
            if canonical == Some(head.hash) {
                break;
            }
            if rolled_back >= self.max_depth {
                return Err(CoreError::ReorgTooDeep(self.max_depth));
            }

            warn!(
                target: "tideline_core",
                height = head.height,
                indexed = %head.hash,
                canonical = ?canonical,
                "Indexed block diverged from canonical chain, rolling back"
            );
            state = Some(self.store.rollback_block()?);
            rolled_back += 1;
            metrics::counter!("tideline_blocks_rolled_back").increment(1);
        }

        if rolled_back > 0 {
            info!(
                target: "tideline_core",
                rolled_back,
                new_head = state.as_ref().map(|state| state.last_height).unwrap_or_default(),
                "Rollback complete"
            );
        }
        Ok(RollbackOutcome { state, rolled_back })
    }
}
