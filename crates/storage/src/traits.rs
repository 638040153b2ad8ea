//! The storage interface consumed by the indexer core.

use crate::StorageError;
use alloy_primitives::B256;
use std::collections::HashMap;
use tideline_types::{DecodedBlock, NetworkState, ValidatorUpdate};

/// The persisted chain head, as seen by the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadBlock {
    /// Height of the head block.
    pub height: u64,
    /// Hash of the head block.
    pub hash: B256,
    /// Hash of its parent.
    pub parent_hash: B256,
    /// Its timestamp.
    pub time: u64,
}

/// Result of applying one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// State after the apply (unchanged when `applied` is false).
    pub state: NetworkState,
    /// False when the height guard detected a duplicate delivery and the
    /// apply was a no-op.
    pub applied: bool,
    /// Validator ids resolved or created while applying, for the caller's
    /// cross-block cache.
    pub resolved_validators: Vec<(B256, u64)>,
}

/// Transactional block projection storage.
///
/// One call is one database transaction: nothing is durable until the call
/// returns `Ok`, and an error leaves no partial effects.
pub trait BlockStore {
    /// Applies one decoded block. `known_validators` pre-resolves validator
    /// public keys the caller has already seen; unknown keys fall back to
    /// point lookups inside the transaction.
    fn apply_block(
        &self,
        block: &DecodedBlock,
        known_validators: &HashMap<B256, u64>,
    ) -> Result<ApplyOutcome, StorageError>;

    /// Discards the most recently applied block, reversing every aggregate it
    /// produced, and returns the corrected state.
    fn rollback_block(&self) -> Result<NetworkState, StorageError>;

    /// Returns the persisted chain head, if any block was applied.
    fn head_block(&self) -> Result<Option<HeadBlock>, StorageError>;

    /// Returns the current state summary.
    fn network_state(&self) -> Result<NetworkState, StorageError>;

    /// Installs the genesis validator set so the first block's proposer and
    /// signers resolve. Bootstrap only; does not touch the state row.
    fn seed_validators(&self, set: &[ValidatorUpdate]) -> Result<(), StorageError>;
}
