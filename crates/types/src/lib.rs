//! Core data types consumed and produced by the tideline indexer.
//!
//! This crate defines the fully-decoded block shape handed to the indexer by
//! the upstream block decoder, together with the [`NetworkState`] summary the
//! indexer publishes after every applied or rolled-back block. It carries no
//! I/O of its own.

mod block;
pub use block::{
    Action, ActionKind, BalanceDelta, BlockTotals, DecodedBlock, Deposit, Fee, SignedTx, Transfer,
};

mod entities;
pub use entities::{AccountDelta, BlockSignature, BridgeDelta, RollupDelta, ValidatorUpdate};

mod state;
pub use state::NetworkState;

/// Identifier of an asset as assigned by the upstream decoder.
///
/// The decoder resolves denomination strings to stable 32-byte identifiers
/// before blocks reach the indexer, so the projection never parses denoms.
pub type AssetId = alloy_primitives::B256;
