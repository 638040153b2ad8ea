//! Actor wiring for the tideline indexer.
//!
//! Connects the core applier and rollback engine to channels and a shared
//! cancellation token: the [`StorageActor`] consumes decoded blocks from a
//! bounded queue, the [`RollbackActor`] reacts to divergence triggers the
//! storage actor raises.

mod actors;
pub use actors::{
    BLOCK_QUEUE_CAPACITY, IndexerActor, RollbackActor, ServiceError, StorageActor,
};
