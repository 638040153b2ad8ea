//! The indexer's long-running actors.

mod traits;
pub use traits::IndexerActor;

mod error;
pub use error::ServiceError;

mod storage;
pub use storage::{BLOCK_QUEUE_CAPACITY, StorageActor};

mod rollback;
pub use rollback::RollbackActor;
