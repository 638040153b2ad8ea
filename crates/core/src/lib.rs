//! Core indexing logic for tideline.
//!
//! Sits between the upstream block decoder and the storage layer: the
//! [`BlockApplier`] drives forward indexing and publishes notifications, the
//! [`RollbackEngine`] walks the indexed head back to the canonical chain
//! after a reorg. Both are transport-agnostic; wiring them to channels and
//! shutdown signals happens in the service layer.

mod error;
pub use error::CoreError;

mod oracle;
pub use oracle::{NodeOracle, OracleError};

mod notify;
pub use notify::{BLOCKS_CHANNEL, NoopNotifier, Notifier, NotifyError, STATE_CHANNEL};

mod applier;
pub use applier::{BlockApplier, VALIDATOR_CACHE_SIZE};

mod rollback;
pub use rollback::{MAX_REORG_DEPTH, RollbackEngine, RollbackOutcome};
