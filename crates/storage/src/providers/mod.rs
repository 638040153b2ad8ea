//! Per-concern database operations, each running within a caller-owned
//! transaction.

mod state;
pub(crate) use state::StateProvider;

mod apply;
pub(crate) use apply::ApplyProvider;

mod rollback;
pub(crate) use rollback::RollbackProvider;
