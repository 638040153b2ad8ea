//! [`IndexerActor`] trait.

use async_trait::async_trait;

/// A long-running service task driven by inbound events.
///
/// Actors own their inbound channel half and run until their event source
/// closes or the shared cancellation token fires.
#[async_trait]
pub trait IndexerActor {
    /// The events this actor consumes.
    type InboundEvent;
    /// The error type for the actor.
    type Error: std::fmt::Debug;

    /// Starts the actor. Runs until shutdown or a fatal error.
    async fn start(self) -> Result<(), Self::Error>;
}
