//! Outbound notifications published after a block is durably applied.

use async_trait::async_trait;
use thiserror::Error;

/// Channel carrying the refreshed network-state summary.
pub const STATE_CHANNEL: &str = "state";

/// Channel carrying one headline per applied block.
pub const BLOCKS_CHANNEL: &str = "blocks";

/// Errors returned by a [`Notifier`].
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification transport failed.
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Publishes JSON payloads to named channels.
///
/// Notifications are best-effort: the applier logs failures and moves on,
/// since the block is already durable by the time anything is published.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes `payload` on `channel`.
    async fn notify(&self, channel: &str, payload: String) -> Result<(), NotifyError>;
}

/// A [`Notifier`] that drops every payload, for indexers running without
/// subscribers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _channel: &str, _payload: String) -> Result<(), NotifyError> {
        Ok(())
    }
}
