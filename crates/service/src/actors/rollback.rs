//! The actor correcting the indexed head after a suspected reorg.

use crate::actors::{IndexerActor, ServiceError};
use async_trait::async_trait;
use tideline_core::{NodeOracle, RollbackEngine};
use tideline_storage::BlockStore;
use tideline_types::NetworkState;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs the rollback engine whenever the storage actor reports a divergence,
/// and publishes the corrected state when anything was actually discarded.
#[derive(Debug)]
pub struct RollbackActor<S, O> {
    engine: RollbackEngine<S, O>,
    trigger_rx: mpsc::Receiver<()>,
    state_tx: mpsc::Sender<NetworkState>,
    cancel_token: CancellationToken,
}

impl<S, O> RollbackActor<S, O>
where
    S: BlockStore + Send + Sync,
    O: NodeOracle,
{
    /// Creates a new [`RollbackActor`].
    pub const fn new(
        engine: RollbackEngine<S, O>,
        trigger_rx: mpsc::Receiver<()>,
        state_tx: mpsc::Sender<NetworkState>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self { engine, trigger_rx, state_tx, cancel_token }
    }

    async fn handle_trigger(&mut self) -> Result<(), ServiceError> {
        let outcome = self.engine.run().await?;
        if outcome.rolled_back == 0 {
            debug!(target: "tideline_service", "Rollback requested but head is canonical");
            return Ok(());
        }
        if let Some(state) = outcome.state {
            if self.state_tx.send(state).await.is_err() {
                warn!(target: "tideline_service", "State receiver dropped, rollback result unobserved");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S, O> IndexerActor for RollbackActor<S, O>
where
    S: BlockStore + Send + Sync + 'static,
    O: NodeOracle + 'static,
{
    type InboundEvent = ();
    type Error = ServiceError;

    async fn start(mut self) -> Result<(), Self::Error> {
        info!(target: "tideline_service", "Starting RollbackActor");

        loop {
            tokio::select! {
                maybe_trigger = self.trigger_rx.recv() => {
                    match maybe_trigger {
                        Some(()) => {
                            if let Err(err) = self.handle_trigger().await {
                                error!(target: "tideline_service", %err, "Rollback failed");
                                self.cancel_token.cancel();
                                return Err(err);
                            }
                        }
                        None => {
                            warn!(target: "tideline_service", "Trigger channel closed, stopping RollbackActor");
                            break;
                        }
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    info!(target: "tideline_service", "RollbackActor cancellation requested, stopping...");
                    break;
                }
            }
        }

        Ok(())
    }
}
