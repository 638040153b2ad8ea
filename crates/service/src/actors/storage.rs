//! The actor feeding decoded blocks into the block applier.

use crate::actors::{IndexerActor, ServiceError};
use async_trait::async_trait;
use tideline_core::{BlockApplier, CoreError, Notifier};
use tideline_storage::{BlockStore, StorageError};
use tideline_types::DecodedBlock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Bound of the decoded-block queue. Applies are disk-bound, so a short
/// queue is enough to keep the applier busy while exerting backpressure on
/// the decoder.
pub const BLOCK_QUEUE_CAPACITY: usize = 16;

/// Consumes decoded blocks from a bounded queue and applies them in order.
///
/// A conflict (height gap or parent-hash mismatch) is not fatal: it signals
/// a suspected reorg to the rollback actor and drops the block, relying on
/// the upstream to redeliver once the head is corrected. Every other error
/// cancels the service.
#[derive(Debug)]
pub struct StorageActor<S, N> {
    applier: BlockApplier<S, N>,
    block_rx: mpsc::Receiver<DecodedBlock>,
    reorg_tx: mpsc::Sender<()>,
    cancel_token: CancellationToken,
}

impl<S, N> StorageActor<S, N>
where
    S: BlockStore + Send + Sync,
    N: Notifier,
{
    /// Creates a new [`StorageActor`].
    pub const fn new(
        applier: BlockApplier<S, N>,
        block_rx: mpsc::Receiver<DecodedBlock>,
        reorg_tx: mpsc::Sender<()>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self { applier, block_rx, reorg_tx, cancel_token }
    }

    async fn handle_block(&mut self, block: DecodedBlock) -> Result<(), ServiceError> {
        match self.applier.apply(&block).await {
            Ok(_) => Ok(()),
            Err(CoreError::Storage(StorageError::Conflict(reason))) => {
                warn!(
                    target: "tideline_service",
                    height = block.height,
                    %reason,
                    "Block conflicts with indexed chain, requesting rollback"
                );
                // Edge-triggered: a pending request already covers this.
                let _ = self.reorg_tx.try_send(());
                Ok(())
            }
            Err(err) => {
                error!(target: "tideline_service", height = block.height, %err, "Failed to apply block");
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl<S, N> IndexerActor for StorageActor<S, N>
where
    S: BlockStore + Send + Sync + 'static,
    N: Notifier + 'static,
{
    type InboundEvent = DecodedBlock;
    type Error = ServiceError;

    async fn start(mut self) -> Result<(), Self::Error> {
        info!(target: "tideline_service", "Starting StorageActor");

        loop {
            tokio::select! {
                maybe_block = self.block_rx.recv() => {
                    match maybe_block {
                        Some(block) => {
                            if let Err(err) = self.handle_block(block).await {
                                self.cancel_token.cancel();
                                return Err(err);
                            }
                        }
                        None => {
                            info!(target: "tideline_service", "Block channel closed, stopping StorageActor");
                            break;
                        }
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    info!(target: "tideline_service", "StorageActor cancellation requested, stopping...");
                    break;
                }
            }
        }

        Ok(())
    }
}
