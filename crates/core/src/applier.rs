//! Forward block application with validator-id caching and notifications.

use crate::{
    error::CoreError,
    notify::{BLOCKS_CHANNEL, Notifier, STATE_CHANNEL},
};
use alloy_primitives::B256;
use lru::LruCache;
use serde::Serialize;
use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tideline_storage::{ApplyOutcome, BlockStore};
use tideline_types::{DecodedBlock, NetworkState};
use tracing::{debug, warn};

/// Capacity of the validator pubkey-to-id cache. Active validator sets are
/// far smaller; the cache only churns across long validator turnover.
pub const VALIDATOR_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// Blocks older than this many seconds are applied silently. Backfill should
/// not flood subscribers with stale notifications.
const NOTIFY_RECENCY_WINDOW: u64 = 3_600;

/// Per-block headline published on [`BLOCKS_CHANNEL`].
#[derive(Debug, Serialize)]
struct BlockHeadline {
    height: u64,
    hash: B256,
    time: u64,
    tx_count: u64,
    bytes_total: u64,
    supply_change: i128,
}

/// Drives forward indexing: resolves validator ids from a local cache,
/// delegates the transactional work to the store, and publishes
/// notifications for recent blocks.
#[derive(Debug)]
pub struct BlockApplier<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    validators: LruCache<B256, u64>,
}

impl<S, N> BlockApplier<S, N>
where
    S: BlockStore,
    N: Notifier,
{
    /// Creates a new [`BlockApplier`] over `store`, publishing through
    /// `notifier`.
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier, validators: LruCache::new(VALIDATOR_CACHE_SIZE) }
    }

    /// Applies one decoded block and returns the storage outcome.
    ///
    /// Validator ids resolved by the store are merged back into the cache so
    /// subsequent blocks skip the point lookups. Notification failures are
    /// logged and swallowed; the block is already durable.
    pub async fn apply(&mut self, block: &DecodedBlock) -> Result<ApplyOutcome, CoreError> {
        let mut known = HashMap::new();
        if let Some(id) = self.validators.get(&block.proposer) {
            known.insert(block.proposer, *id);
        }
        for signature in &block.signatures {
            if let Some(id) = self.validators.get(&signature.validator) {
                known.insert(signature.validator, *id);
            }
        }

        let outcome = self.store.apply_block(block, &known)?;
        for (pubkey, id) in &outcome.resolved_validators {
            self.validators.put(*pubkey, *id);
        }

        if !outcome.applied {
            metrics::counter!("tideline_blocks_skipped").increment(1);
            return Ok(outcome);
        }

        metrics::counter!("tideline_blocks_applied").increment(1);
        metrics::counter!("tideline_txs_indexed").increment(block.totals.tx_count);
        metrics::gauge!("tideline_head_height").set(outcome.state.last_height as f64);
        debug!(
            target: "tideline_core",
            height = block.height,
            tx_count = block.totals.tx_count,
            "Applied block"
        );

        if is_recent(block.time) {
            self.publish(block, &outcome.state).await;
        }
        Ok(outcome)
    }

    async fn publish(&self, block: &DecodedBlock, state: &NetworkState) {
        match serde_json::to_string(state) {
            Ok(payload) => {
                if let Err(err) = self.notifier.notify(STATE_CHANNEL, payload).await {
                    warn!(target: "tideline_core", %err, "Failed to publish state notification");
                } else {
                    metrics::counter!("tideline_notifications_published").increment(1);
                }
            }
            Err(err) => {
                warn!(target: "tideline_core", %err, "Failed to serialize state notification");
            }
        }

        let headline = BlockHeadline {
            height: block.height,
            hash: block.hash,
            time: block.time,
            tx_count: block.totals.tx_count,
            bytes_total: block.totals.bytes_total,
            supply_change: block.totals.supply_change,
        };
        match serde_json::to_string(&headline) {
            Ok(payload) => {
                if let Err(err) = self.notifier.notify(BLOCKS_CHANNEL, payload).await {
                    warn!(target: "tideline_core", %err, "Failed to publish block notification");
                } else {
                    metrics::counter!("tideline_notifications_published").increment(1);
                }
            }
            Err(err) => {
                warn!(target: "tideline_core", %err, "Failed to serialize block notification");
            }
        }
    }
}

/// Whether a block timestamp falls within the notification window.
fn is_recent(block_time: u64) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    block_time.saturating_add(NOTIFY_RECENCY_WINDOW) >= now
}
