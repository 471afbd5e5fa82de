//! Inventory requester: builds locator hashes and rate-limits their use.

use crate::traits::{ChainStore, Consensus};
use crate::wire::{InventoryRequest, BLOCK_CHANNEL_ID};
use chain_types::Hash256;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Builds a Bitcoin-style exponentially-spaced locator from `tip_height`
/// down to `lfb_height`, resolving each locator height to a hash via
/// `chain_store`. Always ends with `lfb_hash`.
///
/// If `tip_height <= lfb_height`, the locator is exactly `[lfb_hash]`.
pub async fn build_inventory_request(
    chain_store: &dyn ChainStore,
    tip_height: u64,
    lfb_height: u64,
    lfb_hash: Hash256,
) -> InventoryRequest {
    let mut starts = Vec::new();

    if tip_height > lfb_height {
        let mut step: u64 = 1;
        let mut i = tip_height;

        loop {
            match chain_store.block_hash_at_height(i).await {
                Ok(hash) => starts.push(hash),
                Err(err) => warn!(height = i, error = %err, "no block at locator height, skipping"),
            }

            if tip_height - i >= 10 {
                step = step.saturating_mul(2);
            }
            if step == 0 {
                break;
            }
            match i.checked_sub(step) {
                Some(next) if next > lfb_height => i = next,
                _ => break,
            }
        }
    }

    starts.push(lfb_hash);

    InventoryRequest {
        channel_id: BLOCK_CHANNEL_ID,
        starts,
        end: Some(lfb_hash),
    }
}

/// Tracks the last time an inventory request fired and decides whether to
/// fire another one, given the rate-limit bounds in the config.
#[derive(Debug, Default)]
pub struct InventoryThrottle {
    last_request: Option<Instant>,
}

impl InventoryThrottle {
    pub fn new() -> Self {
        Self { last_request: None }
    }

    /// Whether an inventory request should be sent right now.
    ///
    /// Fires if the maximum interval has elapsed regardless of pending
    /// work, or if there is pending work and at least the minimum interval
    /// has elapsed.
    pub fn should_fire(
        &self,
        now: Instant,
        has_pending_work: bool,
        min_interval: Duration,
        max_interval: Duration,
    ) -> bool {
        match self.last_request {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                elapsed >= max_interval || (has_pending_work && elapsed >= min_interval)
            }
        }
    }

    pub fn record_fired(&mut self, now: Instant) {
        self.last_request = Some(now);
    }
}
