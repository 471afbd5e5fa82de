//! The 1 Hz scheduler pass: inventory requests plus the two download walks.

use crate::config::RequestManagerConfig;
use crate::heap::HeaderHeap;
use crate::index::PendingIndex;
use crate::inventory::{build_inventory_request, InventoryThrottle};
use crate::pending::Status;
use crate::traits::{ChainStore, Consensus, Dispatcher};
use crate::wire::DataRequest;
use chain_types::Hash256;
use libp2p::PeerId;
use rand::seq::SliceRandom;
use tokio::time::Instant;
use tracing::{debug, trace};

/// State a scheduler pass needs exclusive access to: the pending index and
/// the inventory rate-limit clock. Guarded together by the manager's single
/// lock (§5: "A single reader-writer lock guards all pending indexes, the
/// heap, and the inventory timestamp").
#[derive(Default)]
pub struct SyncState {
    pub index: PendingIndex,
    pub inventory_throttle: InventoryThrottle,
}

/// Runs one scheduler tick: possibly emits an inventory request, then
/// drains the header-ordered and hash-ordered download queues against a
/// shared per-tick quota.
pub async fn run_tick(
    state: &mut SyncState,
    chain_store: &dyn ChainStore,
    consensus: &dyn Consensus,
    dispatcher: &dyn Dispatcher,
    config: &RequestManagerConfig,
    now: Instant,
) {
    maybe_send_inventory_request(state, chain_store, consensus, dispatcher, config, now).await;

    let mut quota = config.request_quota_per_second;

    let header_sends = download_block_from_header(&mut state.index, now, config, &mut quota);
    for (hash, peer) in header_sends {
        dispatcher.get_data(&[peer], DataRequest::single(crate::wire::BLOCK_CHANNEL_ID, hash)).await;
    }

    let hash_sends = download_block_from_hash(&mut state.index, now, config, &mut quota);
    for (hash, peer) in hash_sends {
        dispatcher.get_data(&[peer], DataRequest::single(crate::wire::BLOCK_CHANNEL_ID, hash)).await;
    }
}

async fn maybe_send_inventory_request(
    state: &mut SyncState,
    chain_store: &dyn ChainStore,
    consensus: &dyn Consensus,
    dispatcher: &dyn Dispatcher,
    config: &RequestManagerConfig,
    now: Instant,
) {
    let has_pending_work = !state.index.is_empty();
    if !state.inventory_throttle.should_fire(
        now,
        has_pending_work,
        config.min_inventory_request_interval,
        config.max_inventory_request_interval,
    ) {
        return;
    }

    let tip = consensus.get_tip(true).await;
    let lfb = consensus.get_last_finalized_block().await;
    let tip_height = tip.block.header.as_ref().map(|h| h.height).unwrap_or(0);
    let lfb_height = lfb.block.header.as_ref().map(|h| h.height).unwrap_or(0);

    let request =
        build_inventory_request(chain_store, tip_height, lfb_height, lfb.block.hash).await;

    dispatcher.get_inventory(&[], request).await;
    state.inventory_throttle.record_fired(now);
}

/// Hash-driven download pass: walks the pending list in insertion order,
/// emitting one data request per eligible block and collecting expired
/// entries for removal once the walk completes.
pub fn download_block_from_hash(
    index: &mut PendingIndex,
    now: Instant,
    config: &RequestManagerConfig,
    quota: &mut u32,
) -> Vec<(Hash256, PeerId)> {
    let mut sends = Vec::new();
    let mut expired = Vec::new();

    let hashes: Vec<Hash256> = index.iter_in_order().map(|pb| pb.hash).collect();
    for hash in hashes {
        let Some(pb) = index.get_mut(&hash) else { continue };

        if pb.has_expired(now, config.expiration) {
            debug!(%hash, age = ?now.saturating_duration_since(pb.created_at), "pending block expired");
            expired.push(hash);
            continue;
        }
        if pb.header.is_some() {
            continue; // handled by the header-driven path
        }
        if pb.body.is_some() {
            continue; // orphaned: body already held, just waiting on parent admission
        }
        if pb.peers.is_empty() {
            trace!(%hash, "no peers known for pending block, skipping");
            continue;
        }

        let eligible = matches!(pb.status, Status::WantData)
            || (matches!(pb.status, Status::AwaitingData) && pb.has_timed_out(now, config.request_timeout));
        if !eligible || *quota == 0 {
            continue;
        }

        let peer = *pb.peers.choose(&mut rand::thread_rng()).expect("checked non-empty above");
        pb.touch(now);
        pb.status = Status::AwaitingData;
        *quota -= 1;
        sends.push((hash, peer));
    }

    for hash in &expired {
        index.remove_entry(hash);
    }

    sends
}

/// Header-driven download pass: drains the header heap into a scratch heap,
/// applying the same send policy against `WantBody`/`AwaitingBody`. An
/// expired entry has its header cleared and is dropped from the heap —
/// the subsequent hash-driven pass (run afterward within the same tick)
/// will then see it has no header and, being past expiration, remove it.
pub fn download_block_from_header(
    index: &mut PendingIndex,
    now: Instant,
    config: &RequestManagerConfig,
    quota: &mut u32,
) -> Vec<(Hash256, PeerId)> {
    let mut scratch = HeaderHeap::new();
    let mut sends = Vec::new();

    while let Some(hash) = index.header_heap.pop() {
        let Some(pb) = index.get_mut(&hash) else { continue };

        if pb.has_expired(now, config.expiration) {
            debug!(%hash, age = ?now.saturating_duration_since(pb.created_at), "pending block expired");
            pb.header = None;
            continue;
        }

        let height = pb.header.as_ref().expect("heap entries always carry a header").height;

        if pb.peers.is_empty() {
            scratch.push(height, hash);
            continue;
        }
        if pb.body.is_some() {
            // Orphaned: body already held, just waiting on parent admission.
            // Drop from the heap outright rather than re-push — nothing
            // left to request, and the hash-driven pass no longer has a
            // reason to touch it either.
            continue;
        }

        let eligible = matches!(pb.status, Status::WantBody)
            || (matches!(pb.status, Status::AwaitingBody) && pb.has_timed_out(now, config.request_timeout));

        if eligible && *quota > 0 {
            let peer = *pb.peers.choose(&mut rand::thread_rng()).expect("checked non-empty above");
            pb.touch(now);
            pb.status = Status::AwaitingBody;
            *quota -= 1;
            sends.push((hash, peer));
        }

        scratch.push(height, hash);
    }

    index.header_heap = scratch;
    sends
}
