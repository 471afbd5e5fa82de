//! Promotion engine: BFS-drains orphan descendants into the chain store
//! once their parent is admitted.

use crate::index::PendingIndex;
use crate::traits::{ChainStore, Dispatcher};
use chain_types::Block;
use std::collections::VecDeque;
use tracing::warn;

/// Admits `start` and every descendant in `index`'s orphan buffer whose
/// ancestry now chains back to `start`, level by level.
pub async fn dump_ready_blocks(
    index: &mut PendingIndex,
    chain_store: &dyn ChainStore,
    dispatcher: &dyn Dispatcher,
    start: Block,
) {
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(block) = queue.pop_front() {
        for child_hash in index.children_of(&block.hash) {
            if let Some(child) = index.get(&child_hash) {
                if let Some(body) = child.body.clone() {
                    queue.push_back(Block::new(child_hash, child.header.clone(), body));
                }
            }
        }
        index.remove_parent_entry(&block.hash);

        if index.contains(&block.hash) {
            index.remove_entry(&block.hash);
        }

        let hash = block.hash;
        if let Err(err) = chain_store.add_block(block.clone()).await {
            warn!(%hash, error = %err, "chain store rejected block during promotion");
            continue;
        }
        dispatcher.passdown_message(block).await;
    }
}

/// Sweeps every `PendingBlock` with a known body and promotes any whose
/// parent is already admitted and non-pending. Used as a reconciler after
/// batches of out-of-order arrivals.
pub async fn dump_all_ready_blocks(
    index: &mut PendingIndex,
    chain_store: &dyn ChainStore,
    dispatcher: &dyn Dispatcher,
) {
    let candidates: Vec<_> = index
        .iter_in_order()
        .filter(|pb| pb.body.is_some())
        .map(|pb| pb.hash)
        .collect();

    for hash in candidates {
        let Some(pb) = index.get(&hash) else {
            // Already promoted earlier in this sweep as someone else's descendant.
            continue;
        };
        let Some(body) = pb.body.clone() else { continue };
        let header = pb.header.clone();
        let parent = body.parent_hash;

        if let Ok(ext) = chain_store.find_block(&parent).await {
            if !ext.status.is_pending() {
                let block = Block::new(hash, header, body);
                dump_ready_blocks(index, chain_store, dispatcher, block).await;
            }
        }
    }
}
