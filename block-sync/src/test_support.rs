//! In-memory fakes of the §6 collaborators, shared by this crate's tests.

#![cfg(test)]

use crate::traits::{ChainStore, ChainStoreError, Consensus, Dispatcher};
use crate::wire::{DataRequest, InventoryRequest};
use async_trait::async_trait;
use chain_types::{Block, BlockStatus, ExtendedBlock, Hash256};
use libp2p::PeerId;
use std::sync::Mutex;

#[derive(Default)]
struct ChainStoreState {
    blocks: std::collections::HashMap<Hash256, ExtendedBlock>,
    by_height: std::collections::HashMap<u64, Hash256>,
    admitted_order: Vec<Hash256>,
}

/// An in-memory chain store that records admission order so tests can
/// assert on promotion sequencing.
#[derive(Default)]
pub struct FakeChainStore {
    state: Mutex<ChainStoreState>,
}

impl FakeChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `hash` as already finalized at the given height (default 0),
    /// as if it were the chain's genesis or last-finalized block.
    pub fn seed_finalized(&self, hash: Hash256) {
        self.seed_finalized_at(hash, 0);
    }

    pub fn seed_finalized_at(&self, hash: Hash256, height: u64) {
        let mut state = self.state.lock().unwrap();
        let block = Block::new(
            hash,
            None,
            chain_types::BlockBody { parent_hash: Hash256::ZERO, transactions: vec![] },
        );
        state.blocks.insert(
            hash,
            ExtendedBlock { block, status: BlockStatus::Finalized, children: vec![] },
        );
        state.by_height.insert(height, hash);
    }

    pub fn admitted_order(&self) -> Vec<Hash256> {
        self.state.lock().unwrap().admitted_order.clone()
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.state.lock().unwrap().blocks.contains_key(hash)
    }
}

#[async_trait]
impl ChainStore for FakeChainStore {
    async fn find_block(&self, hash: &Hash256) -> Result<ExtendedBlock, ChainStoreError> {
        self.state
            .lock()
            .unwrap()
            .blocks
            .get(hash)
            .cloned()
            .ok_or(ChainStoreError::NotFound)
    }

    async fn add_block(&self, block: Block) -> Result<(), ChainStoreError> {
        let mut state = self.state.lock().unwrap();
        let hash = block.hash;
        let parent = block.parent_hash();

        if let Some(parent_entry) = state.blocks.get_mut(&parent) {
            if !parent_entry.children.contains(&hash) {
                parent_entry.children.push(hash);
            }
        }

        state.blocks.insert(
            hash,
            ExtendedBlock { block, status: BlockStatus::Finalized, children: vec![] },
        );
        state.admitted_order.push(hash);
        Ok(())
    }

    async fn block_hash_at_height(&self, height: u64) -> Result<Hash256, ChainStoreError> {
        self.state
            .lock()
            .unwrap()
            .by_height
            .get(&height)
            .copied()
            .ok_or(ChainStoreError::NotFound)
    }
}

/// A consensus fake with a fixed tip/LFB, settable by tests.
pub struct FakeConsensus {
    tip: Mutex<ExtendedBlock>,
    lfb: Mutex<ExtendedBlock>,
}

impl FakeConsensus {
    pub fn new(tip: ExtendedBlock, lfb: ExtendedBlock) -> Self {
        Self { tip: Mutex::new(tip), lfb: Mutex::new(lfb) }
    }
}

#[async_trait]
impl Consensus for FakeConsensus {
    async fn get_tip(&self, _include_candidates: bool) -> ExtendedBlock {
        self.tip.lock().unwrap().clone()
    }

    async fn get_last_finalized_block(&self) -> ExtendedBlock {
        self.lfb.lock().unwrap().clone()
    }

    fn id(&self) -> String {
        "fake-consensus".to_string()
    }
}

/// Records every outbound call so tests can assert on what was sent and to
/// whom, without a real network underneath.
#[derive(Default)]
pub struct FakeDispatcher {
    inventory_requests: Mutex<Vec<(Vec<PeerId>, InventoryRequest)>>,
    data_requests: Mutex<Vec<(Vec<PeerId>, DataRequest)>>,
    passed_down: Mutex<Vec<Block>>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_requests(&self) -> Vec<(Vec<PeerId>, DataRequest)> {
        self.data_requests.lock().unwrap().clone()
    }

    pub fn inventory_requests(&self) -> Vec<(Vec<PeerId>, InventoryRequest)> {
        self.inventory_requests.lock().unwrap().clone()
    }

    pub fn passed_down(&self) -> Vec<Block> {
        self.passed_down.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn get_inventory(&self, peers: &[PeerId], request: InventoryRequest) {
        self.inventory_requests.lock().unwrap().push((peers.to_vec(), request));
    }

    async fn get_data(&self, peers: &[PeerId], request: DataRequest) {
        self.data_requests.lock().unwrap().push((peers.to_vec(), request));
    }

    async fn passdown_message(&self, block: Block) {
        self.passed_down.lock().unwrap().push(block);
    }
}
