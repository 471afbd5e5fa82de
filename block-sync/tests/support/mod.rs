//! In-memory fakes of the collaborator traits, for integration tests.
//!
//! Deliberately duplicated from the crate's own `src/test_support.rs`
//! rather than shared: that module is `#[cfg(test)]`-gated so it only
//! exists inside the crate's unit-test build, which an integration test
//! binary never links against.

use async_trait::async_trait;
use block_sync::{ChainStore, ChainStoreError, Consensus, DataRequest, Dispatcher, InventoryRequest};
use chain_types::{Block, BlockStatus, ExtendedBlock, Hash256};
use libp2p::PeerId;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct ChainStoreState {
    blocks: HashMap<Hash256, ExtendedBlock>,
    by_height: HashMap<u64, Hash256>,
    admitted_order: Vec<Hash256>,
}

#[derive(Default)]
pub struct FakeChainStore {
    state: Mutex<ChainStoreState>,
}

impl FakeChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_finalized_at(&self, hash: Hash256, height: u64) {
        let mut state = self.state.lock().unwrap();
        let block = Block::new(
            hash,
            None,
            chain_types::BlockBody { parent_hash: Hash256::ZERO, transactions: vec![] },
        );
        state.blocks.insert(hash, ExtendedBlock { block, status: BlockStatus::Finalized, children: vec![] });
        state.by_height.insert(height, hash);
    }

    pub fn admitted_order(&self) -> Vec<Hash256> {
        self.state.lock().unwrap().admitted_order.clone()
    }

    /// Seeds `block` as still `Pending` (as if interrupted mid-sync) and
    /// links it as a child of `parent`, so a resume walk starting from
    /// `parent` discovers it.
    pub fn seed_pending(&self, hash: Hash256, block: Block, parent: Hash256) {
        let mut state = self.state.lock().unwrap();
        if let Some(parent_entry) = state.blocks.get_mut(&parent) {
            if !parent_entry.children.contains(&hash) {
                parent_entry.children.push(hash);
            }
        }
        state.blocks.insert(hash, ExtendedBlock { block, status: BlockStatus::Pending, children: vec![] });
    }
}

#[async_trait]
impl ChainStore for FakeChainStore {
    async fn find_block(&self, hash: &Hash256) -> Result<ExtendedBlock, ChainStoreError> {
        self.state.lock().unwrap().blocks.get(hash).cloned().ok_or(ChainStoreError::NotFound)
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

        state.blocks.insert(hash, ExtendedBlock { block, status: BlockStatus::Finalized, children: vec![] });
        state.admitted_order.push(hash);
        Ok(())
    }

    async fn block_hash_at_height(&self, height: u64) -> Result<Hash256, ChainStoreError> {
        self.state.lock().unwrap().by_height.get(&height).copied().ok_or(ChainStoreError::NotFound)
    }
}

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

#[derive(Default)]
pub struct FakeDispatcher {
    data_requests: Mutex<Vec<(Vec<PeerId>, DataRequest)>>,
    inventory_requests: Mutex<Vec<(Vec<PeerId>, InventoryRequest)>>,
    passed_down: Mutex<Vec<Block>>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_requests(&self) -> Vec<(Vec<PeerId>, DataRequest)> {
        self.data_requests.lock().unwrap().clone()
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
