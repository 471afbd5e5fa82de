//! Collaborator contracts this crate consumes but does not implement.
//!
//! The chain store, consensus engine, and peer dispatcher all live outside
//! this crate's scope (see the crate-level docs). These traits pin down the
//! narrow surface the request manager actually calls, so the manager can be
//! built and tested against either the real node components or in-memory
//! fakes without conditional compilation.

use async_trait::async_trait;
use chain_types::{Block, ExtendedBlock, Hash256};
use libp2p::PeerId;
use thiserror::Error;

use crate::wire::{DataRequest, InventoryRequest};

#[derive(Debug, Error)]
pub enum ChainStoreError {
    #[error("block not found")]
    NotFound,
    #[error("chain store error: {0}")]
    Other(String),
}

/// The on-disk (or in-memory, for tests) chain store that admits blocks.
#[async_trait]
pub trait ChainStore: Send + Sync {
    async fn find_block(&self, hash: &Hash256) -> Result<ExtendedBlock, ChainStoreError>;

    /// Admits `block`, executing it against consensus rules. Validation
    /// beyond the transaction-root check this crate performs itself is
    /// entirely this collaborator's responsibility.
    async fn add_block(&self, block: Block) -> Result<(), ChainStoreError>;

    /// Resolves the hash of the block at `height` on the canonical chain.
    ///
    /// Not named in the distilled collaborator contract, but required to
    /// build the height-walking locator of the inventory requester; any
    /// chain store capable of answering `FindBlock` can answer this too.
    async fn block_hash_at_height(&self, height: u64) -> Result<Hash256, ChainStoreError>;
}

/// The consensus engine's view of tip and finality.
#[async_trait]
pub trait Consensus: Send + Sync {
    /// Returns the current best head. `include_candidates` asks for the
    /// best known head even if it has not yet been finalized.
    async fn get_tip(&self, include_candidates: bool) -> ExtendedBlock;

    async fn get_last_finalized_block(&self) -> ExtendedBlock;

    fn id(&self) -> String;
}

/// The peer dispatcher: sends wire requests and forwards admitted blocks.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Broadcasts (or, with non-empty `peers`, targets) an inventory
    /// request asking for what follows a set of locator hashes.
    async fn get_inventory(&self, peers: &[PeerId], request: InventoryRequest);

    /// Requests the bodies named in `request` from `peers`.
    async fn get_data(&self, peers: &[PeerId], request: DataRequest);

    /// Forwards a newly admitted block onward (e.g. to other subsystems
    /// that react to new blocks, or for further gossip).
    async fn passdown_message(&self, block: Block);
}
