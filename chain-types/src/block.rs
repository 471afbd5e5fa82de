//! Minimal block/header/transaction types.
//!
//! These are deliberately thin: the chain store, consensus engine, and wire
//! codec that would give these types real teeth live outside this crate's
//! scope. What's here is exactly what the sync subsystem needs to identify,
//! order, and validate the shape of a block as it reassembles the chain.

use crate::hash::{hash256, Hash256};
use crate::merkle::merkle_root;
use serde::{Deserialize, Serialize};

/// A single transaction. Only its content hash matters to the sync
/// subsystem; the transaction's own fields are opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub payload: Vec<u8>,
}

impl Transaction {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn hash(&self) -> Hash256 {
        hash256(&self.payload)
    }
}

/// A block header: enough to compute a block hash, order blocks by height,
/// and check a later-arriving body's transaction root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub prev_hash: Hash256,
    pub tx_root: Hash256,
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash256 {
        let mut buf = Vec::with_capacity(8 + 32 + 32 + 8);
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(self.prev_hash.as_bytes());
        buf.extend_from_slice(self.tx_root.as_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        hash256(&buf)
    }
}

/// A block body: the parent it extends and its ordered transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub parent_hash: Hash256,
    pub transactions: Vec<Transaction>,
}

impl BlockBody {
    /// The Merkle root over this body's transactions, in the same
    /// construction a header's `tx_root` is expected to match.
    pub fn tx_root(&self) -> Hash256 {
        let leaves: Vec<Hash256> = self.transactions.iter().map(Transaction::hash).collect();
        merkle_root(&leaves)
    }
}

/// A fully assembled block: header plus body. This is what `AddBlock`
/// carries and what gets admitted to the chain store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash256,
    pub header: Option<BlockHeader>,
    pub body: BlockBody,
}

impl Block {
    pub fn new(hash: Hash256, header: Option<BlockHeader>, body: BlockBody) -> Self {
        Self { hash, header, body }
    }

    pub fn parent_hash(&self) -> Hash256 {
        self.body.parent_hash
    }
}

/// Status of a block once it is known to the chain store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    /// Admitted but not yet executed by consensus.
    Pending,
    /// Fully validated and executed.
    Finalized,
}

impl BlockStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, BlockStatus::Pending)
    }
}

/// A block as stored by the chain store, with links to its known children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedBlock {
    pub block: Block,
    pub status: BlockStatus,
    pub children: Vec<Hash256>,
}
