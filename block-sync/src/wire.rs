//! Wire message shapes carried by the dispatcher.
//!
//! These fields are the only part of the wire format this crate cares
//! about; the rest of the envelope (channel framing, signatures, codec)
//! belongs to the dispatcher and is opaque here.

use chain_types::Hash256;
use serde::{Deserialize, Serialize};

/// A locator-hash message asking peers for what follows a set of known
/// chain positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub channel_id: u32,
    pub starts: Vec<Hash256>,
    pub end: Option<Hash256>,
}

/// A request for the full bodies of the named blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub channel_id: u32,
    pub entries: Vec<Hash256>,
}

impl DataRequest {
    pub fn single(channel_id: u32, hash: Hash256) -> Self {
        Self {
            channel_id,
            entries: vec![hash],
        }
    }
}

/// Channel identifier used for both inventory and data requests. The value
/// is arbitrary from this crate's point of view; it exists purely so the
/// dispatcher can route responses back to the right subsystem.
pub const BLOCK_CHANNEL_ID: u32 = 1;
