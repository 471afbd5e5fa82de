//! `PendingBlock`: the in-memory state of one not-yet-admitted block.

use chain_types::{BlockBody, BlockHeader, Hash256};
use libp2p::PeerId;
use std::time::Duration;
use tokio::time::Instant;

/// Where a `PendingBlock` sits in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Known only by hash; no request in flight.
    WantData,
    /// A full-block request has been sent; waiting on a body.
    AwaitingData,
    /// A header is known; waiting to request the body.
    WantBody,
    /// A body request has been sent for a block whose header is known.
    AwaitingBody,
}

/// One tracked, not-yet-admitted block.
///
/// `hash` and `created_at` never change after construction. Every other
/// field is mutated only while the manager's single lock is held.
#[derive(Debug, Clone)]
pub struct PendingBlock {
    pub hash: Hash256,
    pub created_at: Instant,
    pub header: Option<BlockHeader>,
    pub body: Option<BlockBody>,
    pub peers: Vec<PeerId>,
    pub last_update: Instant,
    pub status: Status,
}

impl PendingBlock {
    /// Creates a fresh `PendingBlock` from a hash advertisement, with
    /// `peers` already deduplicated by the caller.
    pub fn new(hash: Hash256, peers: Vec<PeerId>) -> Self {
        let now = Instant::now();
        Self {
            hash,
            created_at: now,
            header: None,
            body: None,
            peers,
            last_update: now,
            status: Status::WantData,
        }
    }

    /// Adds `peer` to this block's peer set if it isn't already present.
    pub fn add_peer(&mut self, peer: PeerId) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
    }

    /// Unions `peers` into this block's peer set, preserving first-seen order.
    pub fn add_peers(&mut self, peers: impl IntoIterator<Item = PeerId>) {
        for peer in peers {
            self.add_peer(peer);
        }
    }

    pub fn has_timed_out(&self, now: Instant, request_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_update) > request_timeout
    }

    pub fn has_expired(&self, now: Instant, expiration: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > expiration
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_update = now;
    }
}
