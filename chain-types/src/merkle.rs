//! Merkle root computation for transaction lists.
//!
//! Only root computation is needed here — the sync subsystem verifies a
//! received body against an already-known header's `merkle_root`, it never
//! builds or verifies inclusion proofs.

use crate::hash::Hash256;
use sha2::{Digest, Sha256};

/// Computes the Merkle root over `leaves`, duplicating the last node on
/// odd-sized levels (Bitcoin-style construction).
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::ZERO;
    }

    let mut level: Vec<[u8; 32]> = leaves.iter().map(|h| *h.as_bytes()).collect();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = *level.last().unwrap();
            level.push(last);
        }

        level = level
            .chunks_exact(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(pair[0]);
                hasher.update(pair[1]);
                let digest = hasher.finalize();
                let mut out = [0u8; 32];
                out.copy_from_slice(&digest);
                out
            })
            .collect();
    }

    Hash256::from_bytes(level[0])
}
