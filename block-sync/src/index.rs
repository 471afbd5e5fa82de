//! The pending index: three structures over `PendingBlock` maintained together.
//!
//! `list` gives insertion-ordered iteration, `by_hash` gives O(1) lookup,
//! and `by_parent` parks blocks whose body arrived before their parent was
//! admitted. All three are kept consistent by this module alone — callers
//! never touch `list`/`by_parent` directly.

use crate::heap::HeaderHeap;
use crate::pending::PendingBlock;
use chain_types::Hash256;
use libp2p::PeerId;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Default)]
pub struct PendingIndex {
    list: VecDeque<Hash256>,
    by_hash: HashMap<Hash256, PendingBlock>,
    by_parent: HashMap<Hash256, HashSet<Hash256>>,
    pub header_heap: HeaderHeap,
}

impl PendingIndex {
    pub fn new() -> Self {
        Self {
            list: VecDeque::new(),
            by_hash: HashMap::new(),
            by_parent: HashMap::new(),
            header_heap: HeaderHeap::new(),
        }
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash256) -> Option<&PendingBlock> {
        self.by_hash.get(hash)
    }

    pub fn get_mut(&mut self, hash: &Hash256) -> Option<&mut PendingBlock> {
        self.by_hash.get_mut(hash)
    }

    /// Inserts a freshly created `PendingBlock` for `hash` with the given
    /// initial peer set. No-op if `hash` is already tracked.
    pub fn insert_new(&mut self, hash: Hash256, peers: Vec<PeerId>) -> &mut PendingBlock {
        if !self.by_hash.contains_key(&hash) {
            self.list.push_back(hash);
            self.by_hash.insert(hash, PendingBlock::new(hash, peers));
        }
        self.by_hash.get_mut(&hash).expect("just inserted")
    }

    /// Insertion-ordered iteration over every live `PendingBlock`.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &PendingBlock> {
        self.list.iter().filter_map(move |hash| self.by_hash.get(hash))
    }

    /// Registers `hash` as a known child of `parent`, deduplicated.
    pub fn add_to_parent_index(&mut self, parent: Hash256, hash: Hash256) {
        self.by_parent.entry(parent).or_default().insert(hash);
    }

    /// Children of `parent` still parked because `parent` was not admitted
    /// when their bodies arrived.
    pub fn children_of(&self, parent: &Hash256) -> Vec<Hash256> {
        self.by_parent
            .get(parent)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Removes the parent-index entry for `parent` entirely (used once its
    /// children have been dequeued for promotion).
    pub fn remove_parent_entry(&mut self, parent: &Hash256) {
        self.by_parent.remove(parent);
    }

    /// Deletes `hash` from `list` and `by_hash`, and — if its body is
    /// known — from `by_parent[parent]`, erasing the parent key if that
    /// leaves it empty.
    pub fn remove_entry(&mut self, hash: &Hash256) -> Option<PendingBlock> {
        let removed = self.by_hash.remove(hash)?;

        if let Some(pos) = self.list.iter().position(|h| h == hash) {
            self.list.remove(pos);
        }

        if let Some(body) = &removed.body {
            let parent = body.parent_hash;
            let mut drop_key = false;
            if let Some(set) = self.by_parent.get_mut(&parent) {
                set.remove(hash);
                drop_key = set.is_empty();
            }
            if drop_key {
                self.by_parent.remove(&parent);
            }
        }

        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[cfg(test)]
    pub fn hash_count(&self) -> usize {
        self.by_hash.len()
    }
}
