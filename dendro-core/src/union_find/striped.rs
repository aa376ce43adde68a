//! Lock-ordered union-find with union by rank.
//!
//! Each node id owns a lock that is only taken while the node is a root.
//! A union locks `(min_root, max_root)` so concurrent unions stay
//! deadlock-free, then re-validates that both ids are still the current
//! roots; if another thread moved them in the meantime the attempt is
//! retried. `find` compresses paths without locking.

use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU32, AtomicUsize, Ordering},
};

use crate::dendrogram::NodeId;

use super::{ConcurrentDisjointSet, to_node_id};

/// Rank-balanced union-find guarded by one lock per root.
#[derive(Debug)]
pub struct StripedUnionFind {
    parents: Vec<AtomicU32>,
    ranks: Vec<AtomicU32>,
    components: AtomicUsize,
    locks: Vec<Mutex<()>>,
}

impl StripedUnionFind {
    /// Returns the number of disjoint sets remaining.
    #[must_use]
    pub fn components(&self) -> usize {
        self.components.load(Ordering::Acquire)
    }

    fn lock_root(&self, root: NodeId) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.locks[root as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn union_roots(&self, left_root: NodeId, right_root: NodeId) {
        let left_rank = self.ranks[left_root as usize].load(Ordering::Relaxed);
        let right_rank = self.ranks[right_root as usize].load(Ordering::Relaxed);

        let (parent, child) = choose_parent_child(left_root, right_root, left_rank, right_rank);

        self.parents[child as usize].store(parent, Ordering::Release);

        if left_rank == right_rank {
            self.ranks[parent as usize].fetch_add(1, Ordering::Relaxed);
        }

        self.components.fetch_sub(1, Ordering::AcqRel);
    }

    fn is_root(&self, node: NodeId) -> bool {
        self.parents[node as usize].load(Ordering::Acquire) == node
    }
}

impl ConcurrentDisjointSet for StripedUnionFind {
    fn with_len(len: usize) -> Self {
        let parents = (0..len).map(|id| AtomicU32::new(to_node_id(id))).collect();
        let ranks = (0..len).map(|_| AtomicU32::new(0)).collect();
        let locks = (0..len).map(|_| Mutex::new(())).collect();

        Self {
            parents,
            ranks,
            components: AtomicUsize::new(len),
            locks,
        }
    }

    fn len(&self) -> usize {
        self.parents.len()
    }

    fn unite(&self, left: NodeId, right: NodeId) {
        loop {
            let left_root = self.find(left);
            let right_root = self.find(right);

            if left_root == right_root {
                return;
            }

            let lock_pair = lock_order(left_root, right_root);
            let (first_lock, second_lock) = lock_pair;
            let _first_guard = self.lock_root(first_lock);
            let _second_guard = (second_lock != first_lock).then(|| self.lock_root(second_lock));

            let current_left = self.find(left);
            let current_right = self.find(right);

            if current_left == current_right {
                return;
            }

            if lock_order(current_left, current_right) != lock_pair {
                continue;
            }

            if !self.is_root(current_left) || !self.is_root(current_right) {
                continue;
            }

            self.union_roots(current_left, current_right);
            return;
        }
    }

    fn find(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            let parent = self.parents[current as usize].load(Ordering::Acquire);

            if parent == current {
                return current;
            }

            let grandparent = self.parents[parent as usize].load(Ordering::Acquire);

            if grandparent != parent {
                self.parents[current as usize].store(grandparent, Ordering::Release);
            }

            current = parent;
        }
    }
}

const fn lock_order(first: NodeId, second: NodeId) -> (NodeId, NodeId) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

const fn choose_parent_child(
    left_root: NodeId,
    right_root: NodeId,
    left_rank: u32,
    right_rank: u32,
) -> (NodeId, NodeId) {
    if left_rank > right_rank {
        return (left_root, right_root);
    }
    if right_rank > left_rank {
        return (right_root, left_root);
    }

    lock_order(left_root, right_root)
}
