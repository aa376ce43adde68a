//! Lock-free union-find for the dendrogram cuts.
//!
//! Roots are linked with a single compare-and-swap, always placing the
//! higher id under the lower one. Parent pointers therefore never increase,
//! the forest stays acyclic without ranks, and the representative of every
//! component is its smallest id. `find` halves paths with plain stores:
//! a non-root never becomes a root again, and any ancestor it is pointed
//! at stays an ancestor, so lost or reordered halving writes are harmless.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::dendrogram::NodeId;

use super::{ConcurrentDisjointSet, to_node_id};

/// Asynchronous union-find with CAS linking and path halving.
#[derive(Debug)]
pub struct AsyncUnionFind {
    parents: Vec<AtomicU32>,
}

impl AsyncUnionFind {
    fn parent(&self, node: NodeId, order: Ordering) -> NodeId {
        self.parents[node as usize].load(order)
    }

    fn link(&self, child_root: NodeId, parent_root: NodeId) -> bool {
        self.parents[child_root as usize]
            .compare_exchange(child_root, parent_root, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl ConcurrentDisjointSet for AsyncUnionFind {
    fn with_len(len: usize) -> Self {
        let parents = (0..len)
            .map(|id| AtomicU32::new(to_node_id(id)))
            .collect();
        Self { parents }
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

            let (parent_root, child_root) = if left_root < right_root {
                (left_root, right_root)
            } else {
                (right_root, left_root)
            };

            if self.link(child_root, parent_root) {
                return;
            }
        }
    }

    fn find(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            let parent = self.parent(current, Ordering::Acquire);
            if parent == current {
                return current;
            }

            let grandparent = self.parent(parent, Ordering::Acquire);
            if grandparent != parent {
                self.parents[current as usize].store(grandparent, Ordering::Release);
            }

            current = parent;
        }
    }

    fn find_relaxed(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            let parent = self.parent(current, Ordering::Relaxed);
            if parent == current {
                return current;
            }
            current = parent;
        }
    }
}
