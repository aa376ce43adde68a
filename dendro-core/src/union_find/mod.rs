//! Concurrent disjoint-set structures used by the dendrogram cuts.
//!
//! Every query allocates its own instance over the full cluster id space and
//! mutates it from many rayon workers at once. Implementations must make
//! `unite` idempotent and order independent, and `find` must settle on one
//! representative per component once all unions have completed.

mod lock_free;
mod striped;

use crate::dendrogram::NodeId;

pub use self::{lock_free::AsyncUnionFind, striped::StripedUnionFind};

/// Thread-safe union-find over the id space `[0, len)`.
///
/// # Examples
/// ```
/// use dendro_core::{AsyncUnionFind, ConcurrentDisjointSet};
///
/// let sets = AsyncUnionFind::with_len(4);
/// sets.unite(0, 1);
/// sets.unite(1, 0);
/// assert_eq!(sets.find(0), sets.find(1));
/// assert_ne!(sets.find(0), sets.find(2));
/// ```
pub trait ConcurrentDisjointSet: Sync {
    /// Creates `len` singleton sets.
    fn with_len(len: usize) -> Self
    where
        Self: Sized;

    /// Returns the size of the id space.
    fn len(&self) -> usize;

    /// Returns `true` when the id space is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges the sets containing `left` and `right`. Repeated or concurrent
    /// calls with the same arguments are harmless.
    fn unite(&self, left: NodeId, right: NodeId);

    /// Returns the current representative of the set containing `node`.
    fn find(&self, node: NodeId) -> NodeId;

    /// Returns a representative without synchronising with in-flight unions.
    ///
    /// The answer may be stale while other threads are uniting, but two
    /// nodes reported in the same set really are in the same set. Callers
    /// use it for pruning checks that tolerate a false "different".
    fn find_relaxed(&self, node: NodeId) -> NodeId {
        self.find(node)
    }
}

/// Narrows an index of the id space to a [`NodeId`].
///
/// Callers size their structures from a dendrogram whose id space is
/// already checked to sit below the sentinel, so saturation never happens
/// in practice.
fn to_node_id(index: usize) -> NodeId {
    NodeId::try_from(index).unwrap_or(NodeId::MAX)
}
