//! Dendrogram storage and its build-phase API.
//!
//! The store is a fixed array of `2 * num_nodes - 1` parent edges, one per
//! cluster id. Leaves occupy `[0, num_nodes)`; the clustering algorithm
//! assigns merge-created clusters ids in `[num_nodes, 2 * num_nodes - 1)`
//! and records one edge per child of each merge. Each slot is written at
//! most once, after which the whole store is read-only and can be shared
//! freely between concurrent queries.
//!
//! Edges are packed into a single `AtomicU64` (`parent_id` in the high half,
//! the similarity's bit pattern in the low half). Writers claim an unset
//! slot with one compare-and-swap, which doubles as the write-once check.

mod subtree;
mod threshold;

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    error::{DendrogramError, Result},
    numeric::SimilarityTolerance,
    result::FlatClustering,
    union_find::{AsyncUnionFind, ConcurrentDisjointSet},
};

/// Identifier of a leaf or of a merge-created cluster.
pub type NodeId = u32;

/// Sentinel parent id meaning "no parent recorded".
pub const INVALID_NODE_ID: NodeId = NodeId::MAX;

/// Edge from a child cluster to the cluster it was merged into.
///
/// # Examples
/// ```
/// use dendro_core::{INVALID_NODE_ID, ParentEdge};
///
/// let edge = ParentEdge::new(4, 0.75);
/// assert_eq!(edge.parent(), Some(4));
/// assert!(ParentEdge::UNSET.parent().is_none());
/// assert_eq!(ParentEdge::UNSET.parent_id(), INVALID_NODE_ID);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParentEdge {
    parent_id: NodeId,
    merge_similarity: f32,
}

impl ParentEdge {
    /// The value of every slot before its child is merged.
    pub const UNSET: Self = Self {
        parent_id: INVALID_NODE_ID,
        merge_similarity: 0.0,
    };

    /// Creates an edge to `parent_id` with the given merge similarity.
    #[must_use]
    pub const fn new(parent_id: NodeId, merge_similarity: f32) -> Self {
        Self {
            parent_id,
            merge_similarity,
        }
    }

    /// Returns the raw parent id, which is [`INVALID_NODE_ID`] when unset.
    #[must_use]
    #[rustfmt::skip]
    pub const fn parent_id(&self) -> NodeId { self.parent_id }

    /// Returns the similarity of the merge this edge records.
    #[must_use]
    #[rustfmt::skip]
    pub const fn merge_similarity(&self) -> f32 { self.merge_similarity }

    /// Returns the parent id, or `None` when no parent is recorded.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        if self.is_valid() {
            Some(self.parent_id)
        } else {
            None
        }
    }

    /// Returns `true` when a parent is recorded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.parent_id != INVALID_NODE_ID
    }

    fn pack(self) -> u64 {
        (u64::from(self.parent_id) << 32) | u64::from(self.merge_similarity.to_bits())
    }

    fn unpack(raw: u64) -> Self {
        let parent_id = NodeId::try_from(raw >> 32).unwrap_or(INVALID_NODE_ID);
        let bits = u32::try_from(raw & u64::from(u32::MAX)).unwrap_or_default();
        Self {
            parent_id,
            merge_similarity: f32::from_bits(bits),
        }
    }
}

/// Selects which flat cut [`Dendrogram::cut`] performs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CutStrategy {
    /// Keep every edge clearing the threshold ([`Dendrogram::clustering`]).
    Threshold,
    /// Assign leaves to their last qualifying ancestor
    /// ([`Dendrogram::subtree_clustering`]).
    SubtreeConsistent,
    /// Use the threshold cut when the dendrogram is monotone and the
    /// subtree-consistent cut otherwise.
    #[default]
    Auto,
}

impl CutStrategy {
    /// Returns the label used in spans and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::SubtreeConsistent => "subtree_consistent",
            Self::Auto => "auto",
        }
    }
}

/// Node-weighted forest recording the merges of a hierarchical clustering.
///
/// # Examples
/// ```
/// use dendro_core::Dendrogram;
///
/// let dendrogram = Dendrogram::new(3);
/// dendrogram.merge_to_parent(0, 3, 0.9);
/// dendrogram.merge_to_parent(1, 3, 0.9);
/// dendrogram.merge_to_parent(3, 4, 0.5);
/// dendrogram.merge_to_parent(2, 4, 0.5);
///
/// let cut = dendrogram.clustering(0.6);
/// assert_eq!(cut.representative(0), cut.representative(1));
/// assert_ne!(cut.representative(0), cut.representative(2));
/// assert_eq!(dendrogram.clustering(0.4).cluster_count(), 1);
/// ```
#[derive(Debug)]
pub struct Dendrogram {
    parent_pointers: Vec<AtomicU64>,
    num_nodes: NodeId,
    max_cluster_id: NodeId,
    tolerance: SimilarityTolerance,
}

impl Dendrogram {
    /// Creates a dendrogram over `num_nodes` leaves.
    ///
    /// # Panics
    /// Panics when `num_nodes` is zero or when `2 * num_nodes - 1` reaches
    /// [`INVALID_NODE_ID`]. Use [`Self::try_new`] to handle these cases.
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        match Self::try_new(num_nodes) {
            Ok(dendrogram) => dendrogram,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a dendrogram over `num_nodes` leaves.
    ///
    /// # Errors
    /// Returns [`DendrogramError::EmptyDendrogram`] when `num_nodes` is zero
    /// and [`DendrogramError::ClusterIdSpaceExhausted`] when the cluster id
    /// space would reach [`INVALID_NODE_ID`].
    pub fn try_new(num_nodes: usize) -> Result<Self> {
        Self::with_tolerance(num_nodes, SimilarityTolerance::default())
    }

    pub(crate) fn with_tolerance(num_nodes: usize, tolerance: SimilarityTolerance) -> Result<Self> {
        if num_nodes == 0 {
            return Err(DendrogramError::EmptyDendrogram);
        }
        let (num_nodes, max_cluster_id) = cluster_id_space(num_nodes)?;

        let parent_pointers = (0..max_cluster_id)
            .map(|_| AtomicU64::new(ParentEdge::UNSET.pack()))
            .collect();
        debug!(num_nodes, max_cluster_id, "allocated dendrogram");

        Ok(Self {
            parent_pointers,
            num_nodes,
            max_cluster_id,
            tolerance,
        })
    }

    /// Returns the number of leaves.
    #[must_use]
    #[rustfmt::skip]
    pub const fn num_nodes(&self) -> NodeId { self.num_nodes }

    /// Returns the exclusive upper bound of the cluster id space,
    /// `2 * num_nodes - 1`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_cluster_id(&self) -> NodeId { self.max_cluster_id }

    /// Returns the tolerance used at the threshold boundary.
    #[must_use]
    #[rustfmt::skip]
    pub const fn tolerance(&self) -> SimilarityTolerance { self.tolerance }

    /// Returns `true` when `node` is a base object rather than a merge.
    #[must_use]
    pub const fn is_leaf(&self, node: NodeId) -> bool {
        node < self.num_nodes
    }

    /// Records that `child` was merged into `parent` with `similarity`.
    ///
    /// For a k-ary merge call this once per child. Calls for distinct
    /// children may run concurrently.
    ///
    /// # Panics
    /// Panics when `child` already has a parent or when either id lies
    /// outside the cluster id space. These are caller bugs, not recoverable
    /// conditions; [`Self::try_merge_to_parent`] reports them instead.
    pub fn merge_to_parent(&self, child: NodeId, parent: NodeId, similarity: f32) {
        if let Err(err) = self.try_merge_to_parent(child, parent, similarity) {
            panic!("{err}");
        }
    }

    /// Records that `child` was merged into `parent` with `similarity`.
    ///
    /// # Errors
    /// Returns [`DendrogramError::NodeOutOfRange`] when either id lies
    /// outside `[0, max_cluster_id)` and
    /// [`DendrogramError::ParentAlreadyAssigned`] when `child` already has a
    /// parent. The store is unchanged on error.
    pub fn try_merge_to_parent(&self, child: NodeId, parent: NodeId, similarity: f32) -> Result<()> {
        self.check_node(child)?;
        self.check_node(parent)?;

        let unset = ParentEdge::UNSET.pack();
        let edge = ParentEdge::new(parent, similarity).pack();
        self.slot(child)
            .compare_exchange(unset, edge, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|existing| DendrogramError::ParentAlreadyAssigned {
                child,
                existing_parent: ParentEdge::unpack(existing).parent_id,
            })
    }

    /// Records a k-ary merge of `children` into `parent`, one edge per
    /// `(child, similarity)` pair.
    ///
    /// # Panics
    /// Panics under the same conditions as [`Self::merge_to_parent`].
    pub fn merge_children(&self, parent: NodeId, children: &[(NodeId, f32)]) {
        if let Err(err) = self.try_merge_children(parent, children) {
            panic!("{err}");
        }
    }

    /// Records a k-ary merge of `children` into `parent`.
    ///
    /// # Errors
    /// Stops at and returns the first error reported by
    /// [`Self::try_merge_to_parent`]; edges written before it are kept.
    pub fn try_merge_children(&self, parent: NodeId, children: &[(NodeId, f32)]) -> Result<()> {
        children
            .iter()
            .try_for_each(|&(child, similarity)| self.try_merge_to_parent(child, parent, similarity))
    }

    /// Returns the parent edge recorded for `node`.
    ///
    /// # Panics
    /// Panics when `node` is not below [`Self::max_cluster_id`].
    #[must_use]
    pub fn parent(&self, node: NodeId) -> ParentEdge {
        ParentEdge::unpack(self.slot(node).load(Ordering::Acquire))
    }

    /// Returns the parent edge recorded for `node`.
    ///
    /// # Errors
    /// Returns [`DendrogramError::NodeOutOfRange`] when `node` is not below
    /// [`Self::max_cluster_id`].
    pub fn try_parent(&self, node: NodeId) -> Result<ParentEdge> {
        self.check_node(node)?;
        Ok(self.parent(node))
    }

    /// Returns `true` when `node` has a parent recorded.
    ///
    /// # Panics
    /// Panics when `node` is not below [`Self::max_cluster_id`].
    #[must_use]
    pub fn has_valid_parent(&self, node: NodeId) -> bool {
        self.parent(node).is_valid()
    }

    /// Walks from `node` towards its root, yielding each node that has a
    /// parent together with that parent edge.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::Dendrogram;
    ///
    /// let dendrogram = Dendrogram::new(2);
    /// dendrogram.merge_children(2, &[(0, 0.4), (1, 0.6)]);
    /// let path: Vec<_> = dendrogram.ancestors(1).map(|(node, edge)| (node, edge.parent())).collect();
    /// assert_eq!(path, vec![(1, Some(2))]);
    /// ```
    #[must_use]
    pub const fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            dendrogram: self,
            next: Some(node),
        }
    }

    /// Returns `true` when similarities never increase along any
    /// leaf-to-root path and siblings share their merge's similarity, both
    /// up to the configured tolerance.
    ///
    /// Only consecutive edges need comparing: every child's edge must match
    /// the strongest edge into its parent and be at least its parent's own
    /// edge. Under these conditions the threshold cut is subtree consistent.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        let merge_similarities = self.merge_similarities();
        (0..self.max_cluster_id).into_par_iter().all(|node| {
            let edge = self.parent(node);
            let Some(parent) = edge.parent() else {
                return true;
            };
            let shared =
                f32::from_bits(merge_similarities[parent as usize].load(Ordering::Relaxed));
            let upper = self.parent(parent);
            self.tolerance.almost_equals(edge.merge_similarity, shared)
                && (!upper.is_valid()
                    || self
                        .tolerance
                        .clears(edge.merge_similarity, upper.merge_similarity))
        })
    }

    /// Cuts the dendrogram at `threshold` with the requested strategy.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::{CutStrategy, Dendrogram};
    ///
    /// let dendrogram = Dendrogram::new(2);
    /// dendrogram.merge_children(2, &[(0, 0.8), (1, 0.8)]);
    /// let auto = dendrogram.cut(0.5, CutStrategy::Auto);
    /// let subtree = dendrogram.cut(0.5, CutStrategy::SubtreeConsistent);
    /// assert!(auto.same_partition(&subtree));
    /// assert_eq!(auto.cluster_count(), 1);
    /// ```
    #[must_use]
    #[instrument(
        name = "dendrogram.cut",
        level = "debug",
        skip(self, strategy),
        fields(num_nodes = self.num_nodes, strategy = strategy.as_str()),
    )]
    pub fn cut(&self, threshold: f32, strategy: CutStrategy) -> FlatClustering {
        match strategy {
            CutStrategy::Threshold => self.clustering(threshold),
            CutStrategy::SubtreeConsistent => self.subtree_clustering(threshold),
            CutStrategy::Auto => {
                if self.is_monotone() {
                    debug!("dendrogram is monotone, using the threshold cut");
                    self.clustering(threshold)
                } else {
                    self.subtree_clustering(threshold)
                }
            }
        }
    }

    /// Cuts every edge below `threshold` and reports the components.
    ///
    /// See [`Self::clustering_with`] for the guarantees.
    #[must_use]
    pub fn clustering(&self, threshold: f32) -> FlatClustering {
        self.clustering_with::<AsyncUnionFind>(threshold)
    }

    /// Assigns each leaf to its last ancestor whose merge clears
    /// `threshold`.
    ///
    /// See [`Self::subtree_clustering_with`] for the guarantees.
    #[must_use]
    pub fn subtree_clustering(&self, threshold: f32) -> FlatClustering {
        self.subtree_clustering_with::<AsyncUnionFind>(threshold)
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node < self.max_cluster_id {
            Ok(())
        } else {
            Err(DendrogramError::NodeOutOfRange {
                node,
                max_cluster_id: self.max_cluster_id,
            })
        }
    }

    fn slot(&self, node: NodeId) -> &AtomicU64 {
        &self.parent_pointers[node as usize]
    }

    fn leaf_assignments<U: ConcurrentDisjointSet>(&self, union_find: &U) -> FlatClustering {
        let pairs = (0..self.num_nodes)
            .into_par_iter()
            .map(|leaf| (leaf, union_find.find(leaf)))
            .collect();
        FlatClustering::from_pairs(pairs)
    }
}

/// Iterator returned by [`Dendrogram::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    dendrogram: &'a Dendrogram,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = (NodeId, ParentEdge);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        let edge = self.dendrogram.parent(node);
        self.next = edge.parent();
        edge.is_valid().then_some((node, edge))
    }
}

fn cluster_id_space(num_nodes: usize) -> Result<(NodeId, NodeId)> {
    let exhausted = || DendrogramError::ClusterIdSpaceExhausted {
        num_nodes,
        max_cluster_id: u64::try_from(num_nodes)
            .unwrap_or(u64::MAX)
            .saturating_mul(2)
            .saturating_sub(1),
    };
    let leaves = NodeId::try_from(num_nodes).map_err(|_| exhausted())?;
    let max_cluster_id = u64::from(leaves) * 2 - 1;
    if max_cluster_id >= u64::from(INVALID_NODE_ID) {
        return Err(exhausted());
    }
    let max_cluster_id = NodeId::try_from(max_cluster_id).map_err(|_| exhausted())?;
    Ok((leaves, max_cluster_id))
}
