//! Flat clusterings produced by cutting a dendrogram.
//!
//! Both cuts return one `(leaf, representative)` pair per leaf, in leaf
//! order. Representatives are opaque cluster ids chosen by the union-find;
//! only the grouping they induce is meaningful.

use std::collections::HashMap;

use crate::dendrogram::NodeId;

/// Dense `(leaf, representative)` assignment for every leaf.
///
/// # Examples
/// ```
/// use dendro_core::FlatClustering;
///
/// let left = FlatClustering::from_pairs(vec![(0, 3), (1, 3), (2, 2)]);
/// let right = FlatClustering::from_pairs(vec![(0, 0), (1, 0), (2, 7)]);
/// assert_eq!(left.cluster_count(), 2);
/// assert!(left.same_partition(&right));
/// assert_eq!(left.canonical_labels(), vec![0, 0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatClustering {
    pairs: Vec<(NodeId, NodeId)>,
}

impl FlatClustering {
    /// Wraps `(leaf, representative)` pairs, ordered by leaf.
    #[must_use]
    pub const fn from_pairs(pairs: Vec<(NodeId, NodeId)>) -> Self {
        Self { pairs }
    }

    /// Returns the `(leaf, representative)` pairs.
    #[must_use]
    #[rustfmt::skip]
    pub fn pairs(&self) -> &[(NodeId, NodeId)] { &self.pairs }

    /// Consumes the clustering and returns its pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(NodeId, NodeId)> {
        self.pairs
    }

    /// Returns the number of leaves covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` when no leaves are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the representative assigned to `leaf`.
    #[must_use]
    pub fn representative(&self, leaf: NodeId) -> Option<NodeId> {
        self.pairs
            .get(leaf as usize)
            .map(|&(_, representative)| representative)
    }

    /// Returns the number of distinct clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        let mut representatives: Vec<NodeId> = self.pairs.iter().map(|&(_, rep)| rep).collect();
        representatives.sort_unstable();
        representatives.dedup();
        representatives.len()
    }

    /// Relabels clusters with contiguous ids in order of first appearance.
    ///
    /// Two clusterings describe the same partition exactly when their
    /// canonical labels are equal.
    #[must_use]
    pub fn canonical_labels(&self) -> Vec<usize> {
        let mut labels = HashMap::new();
        self.pairs
            .iter()
            .map(|&(_, representative)| {
                let next = labels.len();
                *labels.entry(representative).or_insert(next)
            })
            .collect()
    }

    /// Returns `true` when both clusterings group the leaves identically,
    /// whatever representatives they use.
    #[must_use]
    pub fn same_partition(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical_labels() == other.canonical_labels()
    }
}
