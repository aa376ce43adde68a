//! Subtree-consistent cut for dendrograms that may not be monotone.
//!
//! Each leaf belongs to the last node on its leaf-to-root path whose
//! incoming merge clears the threshold, or to itself when no ancestor
//! qualifies. The cut runs in two barrier-separated phases:
//!
//! 1. Every child scatters its edge similarity into its parent's slot with
//!    an atomic max, giving each cluster the similarity of the strongest
//!    merge that created it.
//! 2. Every leaf walks towards the root in parallel. Whenever the parent's
//!    merge qualifies, the path from the last qualifying node up to the
//!    parent is united and the parent becomes the new last qualifying node.
//!    As soon as a child and its parent are already in one component the
//!    walker unites its pending segment and stops, because the worker that
//!    joined that edge owns the rest of the path.
//!
//! The component check in phase 2 reads the union-find without
//! synchronising with unions still in flight on other workers. A stale read
//! can only report "different" for nodes that are already joined, which
//! costs some redundant, idempotent unions; a "same" answer is never wrong
//! because sets only grow. The result is the same partition on every run
//! even though the order of unions is not.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use tracing::{Level, debug, instrument};

use crate::{result::FlatClustering, union_find::ConcurrentDisjointSet};

use super::{CutStrategy, Dendrogram, NodeId, threshold::record_cut};

/// Counts of the work done by the phase 2 walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct WalkStats {
    steps: u64,
    early_exits: u64,
}

impl WalkStats {
    const fn merge(self, other: Self) -> Self {
        Self {
            steps: self.steps + other.steps,
            early_exits: self.early_exits + other.early_exits,
        }
    }
}

impl Dendrogram {
    /// Assigns each leaf to its last ancestor whose merge clears
    /// `threshold`, using the union-find `U`.
    ///
    /// A cluster's merge similarity is the maximum over the edges of its
    /// children, compared with the same tolerance as
    /// [`Self::clustering_with`]. Every returned cluster is a connected
    /// subtree of the dendrogram whether or not similarities are monotone.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::Dendrogram;
    ///
    /// // Leaves join at 0.3 and their parents join at 0.8.
    /// let dendrogram = Dendrogram::new(4);
    /// dendrogram.merge_children(4, &[(0, 0.3), (1, 0.3)]);
    /// dendrogram.merge_children(5, &[(2, 0.3), (3, 0.3)]);
    /// dendrogram.merge_children(6, &[(4, 0.8), (5, 0.8)]);
    ///
    /// // Node 6 is the last qualifying ancestor of every leaf.
    /// assert_eq!(dendrogram.subtree_clustering(0.5).cluster_count(), 1);
    /// // No leaf edge clears 0.5, so the threshold cut keeps singletons.
    /// assert_eq!(dendrogram.clustering(0.5).cluster_count(), 4);
    /// ```
    #[must_use]
    #[instrument(
        name = "dendrogram.subtree_clustering",
        level = "debug",
        skip(self),
        fields(num_nodes = self.num_nodes),
    )]
    pub fn subtree_clustering_with<U: ConcurrentDisjointSet>(
        &self,
        threshold: f32,
    ) -> FlatClustering {
        let merge_similarities = self.merge_similarities();
        let union_find = U::with_len(self.max_cluster_id as usize);

        let stats = (0..self.num_nodes)
            .into_par_iter()
            .map(|leaf| self.walk_leaf(leaf, threshold, &merge_similarities, &union_find))
            .reduce(WalkStats::default, WalkStats::merge);

        let clustering = self.leaf_assignments(&union_find);
        record_cut(CutStrategy::SubtreeConsistent);
        record_walk(stats);
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                clusters = clustering.cluster_count(),
                steps = stats.steps,
                early_exits = stats.early_exits,
                "subtree cut completed"
            );
        }
        clustering
    }

    /// Phase 1: the maximum child similarity of every cluster that is
    /// somebody's parent. Slots without a non-NaN child edge stay NaN and
    /// never clear a threshold.
    pub(super) fn merge_similarities(&self) -> Vec<AtomicU32> {
        let merge_similarities: Vec<AtomicU32> = (0..self.max_cluster_id)
            .map(|_| AtomicU32::new(f32::NAN.to_bits()))
            .collect();

        (0..self.max_cluster_id).into_par_iter().for_each(|node| {
            let edge = self.parent(node);
            if let Some(parent) = edge.parent() {
                fetch_max_similarity(
                    &merge_similarities[parent as usize],
                    edge.merge_similarity(),
                );
            }
        });

        merge_similarities
    }

    /// Phase 2 for a single leaf.
    fn walk_leaf<U: ConcurrentDisjointSet>(
        &self,
        leaf: NodeId,
        threshold: f32,
        merge_similarities: &[AtomicU32],
        union_find: &U,
    ) -> WalkStats {
        let mut stats = WalkStats::default();
        let mut child = leaf;
        let mut last_root = leaf;

        while let Some(parent) = self.parent(child).parent() {
            stats.steps += 1;
            let child_component = union_find.find_relaxed(child);
            let parent_component = union_find.find_relaxed(parent);

            if child_component == parent_component {
                // Whoever joined this edge also walks the rest of the path.
                self.unite_along_path(last_root, child, union_find);
                stats.early_exits += 1;
                break;
            }

            let similarity =
                f32::from_bits(merge_similarities[parent as usize].load(Ordering::Relaxed));
            if self.tolerance.clears(similarity, threshold) {
                self.unite_along_path(last_root, parent, union_find);
                last_root = parent;
            }
            child = parent;
        }

        stats
    }

    /// Unites every node on the path from `node` up to `ancestor` with
    /// `ancestor`.
    fn unite_along_path<U: ConcurrentDisjointSet>(
        &self,
        node: NodeId,
        ancestor: NodeId,
        union_find: &U,
    ) {
        if union_find.find(node) == union_find.find(ancestor) {
            return;
        }

        let mut current = node;
        while current != ancestor {
            union_find.unite(current, ancestor);
            match self.parent(current).parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }
}

/// Raises `slot` to `similarity` if it is larger or the slot is still
/// empty, retrying on contention. NaN never wins.
fn fetch_max_similarity(slot: &AtomicU32, similarity: f32) {
    let _previous = slot.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
        let current = f32::from_bits(bits);
        (similarity > current || (current.is_nan() && !similarity.is_nan()))
            .then_some(similarity.to_bits())
    });
}

#[cfg(feature = "metrics")]
fn record_walk(stats: WalkStats) {
    metrics::counter!("dendrogram_subtree_walk_steps").increment(stats.steps);
    metrics::counter!("dendrogram_subtree_walk_early_exits").increment(stats.early_exits);
}

#[cfg(not(feature = "metrics"))]
fn record_walk(_stats: WalkStats) {}
