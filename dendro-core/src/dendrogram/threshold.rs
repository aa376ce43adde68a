//! Threshold cut: union every edge whose similarity clears the threshold.

use rayon::prelude::*;
use tracing::{Level, debug, instrument};

use crate::{result::FlatClustering, union_find::ConcurrentDisjointSet};

use super::{CutStrategy, Dendrogram};

impl Dendrogram {
    /// Cuts every edge whose similarity is below `threshold` and reports
    /// the component of each leaf, using the union-find `U`.
    ///
    /// Edges that are almost equal to the threshold (see
    /// [`crate::SimilarityTolerance`]) are kept. When similarities never
    /// increase from leaf to root, every cluster is a subtree of the
    /// dendrogram. Otherwise a low edge under a high one can join leaves
    /// through an internal node they do not share a qualifying path to; use
    /// [`Self::subtree_clustering_with`] for that case.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::{Dendrogram, StripedUnionFind};
    ///
    /// let dendrogram = Dendrogram::new(3);
    /// dendrogram.merge_children(3, &[(0, 0.9), (1, 0.9)]);
    /// dendrogram.merge_children(4, &[(3, 0.5), (2, 0.5)]);
    ///
    /// let cut = dendrogram.clustering_with::<StripedUnionFind>(0.6);
    /// assert_eq!(cut.cluster_count(), 2);
    /// ```
    #[must_use]
    #[instrument(
        name = "dendrogram.clustering",
        level = "debug",
        skip(self),
        fields(num_nodes = self.num_nodes),
    )]
    pub fn clustering_with<U: ConcurrentDisjointSet>(&self, threshold: f32) -> FlatClustering {
        let union_find = U::with_len(self.max_cluster_id as usize);
        let tolerance = self.tolerance;

        (0..self.max_cluster_id).into_par_iter().for_each(|node| {
            let edge = self.parent(node);
            if let Some(parent) = edge.parent()
                && tolerance.clears(edge.merge_similarity(), threshold)
            {
                union_find.unite(node, parent);
            }
        });

        let clustering = self.leaf_assignments(&union_find);
        record_cut(CutStrategy::Threshold);
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                clusters = clustering.cluster_count(),
                "threshold cut completed"
            );
        }
        clustering
    }
}

#[cfg(feature = "metrics")]
pub(super) fn record_cut(strategy: CutStrategy) {
    metrics::counter!("dendrogram_cuts_total", "strategy" => strategy.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(super) fn record_cut(_strategy: CutStrategy) {}
