//! Benchmark parameter types.

use std::fmt;

use crate::source::{SimilarityOrder, TreeShape};

/// Parameters for a cut benchmark run.
#[derive(Clone, Debug)]
pub struct CutBenchParams {
    /// Number of leaves in the dendrogram.
    pub leaf_count: usize,
    /// Topology of the generated tree.
    pub shape: TreeShape,
    /// Whether similarities may increase towards the root.
    pub order: SimilarityOrder,
}

impl fmt::Display for CutBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={},shape={},order={}",
            self.leaf_count,
            self.shape.as_str(),
            self.order.as_str(),
        )
    }
}
