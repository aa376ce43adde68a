//! Builder for configuring [`Dendrogram`] instances.

use crate::{Result, dendrogram::Dendrogram, numeric::SimilarityTolerance};

/// Configures and constructs [`Dendrogram`] instances.
///
/// # Examples
/// ```
/// use dendro_core::{DendrogramBuilder, SimilarityTolerance};
///
/// let dendrogram = DendrogramBuilder::new(8)
///     .with_tolerance(SimilarityTolerance::exact())
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(dendrogram.num_nodes(), 8);
/// assert_eq!(dendrogram.max_cluster_id(), 15);
/// assert_eq!(dendrogram.tolerance(), SimilarityTolerance::exact());
/// ```
#[derive(Debug, Clone)]
pub struct DendrogramBuilder {
    num_nodes: usize,
    tolerance: SimilarityTolerance,
}

impl DendrogramBuilder {
    /// Creates a builder for `num_nodes` leaves with the default tolerance.
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            tolerance: SimilarityTolerance::default(),
        }
    }

    /// Returns the configured number of leaves.
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Overrides the tolerance used at the threshold boundary.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: SimilarityTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the configured tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> SimilarityTolerance {
        self.tolerance
    }

    /// Validates the configuration and allocates the dendrogram.
    ///
    /// # Errors
    /// Returns [`crate::DendrogramError::EmptyDendrogram`] when `num_nodes`
    /// is zero and [`crate::DendrogramError::ClusterIdSpaceExhausted`] when
    /// the cluster id space would reach [`crate::INVALID_NODE_ID`].
    pub fn build(self) -> Result<Dendrogram> {
        Dendrogram::with_tolerance(self.num_nodes, self.tolerance)
    }
}
