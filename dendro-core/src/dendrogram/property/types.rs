//! Type definitions for dendrogram property-based tests.
//!
//! Provides the fixture, configuration, tree shape and similarity profile
//! types used by the generators and property functions.

use dendro_test_support::ci::property_test_profile::concurrency_repetitions;
use rayon::prelude::*;

use crate::{Dendrogram, test_utils::Merge};

/// Topology of a generated dendrogram.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum TreeShape {
    /// Pairs clusters breadth-first, giving a balanced binary tree.
    Balanced,
    /// Merges the growing spine with one leaf at a time, giving the
    /// deepest possible paths.
    Caterpillar,
    /// Merges two to four random clusters at a time.
    RandomKary,
    /// Random k-ary merges that stop while two to four roots remain.
    Forest,
}

/// How merge similarities are assigned to the edges of a generated tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum SimilarityProfile {
    /// Siblings share one similarity that never exceeds those of the merges
    /// below it.
    Monotone,
    /// Every edge draws its own similarity, so siblings disagree and
    /// inversions along paths are common.
    Inverted,
}

/// Fixture for dendrogram property tests.
///
/// Captures the merges and the generation parameters, providing full
/// context for failure diagnosis.
#[derive(Clone, Debug)]
pub(super) struct DendrogramFixture {
    /// Number of leaves.
    pub num_nodes: usize,
    /// Recorded merges, in creation order.
    pub merges: Vec<Merge>,
    /// Topology used during generation.
    pub shape: TreeShape,
    /// Similarity assignment used during generation.
    pub profile: SimilarityProfile,
    /// Threshold the properties cut at.
    pub threshold: f32,
}

impl DendrogramFixture {
    /// Records every merge into a fresh dendrogram, one rayon task per
    /// merge.
    pub(super) fn build(&self) -> Dendrogram {
        let dendrogram = Dendrogram::new(self.num_nodes);
        self.merges.par_iter().for_each(|(parent, children)| {
            dendrogram.merge_children(*parent, children);
        });
        dendrogram
    }

    /// Short description used in failure messages.
    pub(super) fn describe(&self) -> String {
        format!(
            "shape={:?}, profile={:?}, leaves={}, merges={}, threshold={}",
            self.shape,
            self.profile,
            self.num_nodes,
            self.merges.len(),
            self.threshold,
        )
    }
}

/// Configuration for the repeated-run property.
///
/// Controls how many times each cut is re-executed on the same input to
/// detect race-induced non-determinism.
pub(super) struct ConcurrencyConfig {
    /// Number of times to repeat each cut per input.
    pub repetitions: usize,
}

impl ConcurrencyConfig {
    /// Loads the configuration from `DENDRO_PBT_CONCURRENCY_REPS`, falling
    /// back to 5 repetitions.
    pub(super) fn load() -> Self {
        let repetitions = concurrency_repetitions(5);
        Self {
            repetitions: usize::try_from(repetitions).unwrap_or(usize::MAX),
        }
    }
}
