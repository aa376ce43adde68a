//! Synthetic dendrograms for benchmarking.
//!
//! Trees are grown bottom-up from a seeded RNG so every benchmark run sees
//! the same merges. Merge ids are handed out in creation order starting at
//! the leaf count, matching how an agglomerative clusterer numbers them.

use std::collections::VecDeque;

use dendro_core::{Dendrogram, NodeId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::BenchSetupError;

/// A k-ary merge recorded as `(parent, [(child, similarity)])`.
pub type Merge = (NodeId, Vec<(NodeId, f32)>);

/// Topology of a synthetic dendrogram.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeShape {
    /// Balanced binary tree of depth `log2(n)`.
    Balanced,
    /// One spine absorbing a leaf per merge, depth `n - 1`.
    Caterpillar,
    /// Random merges of two to four clusters.
    RandomKary,
}

impl TreeShape {
    /// Returns the label used in benchmark ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Caterpillar => "caterpillar",
            Self::RandomKary => "kary",
        }
    }
}

/// How similarities change from leaf to root.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SimilarityOrder {
    /// Similarities never increase towards the root and siblings agree.
    Monotone,
    /// Every edge draws an independent similarity in `[0, 1)`.
    Inverted,
}

impl SimilarityOrder {
    /// Returns the label used in benchmark ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monotone => "monotone",
            Self::Inverted => "inverted",
        }
    }
}

/// Configuration for synthetic dendrogram generation.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    /// Number of leaves.
    pub leaf_count: usize,
    /// Topology of the tree.
    pub shape: TreeShape,
    /// Similarity assignment.
    pub order: SimilarityOrder,
    /// RNG seed.
    pub seed: u64,
}

/// Merges of a generated dendrogram, ready to be replayed into a store.
#[derive(Clone, Debug)]
pub struct SyntheticDendrogram {
    leaf_count: usize,
    merges: Vec<Merge>,
}

impl SyntheticDendrogram {
    /// Generates the merges described by `config`.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::ZeroValue`] when `leaf_count` is zero and
    /// [`BenchSetupError::Dendrogram`] when the cluster id space would not
    /// fit.
    pub fn generate(config: &SyntheticConfig) -> Result<Self, BenchSetupError> {
        if config.leaf_count == 0 {
            return Err(BenchSetupError::ZeroValue {
                context: "leaf_count",
            });
        }
        // Validates the id space before any merge is generated.
        let probe = Dendrogram::try_new(config.leaf_count)?;
        let mut grower = Grower {
            rng: SmallRng::seed_from_u64(config.seed),
            order: config.order,
            next_id: probe.num_nodes(),
            ceilings: vec![1.0; config.leaf_count],
            merges: Vec::with_capacity(config.leaf_count - 1),
        };
        let leaves = 0..probe.num_nodes();

        match config.shape {
            TreeShape::Balanced => {
                let mut queue: VecDeque<NodeId> = leaves.collect();
                while let (Some(left), Some(right)) = (queue.pop_front(), queue.pop_front()) {
                    queue.push_back(grower.merge(vec![left, right]));
                }
            }
            TreeShape::Caterpillar => {
                let mut spine = 0;
                for leaf in leaves.skip(1) {
                    spine = grower.merge(vec![spine, leaf]);
                }
            }
            TreeShape::RandomKary => {
                let mut active: Vec<NodeId> = leaves.collect();
                while active.len() > 1 {
                    let arity = grower.rng.gen_range(2..=active.len().min(4));
                    let mut children = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        let index = grower.rng.gen_range(0..active.len());
                        children.push(active.swap_remove(index));
                    }
                    active.push(grower.merge(children));
                }
            }
        }

        Ok(Self {
            leaf_count: config.leaf_count,
            merges: grower.merges,
        })
    }

    /// Returns the number of leaves.
    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Returns the generated merges in creation order.
    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Replays the merges into a new store, one rayon task per merge.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Dendrogram`] when allocation or any write
    /// fails.
    pub fn build(&self) -> Result<Dendrogram, BenchSetupError> {
        let dendrogram = Dendrogram::try_new(self.leaf_count)?;
        self.merges
            .par_iter()
            .try_for_each(|(parent, children)| dendrogram.try_merge_children(*parent, children))?;
        Ok(dendrogram)
    }
}

struct Grower {
    rng: SmallRng,
    order: SimilarityOrder,
    next_id: NodeId,
    /// Upper bound for the merge similarity of each cluster's parent.
    ceilings: Vec<f32>,
    merges: Vec<Merge>,
}

impl Grower {
    fn merge(&mut self, children: Vec<NodeId>) -> NodeId {
        let parent = self.next_id;
        self.next_id += 1;

        let edges: Vec<(NodeId, f32)> = match self.order {
            SimilarityOrder::Monotone => {
                let ceiling = children
                    .iter()
                    .map(|&child| self.ceilings[child as usize])
                    .fold(1.0_f32, f32::min);
                let similarity = ceiling * self.rng.gen_range(0.8_f32..=1.0);
                self.ceilings.push(similarity);
                children.into_iter().map(|child| (child, similarity)).collect()
            }
            SimilarityOrder::Inverted => {
                self.ceilings.push(1.0);
                children
                    .into_iter()
                    .map(|child| (child, self.rng.gen_range(0.0_f32..1.0)))
                    .collect()
            }
        };

        self.merges.push((parent, edges));
        parent
    }
}
