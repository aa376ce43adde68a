//! Strategy builders for dendrogram property-based tests.
//!
//! Generators grow a dendrogram bottom-up by repeatedly merging active
//! clusters, assigning fresh ids in `[num_nodes, 2 * num_nodes - 1)` in
//! creation order. Similarities are drawn from a coarse grid of levels so
//! that ties between siblings, between parent and child, and with the
//! threshold are frequent.

use std::{collections::VecDeque, ops::Range};

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{NodeId, test_utils::Merge};

use super::types::{DendrogramFixture, SimilarityProfile, TreeShape};

/// Minimum leaf count for generated dendrograms.
const MIN_LEAVES: usize = 2;
/// Maximum leaf count for generated dendrograms.
const MAX_LEAVES: usize = 96;
/// Number of similarity steps between 0 and 1.
const LEVELS: u8 = 20;
/// Largest number of children in a random merge.
const MAX_ARITY: usize = 4;

/// Generates fixtures covering every shape and similarity profile.
pub(super) fn dendrogram_fixture_strategy() -> impl Strategy<Value = DendrogramFixture> {
    (shape_strategy(), profile_strategy(), any::<u64>()).prop_map(|(shape, profile, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(shape, profile, &mut rng)
    })
}

fn shape_strategy() -> impl Strategy<Value = TreeShape> {
    prop_oneof![
        1 => Just(TreeShape::Balanced),
        1 => Just(TreeShape::Caterpillar),
        2 => Just(TreeShape::RandomKary),
        1 => Just(TreeShape::Forest),
    ]
}

fn profile_strategy() -> impl Strategy<Value = SimilarityProfile> {
    prop_oneof![
        Just(SimilarityProfile::Monotone),
        Just(SimilarityProfile::Inverted),
    ]
}

/// Generates a fixture for a specific shape and profile.
///
/// Useful for targeted rstest cases where the parameters are chosen
/// explicitly rather than sampled by proptest.
pub(super) fn generate_fixture(
    shape: TreeShape,
    profile: SimilarityProfile,
    rng: &mut SmallRng,
) -> DendrogramFixture {
    let num_nodes = rng.gen_range(MIN_LEAVES..=MAX_LEAVES);
    let mut builder = MergeBuilder::new(num_nodes, profile);

    match shape {
        TreeShape::Balanced => builder.balanced(rng),
        TreeShape::Caterpillar => builder.caterpillar(rng),
        TreeShape::RandomKary => builder.random_kary(1, rng),
        TreeShape::Forest => {
            let roots = rng.gen_range(2..=4).min(num_nodes);
            builder.random_kary(roots, rng);
        }
    }

    DendrogramFixture {
        num_nodes,
        merges: builder.merges,
        shape,
        profile,
        threshold: similarity(rng.gen_range(0..=LEVELS + 1)),
    }
}

/// Maps a grid level to a similarity in `[0, 1]`.
fn similarity(level: u8) -> f32 {
    f32::from(level) / f32::from(LEVELS)
}

/// Accumulates merges and hands out cluster ids.
struct MergeBuilder {
    profile: SimilarityProfile,
    num_nodes: usize,
    next_id: NodeId,
    /// Level of the merge that created each cluster. Leaves sit at the top.
    levels: Vec<u8>,
    merges: Vec<Merge>,
}

impl MergeBuilder {
    fn new(num_nodes: usize, profile: SimilarityProfile) -> Self {
        Self {
            profile,
            num_nodes,
            next_id: to_id(num_nodes),
            levels: vec![LEVELS; num_nodes],
            merges: Vec::with_capacity(num_nodes.saturating_sub(1)),
        }
    }

    fn leaves(&self) -> Range<NodeId> {
        0..to_id(self.num_nodes)
    }

    /// Records a merge of `children` into a fresh cluster and returns it.
    fn merge(&mut self, children: &[NodeId], rng: &mut SmallRng) -> NodeId {
        let parent = self.next_id;
        self.next_id += 1;

        let edges: Vec<(NodeId, f32)> = match self.profile {
            SimilarityProfile::Monotone => {
                let ceiling = children
                    .iter()
                    .map(|&child| self.levels[child as usize])
                    .min()
                    .unwrap_or(LEVELS);
                let level = rng.gen_range(0..=ceiling);
                self.levels.push(level);
                children
                    .iter()
                    .map(|&child| (child, similarity(level)))
                    .collect()
            }
            SimilarityProfile::Inverted => {
                self.levels.push(0);
                children
                    .iter()
                    .map(|&child| (child, similarity(rng.gen_range(0..=LEVELS))))
                    .collect()
            }
        };

        self.merges.push((parent, edges));
        parent
    }

    fn balanced(&mut self, rng: &mut SmallRng) {
        let mut queue: VecDeque<NodeId> = self.leaves().collect();
        while let (Some(left), Some(right)) = (queue.pop_front(), queue.pop_front()) {
            let parent = self.merge(&[left, right], rng);
            queue.push_back(parent);
        }
    }

    fn caterpillar(&mut self, rng: &mut SmallRng) {
        let mut leaves = self.leaves();
        let Some(mut spine) = leaves.next() else {
            return;
        };
        for leaf in leaves {
            spine = self.merge(&[spine, leaf], rng);
        }
    }

    /// Merges random groups until `roots` clusters remain.
    fn random_kary(&mut self, roots: usize, rng: &mut SmallRng) {
        let mut active: Vec<NodeId> = self.leaves().collect();
        while active.len() > roots {
            let arity = rng.gen_range(2..=MAX_ARITY.min(active.len() - roots + 1));
            let children: Vec<NodeId> = (0..arity)
                .map(|_| active.swap_remove(rng.gen_range(0..active.len())))
                .collect();
            let parent = self.merge(&children, rng);
            active.push(parent);
        }
    }
}

fn to_id(index: usize) -> NodeId {
    NodeId::try_from(index).unwrap_or(NodeId::MAX)
}
