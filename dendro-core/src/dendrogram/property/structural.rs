//! Properties 3 and 4: structural guarantees of the cuts.
//!
//! - **Subtree validity**: every cluster of the subtree-consistent cut is
//!   the full leaf set of a single dendrogram node. On monotone input the
//!   threshold cut satisfies the same.
//! - **Threshold monotonicity**: lowering the threshold never splits a
//!   cluster, for either cut.

use std::collections::{BTreeMap, HashMap};
use std::iter;

use proptest::test_runner::{TestCaseError, TestCaseResult};

use crate::{Dendrogram, FlatClustering, NodeId};

use super::oracle::leaves_under;
use super::types::{DendrogramFixture, SimilarityProfile};

/// Step between the two thresholds compared by the monotonicity property.
const THRESHOLD_STEP: f32 = 0.2;

pub(super) fn run_subtree_validity_property(fixture: &DendrogramFixture) -> TestCaseResult {
    let dendrogram = fixture.build();
    let leaves = leaves_under(&dendrogram);

    validate_subtrees(
        "subtree cut",
        &dendrogram,
        &leaves,
        &dendrogram.subtree_clustering(fixture.threshold),
        fixture,
    )?;

    if fixture.profile == SimilarityProfile::Monotone {
        validate_subtrees(
            "threshold cut",
            &dendrogram,
            &leaves,
            &dendrogram.clustering(fixture.threshold),
            fixture,
        )?;
    }
    Ok(())
}

pub(super) fn run_threshold_monotonicity_property(fixture: &DendrogramFixture) -> TestCaseResult {
    let dendrogram = fixture.build();
    let high = fixture.threshold;
    let low = high - THRESHOLD_STEP;

    ensure_refines(
        "threshold cut",
        &dendrogram.clustering(high),
        &dendrogram.clustering(low),
        fixture,
    )?;
    ensure_refines(
        "subtree cut",
        &dendrogram.subtree_clustering(high),
        &dendrogram.subtree_clustering(low),
        fixture,
    )
}

fn validate_subtrees(
    label: &str,
    dendrogram: &Dendrogram,
    leaves: &[Vec<NodeId>],
    clustering: &FlatClustering,
    fixture: &DendrogramFixture,
) -> TestCaseResult {
    for members in clusters(clustering).values() {
        let Some(&first) = members.first() else {
            continue;
        };
        let covering = iter::once(first)
            .chain(dendrogram.ancestors(first).filter_map(|(_, edge)| edge.parent()))
            .find(|&node| {
                let under = &leaves[node as usize];
                members.iter().all(|leaf| under.binary_search(leaf).is_ok())
            });

        match covering {
            Some(node) if leaves[node as usize] == *members => {}
            Some(node) => {
                return Err(TestCaseError::fail(format!(
                    "{label}: cluster {members:?} is a strict part of node {node}'s \
                     leaves {:?} ({})",
                    leaves[node as usize],
                    fixture.describe(),
                )));
            }
            None => {
                return Err(TestCaseError::fail(format!(
                    "{label}: cluster {members:?} spans several roots ({})",
                    fixture.describe(),
                )));
            }
        }
    }
    Ok(())
}

/// Checks that leaves grouped in `finer` stay grouped in `coarser`.
fn ensure_refines(
    label: &str,
    finer: &FlatClustering,
    coarser: &FlatClustering,
    fixture: &DendrogramFixture,
) -> TestCaseResult {
    let mut image: HashMap<NodeId, NodeId> = HashMap::new();
    for (&(leaf, fine), &(_, coarse)) in finer.pairs().iter().zip(coarser.pairs()) {
        let expected = *image.entry(fine).or_insert(coarse);
        if expected != coarse {
            return Err(TestCaseError::fail(format!(
                "{label}: leaf {leaf} left its cluster when the threshold dropped by \
                 {THRESHOLD_STEP} ({})",
                fixture.describe(),
            )));
        }
    }
    Ok(())
}

/// Groups leaves by representative, each group in ascending leaf order.
fn clusters(clustering: &FlatClustering) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut groups: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for &(leaf, representative) in clustering.pairs() {
        groups.entry(representative).or_default().push(leaf);
    }
    groups
}
