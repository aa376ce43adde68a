//! Property 5: Concurrency safety.
//!
//! Re-runs both cuts on the same dendrogram and asserts that every run,
//! and both union-find implementations, agree on the partition. The
//! subtree cut's phase 2 races on purpose, so this is where a lost union
//! would surface.

use proptest::test_runner::{TestCaseError, TestCaseResult};

use crate::{AsyncUnionFind, StripedUnionFind};

use super::equivalence::ensure_same;
use super::types::{ConcurrencyConfig, DendrogramFixture};

pub(super) fn run_concurrency_safety_property(fixture: &DendrogramFixture) -> TestCaseResult {
    let config = ConcurrencyConfig::load();
    let threshold = fixture.threshold;

    let dendrogram = fixture.build();
    let subtree_baseline = dendrogram.subtree_clustering(threshold);
    let threshold_baseline = dendrogram.clustering(threshold);

    for run in 1..config.repetitions {
        // Rebuild as well, so concurrent edge writes are covered too.
        let rebuilt = fixture.build();
        ensure_same(
            &format!("run {run}: subtree cut"),
            &rebuilt.subtree_clustering(threshold),
            &subtree_baseline,
            fixture,
        )?;
        ensure_same(
            &format!("run {run}: threshold cut"),
            &rebuilt.clustering(threshold),
            &threshold_baseline,
            fixture,
        )?;
    }

    let striped = dendrogram.subtree_clustering_with::<StripedUnionFind>(threshold);
    ensure_same(
        "striped subtree cut",
        &striped,
        &subtree_baseline,
        fixture,
    )?;

    let lock_free = dendrogram.clustering_with::<AsyncUnionFind>(threshold);
    if lock_free != threshold_baseline {
        // Representatives are component minima for the lock-free union-find,
        // so the raw pairs must match too.
        return Err(TestCaseError::fail(format!(
            "lock-free threshold cut changed its representatives ({})",
            fixture.describe(),
        )));
    }
    Ok(())
}
