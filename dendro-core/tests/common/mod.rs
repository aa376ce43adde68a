use dendro_core::{Dendrogram, FlatClustering, NodeId};

/// Builds a dendrogram from `(parent, [(child, similarity)])` merges.
#[must_use]
pub fn build(num_nodes: usize, merges: &[(NodeId, &[(NodeId, f32)])]) -> Dendrogram {
    let dendrogram = Dendrogram::new(num_nodes);
    for &(parent, children) in merges {
        dendrogram.merge_children(parent, children);
    }
    dendrogram
}

/// Groups the leaves of `clustering` into sorted clusters, sorted by their
/// smallest leaf.
#[must_use]
pub fn groups(clustering: &FlatClustering) -> Vec<Vec<NodeId>> {
    let labels = clustering.canonical_labels();
    let count = labels.iter().copied().max().map_or(0, |max| max + 1);
    let mut groups = vec![Vec::new(); count];
    for (&(leaf, _), label) in clustering.pairs().iter().zip(labels) {
        groups[label].push(leaf);
    }
    groups
}
