//! Parallel dendrogram storage and flat-cut extraction.
//!
//! A [`Dendrogram`] records the merge history of a bottom-up hierarchical
//! clustering run: every merge writes one weighted parent edge per child
//! into a flat, fixed-size array. Once the build phase is over the store is
//! read-only and answers two queries, both in parallel:
//!
//! - [`Dendrogram::clustering`] keeps every edge whose similarity clears a
//!   threshold and reports the resulting components. Clusters are subtrees
//!   of the dendrogram only when similarities are non-increasing from leaf
//!   to root.
//! - [`Dendrogram::subtree_clustering`] assigns each leaf to the last
//!   ancestor whose merge similarity clears the threshold, so every cluster
//!   is a subtree even when the dendrogram is not monotone.
//!
//! Both cuts run on a private [`ConcurrentDisjointSet`] per query; the
//! default is the lock-free [`AsyncUnionFind`].
//!
//! # Metrics
//!
//! When the `metrics` feature is enabled the cuts emit:
//!
//! - `dendrogram_cuts_total` (counter, labelled by `strategy`)
//! - `dendrogram_subtree_walk_steps` (counter)
//! - `dendrogram_subtree_walk_early_exits` (counter)
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod dendrogram;
mod error;
mod numeric;
mod result;
mod union_find;


pub use crate::{
    builder::DendrogramBuilder,
    dendrogram::{Ancestors, CutStrategy, Dendrogram, INVALID_NODE_ID, NodeId, ParentEdge},
    error::{DendrogramError, DendrogramErrorCode, Result},
    numeric::SimilarityTolerance,
    result::FlatClustering,
    union_find::{AsyncUnionFind, ConcurrentDisjointSet, StripedUnionFind},
};
