//! Benchmark support crate for dendro.
//!
//! Provides synthetic dendrogram generators and parameter types used by the
//! Criterion benchmarks for the build phase and both flat cuts.

pub mod error;
pub mod params;
pub mod source;
