//! Error types for the dendrogram store.
//!
//! Construction and build-phase writes have fallible `try_*` forms that
//! return [`DendrogramError`]; their fatal counterparts panic with the same
//! message. Queries never fail.

use std::fmt;

use thiserror::Error;

use crate::dendrogram::NodeId;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced when building or configuring a [`crate::Dendrogram`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DendrogramError {
    /// A dendrogram needs at least one leaf.
    #[error("a dendrogram needs at least one leaf")]
    EmptyDendrogram,
    /// `2 * num_nodes - 1` cluster ids do not fit below the sentinel id.
    #[error(
        "{num_nodes} leaves need {max_cluster_id} cluster ids, which reaches the invalid sentinel"
    )]
    ClusterIdSpaceExhausted {
        /// Number of leaves requested by the caller.
        num_nodes: usize,
        /// The size of the cluster id space those leaves require.
        max_cluster_id: u64,
    },
    /// A node id fell outside `[0, max_cluster_id)`.
    #[error("node {node} is outside the cluster id space [0, {max_cluster_id})")]
    NodeOutOfRange {
        /// The offending node id.
        node: NodeId,
        /// Exclusive upper bound of the cluster id space.
        max_cluster_id: NodeId,
    },
    /// The child already had a parent edge recorded.
    #[error("node {child} already has parent {existing_parent}; parent edges are write-once")]
    ParentAlreadyAssigned {
        /// The child whose slot was written twice.
        child: NodeId,
        /// The parent recorded by the earlier write.
        existing_parent: NodeId,
    },
    /// Tolerance parameters must be finite and non-negative.
    #[error("tolerance must be finite and non-negative (margin {margin}, fraction {fraction})")]
    InvalidTolerance {
        /// Absolute margin supplied by the caller.
        margin: f32,
        /// Relative fraction supplied by the caller.
        fraction: f32,
    },
}

define_error_codes! {
    /// Stable codes describing [`DendrogramError`] variants.
    enum DendrogramErrorCode for DendrogramError {
        /// A dendrogram needs at least one leaf.
        EmptyDendrogram => EmptyDendrogram => "DENDROGRAM_EMPTY",
        /// The cluster id space reaches the sentinel id.
        ClusterIdSpaceExhausted => ClusterIdSpaceExhausted { .. } => "DENDROGRAM_ID_SPACE_EXHAUSTED",
        /// A node id fell outside the cluster id space.
        NodeOutOfRange => NodeOutOfRange { .. } => "DENDROGRAM_NODE_OUT_OF_RANGE",
        /// A parent edge was written twice.
        ParentAlreadyAssigned => ParentAlreadyAssigned { .. } => "DENDROGRAM_PARENT_ALREADY_ASSIGNED",
        /// Tolerance parameters were rejected.
        InvalidTolerance => InvalidTolerance { .. } => "DENDROGRAM_INVALID_TOLERANCE",
    }
}

/// Convenient result alias for dendrogram operations.
pub type Result<T> = core::result::Result<T, DendrogramError>;
