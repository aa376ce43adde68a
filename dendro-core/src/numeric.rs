//! Floating-point tolerance used at the threshold boundary.
//!
//! Merge similarities are computed upstream and pick up rounding error, so a
//! similarity that should equal the threshold may land one or two ulps
//! below it. Both cuts therefore keep an edge when its similarity is above
//! the threshold *or* almost equal to it.

use crate::error::{DendrogramError, Result};

const DEFAULT_MARGIN: f32 = 32.0 * f32::EPSILON;
const DEFAULT_FRACTION: f32 = 32.0 * f32::EPSILON;

/// Almost-equal policy for similarity comparisons.
///
/// Two values are almost equal when they are identical, when their absolute
/// difference is within `margin`, or when it is within `fraction` of the
/// larger magnitude. NaN is never almost equal to anything.
///
/// # Examples
/// ```
/// use dendro_core::SimilarityTolerance;
///
/// let tolerance = SimilarityTolerance::default();
/// let rounded = 0.1_f32 + 0.2_f32;
/// assert!(tolerance.clears(rounded, 0.3));
/// assert!(!tolerance.clears(0.29, 0.3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityTolerance {
    margin: f32,
    fraction: f32,
}

impl Default for SimilarityTolerance {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            fraction: DEFAULT_FRACTION,
        }
    }
}

impl SimilarityTolerance {
    /// Creates a tolerance from an absolute margin and a relative fraction.
    ///
    /// # Errors
    /// Returns [`DendrogramError::InvalidTolerance`] when either parameter is
    /// negative or not finite.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::SimilarityTolerance;
    ///
    /// let tolerance = SimilarityTolerance::new(1e-3, 0.0).expect("valid tolerance");
    /// assert!(tolerance.almost_equals(0.5, 0.5005));
    /// assert!(SimilarityTolerance::new(-1.0, 0.0).is_err());
    /// ```
    pub fn new(margin: f32, fraction: f32) -> Result<Self> {
        let valid = |value: f32| value.is_finite() && value >= 0.0;
        if !valid(margin) || !valid(fraction) {
            return Err(DendrogramError::InvalidTolerance { margin, fraction });
        }
        Ok(Self { margin, fraction })
    }

    /// A tolerance that only accepts identical values.
    #[must_use]
    pub const fn exact() -> Self {
        Self {
            margin: 0.0,
            fraction: 0.0,
        }
    }

    /// Returns the absolute margin.
    #[must_use]
    #[rustfmt::skip]
    pub const fn margin(&self) -> f32 { self.margin }

    /// Returns the relative fraction.
    #[must_use]
    #[rustfmt::skip]
    pub const fn fraction(&self) -> f32 { self.fraction }

    /// Returns `true` when `left` and `right` are equal up to rounding.
    #[must_use]
    pub fn almost_equals(&self, left: f32, right: f32) -> bool {
        if left == right {
            return true;
        }
        let difference = (left - right).abs();
        if !difference.is_finite() {
            return false;
        }
        difference <= self.margin || difference <= self.fraction * left.abs().max(right.abs())
    }

    /// Returns `true` when `similarity` is at least `threshold` up to
    /// rounding.
    #[must_use]
    pub fn clears(&self, similarity: f32, threshold: f32) -> bool {
        similarity > threshold || self.almost_equals(similarity, threshold)
    }
}
