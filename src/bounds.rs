//! Box constraints for fit parameters.
//!
//! Bounds are enforced through the Minuit-style parameter transformation:
//! the optimizer works with unbounded internal values, while the external
//! values handed to the model are always within the specified bounds.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqwFitError};

/// Bound constraints on a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl Bounds {
    /// Create new bound constraints.
    ///
    /// Fails with `InvalidBounds` if `min > max` (infeasible bounds are
    /// rejected up front rather than clamped).
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min > max {
            return Err(SqwFitError::InvalidBounds(format!(
                "min ({}) must not exceed max ({})",
                min, max
            )));
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a constraint with only a lower bound.
    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    /// Create a constraint with only an upper bound.
    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    /// Check if a value is within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether the parameter is bounded from below.
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Whether the parameter is bounded from above.
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }
}

/// Minuit-style transformation between bounded external values and
/// unbounded internal values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Transform an internal parameter value to an external value.
    ///
    /// The result is always within the bounds.
    pub fn to_external(&self, internal: f64) -> f64 {
        if !self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return internal;
        }

        if self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return self.bounds.min - 1.0 + (internal * internal + 1.0).sqrt();
        }

        if !self.bounds.has_lower_bound() && self.bounds.has_upper_bound() {
            return self.bounds.max + 1.0 - (internal * internal + 1.0).sqrt();
        }

        let range = self.bounds.max - self.bounds.min;
        self.bounds.min + (internal.sin() + 1.0) * range / 2.0
    }

    /// Transform an external parameter value to an internal value.
    ///
    /// Fails with `InvalidBounds` if the external value is non-finite or
    /// outside the bounds.
    pub fn to_internal(&self, external: f64) -> Result<f64> {
        if !external.is_finite() {
            return Err(SqwFitError::InvalidBounds(
                "parameter value must be finite".to_string(),
            ));
        }

        if !self.bounds.contains(external) {
            return Err(SqwFitError::InvalidBounds(format!(
                "value {} is outside bounds [{}, {}]",
                external, self.bounds.min, self.bounds.max
            )));
        }

        if !self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return Ok(external);
        }

        if self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return Ok(((external - self.bounds.min + 1.0).powi(2) - 1.0).sqrt());
        }

        if !self.bounds.has_lower_bound() && self.bounds.has_upper_bound() {
            return Ok(((self.bounds.max - external + 1.0).powi(2) - 1.0).sqrt());
        }

        let range = self.bounds.max - self.bounds.min;
        let scaled = 2.0 * (external - self.bounds.min) / range - 1.0;

        // Guard against rounding just outside [-1, 1] before asin
        Ok(scaled.clamp(-1.0, 1.0).asin())
    }

    /// Derivative of the external value with respect to the internal value.
    ///
    /// Used to propagate internal-space parameter uncertainties back to
    /// external space.
    pub fn gradient_factor(&self, internal: f64) -> f64 {
        if !self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return 1.0;
        }

        if self.bounds.has_lower_bound() && !self.bounds.has_upper_bound() {
            return internal / (internal * internal + 1.0).sqrt();
        }

        if !self.bounds.has_lower_bound() && self.bounds.has_upper_bound() {
            return -internal / (internal * internal + 1.0).sqrt();
        }

        let range = self.bounds.max - self.bounds.min;
        range * internal.cos() / 2.0
    }
}
