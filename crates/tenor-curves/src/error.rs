//! Curve construction errors.

use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors raised while building a curve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Pillars are empty, unsorted or dated before the reference date.
    #[error("Invalid pillars: {reason}")]
    InvalidPillars {
        /// Description of the problem.
        reason: String,
    },

    /// A rate, hazard or recovery is out of range.
    #[error("Invalid curve value: {reason}")]
    InvalidValue {
        /// Description of the problem.
        reason: String,
    },
}

impl CurveError {
    /// Creates an invalid pillars error.
    #[must_use]
    pub fn invalid_pillars(reason: impl Into<String>) -> Self {
        Self::InvalidPillars {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}
