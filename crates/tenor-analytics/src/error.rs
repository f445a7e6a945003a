//! Error types for analytics.

use thiserror::Error;

use crate::config::ConfigError;

/// A specialized Result type for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors that are not expected solver outcomes.
///
/// A yield or spread that cannot be found is reported through
/// [`SolveOutcome`](crate::solve::SolveOutcome), not through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Invalid argument or market input.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Market data needed by the calculation is missing.
    #[error("Missing market data: {field}")]
    MissingMarketData {
        /// The missing input.
        field: String,
    },

    /// The calculation does not apply to this bond.
    #[error("Unsupported: {reason}")]
    Unsupported {
        /// Why the calculation does not apply.
        reason: String,
    },

    /// Bond terms or projection error.
    #[error("Bond error: {0}")]
    Bond(#[from] tenor_bonds::BondError),

    /// Curve error.
    #[error("Curve error: {0}")]
    Curve(#[from] tenor_curves::CurveError),

    /// Numerical routine error.
    #[error("Math error: {0}")]
    Math(#[from] tenor_math::MathError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalyticsError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a missing market data error.
    #[must_use]
    pub fn missing_market_data(field: impl Into<String>) -> Self {
        Self::MissingMarketData {
            field: field.into(),
        }
    }

    /// Creates an unsupported calculation error.
    #[must_use]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }
}
