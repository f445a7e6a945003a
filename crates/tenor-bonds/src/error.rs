//! Error types for bond terms and cashflow generation.

use thiserror::Error;

/// A specialized Result type for bond operations.
pub type BondResult<T> = Result<T, BondError>;

/// Errors raised while validating terms or generating flows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BondError {
    /// Terms violate a structural invariant.
    #[error("Validation error: {reason}")]
    Validation {
        /// Description of the violated invariant.
        reason: String,
    },

    /// First/last coupon overrides cannot be reconciled with the frequency.
    #[error("Non-generatable stub: {reason}")]
    NonGeneratableStub {
        /// Description of the inconsistency.
        reason: String,
    },

    /// A value required for projection is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Core library error.
    #[error("Core error: {0}")]
    Core(#[from] tenor_core::TenorError),

    /// Curve error raised while reading forwards.
    #[error("Curve error: {0}")]
    Curve(#[from] tenor_curves::CurveError),
}

impl BondError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates a non-generatable stub error.
    #[must_use]
    pub fn non_generatable_stub(reason: impl Into<String>) -> Self {
        Self::NonGeneratableStub {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// True for errors raised by validation of the terms themselves.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NonGeneratableStub { .. })
    }
}
