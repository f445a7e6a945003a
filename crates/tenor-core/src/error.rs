//! Error types for the core conventions layer.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type TenorResult<T> = Result<T, TenorError>;

/// Errors raised by date arithmetic, conventions and calendars.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TenorError {
    /// A date could not be constructed or shifted.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A convention name could not be recognised.
    #[error("Unknown convention: {name}")]
    UnknownConvention {
        /// The name that failed to parse.
        name: String,
    },

    /// A calendar operation could not find a business day.
    #[error("Calendar error: {reason}")]
    CalendarError {
        /// Description of the failure.
        reason: String,
    },
}

impl TenorError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an unknown convention error.
    #[must_use]
    pub fn unknown_convention(name: impl Into<String>) -> Self {
        Self::UnknownConvention { name: name.into() }
    }

    /// Creates a calendar error.
    #[must_use]
    pub fn calendar(reason: impl Into<String>) -> Self {
        Self::CalendarError {
            reason: reason.into(),
        }
    }
}
