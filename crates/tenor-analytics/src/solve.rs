//! Explicit outcomes for root-finding.

use serde::{Deserialize, Serialize};

use tenor_math::solvers::SolverResult;
use tenor_math::{MathError, MathResult};

/// Why a solve produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveFailure {
    /// No sign change could be found for the objective.
    NonBracketable,
    /// The iteration cap was hit.
    MaxIterations,
    /// The objective is not monotone and the fallback is disabled.
    NonMonotonicWithoutFallback,
}

/// Result of a yield or spread solve.
///
/// On failure `value` is NaN and `failure` carries the reason.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// The solved value, or NaN.
    pub value: f64,
    /// Iterations used.
    pub iterations: u32,
    /// Reason for failure, if any.
    pub failure: Option<SolveFailure>,
}

impl SolveOutcome {
    /// A converged value.
    #[must_use]
    pub fn converged(value: f64, iterations: u32) -> Self {
        Self {
            value,
            iterations,
            failure: None,
        }
    }

    /// A value known without iterating, such as zero for a matured bond.
    #[must_use]
    pub fn exact(value: f64) -> Self {
        Self::converged(value, 0)
    }

    /// A failed solve.
    #[must_use]
    pub fn failed(failure: SolveFailure, iterations: u32) -> Self {
        Self {
            value: f64::NAN,
            iterations,
            failure: Some(failure),
        }
    }

    /// True if the solve produced a value.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.failure.is_none()
    }

    /// The value, if converged.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.is_converged().then_some(self.value)
    }

    /// Converts a solver result, logging failures under `solver`.
    pub(crate) fn from_solver(solver: &'static str, result: MathResult<SolverResult>) -> Self {
        match result {
            Ok(r) => Self::converged(r.root, r.iterations),
            Err(err) => {
                let (failure, iterations) = match err {
                    MathError::ConvergenceFailed { iterations, .. } => {
                        (SolveFailure::MaxIterations, iterations)
                    }
                    _ => (SolveFailure::NonBracketable, 0),
                };
                tracing::warn!(solver, iterations, error = %err, "solve did not converge");
                Self::failed(failure, iterations)
            }
        }
    }
}
