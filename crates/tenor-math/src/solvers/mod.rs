//! Root-finding algorithms.
//!
//! | Solver | Needs | Convergence |
//! |--------|-------|-------------|
//! | [`brent`] | bracket | superlinear |
//! | [`bisection`] | bracket | linear |
//! | [`safeguarded_newton`] | bracket + derivative | quadratic near the root |
//! | [`fixed_point`] | contraction `g` | linear |
//!
//! ```rust
//! use tenor_math::solvers::{brent, SolverConfig};
//!
//! let r = brent(|x| x * x - 2.0, 0.0, 2.0, &SolverConfig::default()).unwrap();
//! assert!((r.root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod bisection;
mod bracket;
mod brent;
mod fixed_point;
mod newton;

pub use bisection::bisection;
pub use bracket::{expand_bracket, scan_bracket};
pub use brent::brent;
pub use fixed_point::fixed_point;
pub use newton::safeguarded_newton;

/// Default absolute tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Tolerance and iteration cap shared by every solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Absolute tolerance on the abscissa and the residual.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// A converged root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root.
    pub root: f64,
    /// Iterations used.
    pub iterations: u32,
    /// `f(root)`.
    pub residual: f64,
}
