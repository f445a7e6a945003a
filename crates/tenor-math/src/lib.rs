//! # Tenor Math
//!
//! One-dimensional root finders used by the yield and spread solvers:
//!
//! - [`solvers::brent`]: bracketed, derivative-free
//! - [`solvers::bisection`]: bracketed, linear convergence
//! - [`solvers::safeguarded_newton`]: Newton steps kept inside a shrinking bracket
//! - [`solvers::fixed_point`]: `x = g(x)` iteration
//! - [`solvers::expand_bracket`] / [`solvers::scan_bracket`]: bracket discovery

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::solvers::{
        bisection, brent, expand_bracket, fixed_point, safeguarded_newton, scan_bracket,
        SolverConfig, SolverResult,
    };
}

pub use error::{MathError, MathResult};
