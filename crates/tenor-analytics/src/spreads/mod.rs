//! Spread measures over the discount curve.
//!
//! | Spread | Question |
//! |--------|----------|
//! | Z-Spread | What constant shift of the curve prices the bond? |
//! | R-Spread | The same, with survival weighting and recovery on default? |
//! | CDS-implied | What flat CDS level explains the price? |
//! | Asset swap | What running spread does a par-par package pay? |
//! | Discount margin | What margin over forwards prices a floater? |
//!
//! Option-adjusted spreads come from the lattice engine, see
//! [`crate::lattice::CallableLattice`].
//!
//! Every solved spread is reported as a [`SolveOutcome`]. Matured or
//! defaulted bonds return 0.

mod asw;
mod cds;
mod discount_margin;
mod rspread;
mod zspread;

pub use asw::AssetSwapCalculator;
pub use cds::{CdsImpliedCalculator, CdsImpliedSpread};
pub use discount_margin::DiscountMarginCalculator;
pub use rspread::RSpreadCalculator;
pub use zspread::ZSpreadCalculator;

use tenor_math::solvers::{brent, expand_bracket, SolverConfig};

use crate::config::Bracket;
use crate::solve::SolveOutcome;

const MAX_BRACKET_EXPANSIONS: u32 = 30;

/// Widens `bracket` until it holds a root, then runs Brent.
pub(crate) fn solve_bracketed<F>(
    solver: &'static str,
    f: F,
    bracket: Bracket,
    config: &SolverConfig,
) -> SolveOutcome
where
    F: Fn(f64) -> f64,
{
    let result = expand_bracket(&f, bracket.lower, bracket.upper, MAX_BRACKET_EXPANSIONS, true)
        .and_then(|(lo, hi)| brent(&f, lo, hi, config));
    SolveOutcome::from_solver(solver, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::SolveFailure;
    use approx::assert_relative_eq;

    #[test]
    fn expands_to_far_root() {
        let out = solve_bracketed("test", |x| 2.5 - x, Bracket::new(0.0, 1.0), &SolverConfig::default());
        assert_relative_eq!(out.value, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn rootless_function_fails() {
        let out = solve_bracketed("test", |x| x * x + 1.0, Bracket::new(-1.0, 1.0), &SolverConfig::default());
        assert_eq!(out.failure, Some(SolveFailure::NonBracketable));
        assert!(out.value.is_nan());
    }
}
