//! Fixed-point iteration.

use super::{SolverConfig, SolverResult};
use crate::error::{MathError, MathResult};

/// Iterates `x <- g(x)` from `x0` until successive iterates agree within tolerance.
///
/// The reported residual is `g(x) - x` at the returned point.
pub fn fixed_point<G>(g: G, x0: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    G: Fn(f64) -> f64,
{
    let mut x = x0;
    for iteration in 1..=config.max_iterations {
        let next = g(x);
        if !next.is_finite() {
            return Err(MathError::NonFinite { x });
        }
        let delta = next - x;
        x = next;
        if delta.abs() <= config.tolerance * (1.0 + x.abs()) {
            return Ok(SolverResult { root: x, iterations: iteration, residual: delta });
        }
    }
    let residual = g(x) - x;
    log::trace!("fixed point hit iteration cap at x = {x}, residual = {residual:.3e}");
    Err(MathError::convergence_failed(config.max_iterations, residual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn converges_for_contraction() {
        let r = fixed_point(f64::cos, 1.0, &SolverConfig::default()).unwrap();
        assert_abs_diff_eq!(r.root, 0.739_085_133_215_160_6, epsilon = 1e-9);
    }

    #[test]
    fn diverging_map_reports_failure() {
        let cfg = SolverConfig::default().with_max_iterations(20);
        assert!(fixed_point(|x| 2.0 * x + 1.0, 1.0, &cfg).is_err());
    }
}
