//! Bisection.

use super::{SolverConfig, SolverResult};
use crate::error::{MathError, MathResult};

/// Halves `[a, b]` until it is narrower than the tolerance.
pub fn bisection<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = if a <= b { (a, b) } else { (b, a) };
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Ok(SolverResult { root: lo, iterations: 0, residual: 0.0 });
    }
    if f_hi == 0.0 {
        return Ok(SolverResult { root: hi, iterations: 0, residual: 0.0 });
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(MathError::InvalidBracket { a: lo, b: hi, fa: f_lo, fb: f_hi });
    }

    let mut mid = 0.5 * (lo + hi);
    let mut f_mid = f(mid);
    for iteration in 1..=config.max_iterations {
        mid = 0.5 * (lo + hi);
        f_mid = f(mid);
        if f_mid == 0.0 || 0.5 * (hi - lo) < config.tolerance {
            return Ok(SolverResult { root: mid, iterations: iteration, residual: f_mid });
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    log::trace!("bisection hit iteration cap at x = {mid}");
    Err(MathError::convergence_failed(config.max_iterations, f_mid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn halves_to_sqrt_two() {
        let r = bisection(|x| x * x - 2.0, 0.0, 2.0, &SolverConfig::default()).unwrap();
        assert_abs_diff_eq!(r.root, std::f64::consts::SQRT_2, epsilon = 1e-9);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let cfg = SolverConfig::default().with_max_iterations(3);
        let err = bisection(|x| x - 0.123_456, 0.0, 1.0, &cfg).unwrap_err();
        assert!(matches!(err, MathError::ConvergenceFailed { iterations: 3, .. }));
    }
}
