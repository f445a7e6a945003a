//! Newton-Raphson kept inside a bracket.

use super::{SolverConfig, SolverResult};
use crate::error::{MathError, MathResult};

/// Bracketed Newton/bisection hybrid.
///
/// Takes a Newton step from the current iterate when it lands strictly
/// inside the bracket and shrinks the bracket fast enough; otherwise it
/// bisects. The bracket is updated from the sign of every evaluation, so
/// the iteration cannot leave `[lo, hi]`.
pub fn safeguarded_newton<F, D>(
    f: F,
    df: D,
    lo: f64,
    hi: f64,
    guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let f_lo = f(lo);
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
    // Orient so that f(lo) < 0.
    let increasing = f_lo < 0.0;

    let mut x = if guess > lo && guess < hi { guess } else { 0.5 * (lo + hi) };
    let mut step_before_last = hi - lo;
    let mut last_step = step_before_last;
    let mut fx = f(x);

    for iteration in 1..=config.max_iterations {
        if !fx.is_finite() {
            return Err(MathError::NonFinite { x });
        }
        if fx.abs() < config.tolerance {
            return Ok(SolverResult { root: x, iterations: iteration, residual: fx });
        }
        if (fx < 0.0) == increasing {
            lo = x;
        } else {
            hi = x;
        }

        let slope = df(x);
        let newton = if slope != 0.0 && slope.is_finite() { x - fx / slope } else { f64::NAN };
        let use_newton = newton > lo
            && newton < hi
            && (newton - x).abs() < 0.5 * step_before_last.abs();

        step_before_last = last_step;
        let next = if use_newton { newton } else { 0.5 * (lo + hi) };
        last_step = next - x;
        x = next;
        if last_step.abs() < config.tolerance {
            fx = f(x);
            return Ok(SolverResult { root: x, iterations: iteration, residual: fx });
        }
        fx = f(x);
    }

    log::trace!("safeguarded newton hit iteration cap at x = {x}, f = {fx:.3e}");
    Err(MathError::convergence_failed(config.max_iterations, fx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn price(y: f64) -> f64 {
        (1..=10).map(|k| 2.5 / (1.0 + y / 2.0).powi(k)).sum::<f64>() + 100.0 / (1.0 + y / 2.0).powi(10)
    }

    #[test]
    fn solves_par_bond_yield() {
        let f = |y| price(y) - 100.0;
        let df = |y: f64| (price(y + 1e-7) - price(y - 1e-7)) / 2e-7;
        let r = safeguarded_newton(f, df, -0.5, 1.0, 0.01, &SolverConfig::default()).unwrap();
        assert_abs_diff_eq!(r.root, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn survives_useless_derivative() {
        let r = safeguarded_newton(|x| x.powi(3) - 8.0, |_| 0.0, 0.0, 5.0, 4.0, &SolverConfig::default())
            .unwrap();
        assert_abs_diff_eq!(r.root, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn decreasing_functions_are_supported() {
        let r = safeguarded_newton(|x| 3.0 - x, |_| -1.0, 0.0, 10.0, 9.0, &SolverConfig::default())
            .unwrap();
        assert_abs_diff_eq!(r.root, 3.0, epsilon = 1e-12);
    }
}
