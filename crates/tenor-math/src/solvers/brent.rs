//! Brent's method.

use super::{SolverConfig, SolverResult};
use crate::error::{MathError, MathResult};

/// Finds a root of `f` in `[a, b]` with Brent's method.
///
/// `f(a)` and `f(b)` must have opposite signs (or one of them be zero).
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));
    if !fa.is_finite() {
        return Err(MathError::NonFinite { x: a });
    }
    if !fb.is_finite() {
        return Err(MathError::NonFinite { x: b });
    }
    if fa == 0.0 {
        return Ok(SolverResult { root: a, iterations: 0, residual: 0.0 });
    }
    if fb == 0.0 {
        return Ok(SolverResult { root: b, iterations: 0, residual: 0.0 });
    }
    if fa.signum() == fb.signum() {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let m = 0.5 * (c - b);
        if m.abs() <= tol || fb == 0.0 {
            return Ok(SolverResult { root: b, iterations: iteration, residual: fb });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Secant or inverse quadratic interpolation.
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(MathError::NonFinite { x: b });
        }
    }

    log::trace!("brent hit iteration cap at x = {b}, f = {fb:.3e}");
    Err(MathError::convergence_failed(config.max_iterations, fb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_cubic_root() {
        let r = brent(|x| x * x * x - x - 2.0, 1.0, 2.0, &SolverConfig::default()).unwrap();
        assert_abs_diff_eq!(r.root, 1.521_379_706_804_567_6, epsilon = 1e-9);
    }

    #[test]
    fn accepts_reversed_bracket() {
        let r = brent(|x| x.cos() - x, 1.0, 0.0, &SolverConfig::default()).unwrap();
        assert_abs_diff_eq!(r.root.cos(), r.root, epsilon = 1e-9);
    }

    #[test]
    fn rejects_same_sign_bracket() {
        let err = brent(|x| x * x + 1.0, -1.0, 1.0, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::InvalidBracket { .. }));
    }
}
