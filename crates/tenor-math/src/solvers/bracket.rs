//! Bracket discovery.

use crate::error::{MathError, MathResult};

/// Widens `[a, b]` geometrically until `f` changes sign.
///
/// The upper end grows by a factor of 1.6 of the current width, the lower
/// end stays at `a` unless `allow_lower` is set.
pub fn expand_bracket<F>(
    f: F,
    a: f64,
    b: f64,
    max_expansions: u32,
    allow_lower: bool,
) -> MathResult<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    if !(b > a) {
        return Err(MathError::invalid_input(format!("empty bracket [{a}, {b}]")));
    }
    let (mut lo, mut hi) = (a, b);
    let (mut f_lo, mut f_hi) = (f(lo), f(hi));
    for _ in 0..max_expansions {
        if f_lo.is_finite() && f_hi.is_finite() && f_lo.signum() != f_hi.signum() {
            return Ok((lo, hi));
        }
        let width = hi - lo;
        if allow_lower && f_lo.abs() < f_hi.abs() {
            lo -= 1.6 * width;
            f_lo = f(lo);
        } else {
            hi += 1.6 * width;
            f_hi = f(hi);
        }
    }
    Err(MathError::InvalidBracket { a: lo, b: hi, fa: f_lo, fb: f_hi })
}

/// Walks the ordered `grid` and returns the first adjacent pair with a sign change.
pub fn scan_bracket<F>(f: F, grid: &[f64]) -> MathResult<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    let mut points = grid.iter().copied();
    let Some(mut prev) = points.next() else {
        return Err(MathError::invalid_input("empty scan grid"));
    };
    let mut f_prev = f(prev);
    if f_prev == 0.0 {
        return Ok((prev, prev));
    }
    for x in points {
        let fx = f(x);
        if fx == 0.0 {
            return Ok((x, x));
        }
        if fx.is_finite() && f_prev.is_finite() && fx.signum() != f_prev.signum() {
            return Ok((prev, x));
        }
        prev = x;
        f_prev = fx;
    }
    Err(MathError::InvalidBracket {
        a: grid[0],
        b: prev,
        fa: f(grid[0]),
        fb: f_prev,
    })
}
