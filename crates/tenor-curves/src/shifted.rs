//! Bumped curve snapshots.

use std::sync::Arc;

use tenor_core::Date;

use crate::traits::{time_from, DiscountCurve};

/// A deterministic change applied on top of a base curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveShift {
    /// Adds `spread` to every continuously compounded zero rate.
    Parallel(f64),
    /// Adds `spread` to instantaneous forwards between `from` and `to` (years).
    ForwardBucket {
        /// Bucket start in years.
        from: f64,
        /// Bucket end in years.
        to: f64,
        /// Forward shift.
        spread: f64,
    },
}

impl CurveShift {
    fn log_discount_adjustment(&self, t: f64) -> f64 {
        match *self {
            CurveShift::Parallel(spread) => spread * t.max(0.0),
            CurveShift::ForwardBucket { from, to, spread } => {
                spread * (t.clamp(from, to) - from).max(0.0)
            }
        }
    }
}

/// A new immutable curve equal to `base` plus a [`CurveShift`].
///
/// The base curve is never modified.
#[derive(Debug, Clone)]
pub struct ShiftedCurve {
    base: Arc<dyn DiscountCurve>,
    shift: CurveShift,
}

impl ShiftedCurve {
    /// Wraps `base` with an arbitrary shift.
    #[must_use]
    pub fn new(base: Arc<dyn DiscountCurve>, shift: CurveShift) -> Self {
        Self { base, shift }
    }

    /// Parallel zero-rate shift.
    #[must_use]
    pub fn parallel(base: Arc<dyn DiscountCurve>, spread: f64) -> Self {
        Self::new(base, CurveShift::Parallel(spread))
    }

    /// Forward shift over the dates `[from, to]`.
    #[must_use]
    pub fn forward_bucket(base: Arc<dyn DiscountCurve>, from: Date, to: Date, spread: f64) -> Self {
        let reference = base.reference_date();
        let shift = CurveShift::ForwardBucket {
            from: time_from(reference, from),
            to: time_from(reference, to),
            spread,
        };
        Self::new(base, shift)
    }

    /// The applied shift.
    #[must_use]
    pub fn shift(&self) -> CurveShift {
        self.shift
    }
}

impl DiscountCurve for ShiftedCurve {
    fn reference_date(&self) -> Date {
        self.base.reference_date()
    }

    fn discount_factor_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        self.base.discount_factor_at(t) * (-self.shift.log_discount_adjustment(t)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatCurve;
    use approx::assert_relative_eq;

    fn base() -> Arc<dyn DiscountCurve> {
        Arc::new(FlatCurve::new(Date::from_ymd(2025, 1, 2).unwrap(), 0.03))
    }

    #[test]
    fn parallel_shift_adds_to_zero_rates() {
        let bumped = ShiftedCurve::parallel(base(), 0.0001);
        assert_relative_eq!(bumped.zero_rate_at(5.0), 0.0301, epsilon = 1e-12);
    }

    #[test]
    fn bucket_shift_only_moves_forwards_inside_bucket() {
        let c = ShiftedCurve::new(
            base(),
            CurveShift::ForwardBucket { from: 2.0, to: 3.0, spread: 0.01 },
        );
        assert_relative_eq!(c.forward_rate_at(0.5, 1.5), 0.03, epsilon = 1e-12);
        assert_relative_eq!(c.forward_rate_at(2.0, 3.0), 0.04, epsilon = 1e-12);
        assert_relative_eq!(c.forward_rate_at(4.0, 5.0), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn forward_bucket_measures_dates_from_reference() {
        let c = ShiftedCurve::forward_bucket(
            base(),
            Date::from_ymd(2026, 1, 2).unwrap(),
            Date::from_ymd(2027, 1, 2).unwrap(),
            0.005,
        );
        match c.shift() {
            CurveShift::ForwardBucket { from, to, spread } => {
                assert_relative_eq!(from, 1.0, epsilon = 1e-12);
                assert_relative_eq!(to, 2.0, epsilon = 1e-12);
                assert_eq!(spread, 0.005);
            }
            CurveShift::Parallel(_) => panic!("expected a bucket shift"),
        }
        assert_relative_eq!(c.discount_factor_at(0.5), base().discount_factor_at(0.5), epsilon = 1e-15);
    }

    #[test]
    fn base_curve_is_untouched() {
        let b = base();
        let before = b.discount_factor_at(4.0);
        let _bumped = ShiftedCurve::parallel(Arc::clone(&b), 0.01);
        assert_eq!(b.discount_factor_at(4.0), before);
    }
}
