//! Discount curves built directly from zero rates.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

use crate::error::{CurveError, CurveResult};
use crate::traits::{time_from, DiscountCurve};

/// A flat, continuously compounded curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatCurve {
    reference_date: Date,
    rate: f64,
}

impl FlatCurve {
    /// Creates a flat curve.
    #[must_use]
    pub fn new(reference_date: Date, rate: f64) -> Self {
        Self {
            reference_date,
            rate,
        }
    }

    /// The continuously compounded rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl DiscountCurve for FlatCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount_factor_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            1.0
        } else {
            (-self.rate * t).exp()
        }
    }
}

/// Continuously compounded zero rates at pillar times, linearly
/// interpolated and flat-extrapolated at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroCurve {
    reference_date: Date,
    times: Vec<f64>,
    rates: Vec<f64>,
}

impl ZeroCurve {
    /// Builds a curve from `(pillar date, zero rate)` pairs.
    pub fn from_pillars(reference_date: Date, pillars: &[(Date, f64)]) -> CurveResult<Self> {
        let points: Vec<(f64, f64)> = pillars
            .iter()
            .map(|(d, r)| (time_from(reference_date, *d), *r))
            .collect();
        Self::from_times(reference_date, &points)
    }

    /// Builds a curve from `(time in years, zero rate)` pairs.
    pub fn from_times(reference_date: Date, points: &[(f64, f64)]) -> CurveResult<Self> {
        if points.is_empty() {
            return Err(CurveError::invalid_pillars("no pillars"));
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(CurveError::invalid_pillars("pillar times must be strictly increasing"));
        }
        if points[0].0 <= 0.0 {
            return Err(CurveError::invalid_pillars("first pillar must be after the reference date"));
        }
        if let Some((t, r)) = points.iter().find(|(_, r)| !r.is_finite()) {
            return Err(CurveError::invalid_value(format!("rate {r} at t = {t}")));
        }
        Ok(Self {
            reference_date,
            times: points.iter().map(|p| p.0).collect(),
            rates: points.iter().map(|p| p.1).collect(),
        })
    }

    fn interpolated_rate(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.rates[0];
        }
        if t >= self.times[n - 1] {
            return self.rates[n - 1];
        }
        let i = self.times.partition_point(|&x| x <= t);
        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let (r0, r1) = (self.rates[i - 1], self.rates[i]);
        r0 + (r1 - r0) * (t - t0) / (t1 - t0)
    }
}

impl DiscountCurve for ZeroCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount_factor_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        (-self.interpolated_rate(t) * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn today() -> Date {
        Date::from_ymd(2025, 1, 2).unwrap()
    }

    #[test]
    fn flat_curve_discounting() {
        let c = FlatCurve::new(today(), 0.04);
        assert_relative_eq!(c.discount_factor_at(2.0), (-0.08f64).exp());
        assert_relative_eq!(c.zero_rate_at(3.0), 0.04, epsilon = 1e-14);
        assert_relative_eq!(c.forward_rate_at(1.0, 2.0), 0.04, epsilon = 1e-12);
        assert_eq!(c.discount_factor(today()), 1.0);
        let (a, b) = (Date::from_ymd(2026, 1, 2).unwrap(), Date::from_ymd(2027, 1, 2).unwrap());
        assert_relative_eq!(c.forward_rate(a, b), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn zero_curve_interpolates_linearly() {
        let c = ZeroCurve::from_times(today(), &[(1.0, 0.02), (3.0, 0.04)]).unwrap();
        assert_relative_eq!(c.zero_rate_at(2.0), 0.03, epsilon = 1e-12);
        assert_relative_eq!(c.zero_rate_at(0.5), 0.02, epsilon = 1e-12);
        assert_relative_eq!(c.zero_rate_at(10.0), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn zero_curve_rejects_unsorted_pillars() {
        assert!(ZeroCurve::from_times(today(), &[(2.0, 0.02), (1.0, 0.03)]).is_err());
        assert!(ZeroCurve::from_times(today(), &[]).is_err());
    }

    #[test]
    fn pillar_dates_map_to_act365_times() {
        let pillars = [
            (Date::from_ymd(2026, 1, 2).unwrap(), 0.02),
            (Date::from_ymd(2028, 1, 2).unwrap(), 0.04),
        ];
        let c = ZeroCurve::from_pillars(today(), &pillars).unwrap();
        assert_relative_eq!(c.zero_rate(pillars[0].0), 0.02, epsilon = 1e-12);
        assert_relative_eq!(c.zero_rate(pillars[1].0), 0.04, epsilon = 1e-12);
    }
}
