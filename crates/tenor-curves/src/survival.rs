//! Hazard-rate survival curves.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

use crate::error::{CurveError, CurveResult};
use crate::traits::SurvivalCurve;

fn check_recovery(recovery: f64) -> CurveResult<()> {
    if (0.0..1.0).contains(&recovery) {
        Ok(())
    } else {
        Err(CurveError::invalid_value(format!("recovery {recovery} outside [0, 1)")))
    }
}

/// Constant hazard rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatHazardCurve {
    reference_date: Date,
    hazard: f64,
    recovery: f64,
}

impl FlatHazardCurve {
    /// Creates a curve from a hazard rate.
    pub fn new(reference_date: Date, hazard: f64, recovery: f64) -> CurveResult<Self> {
        check_recovery(recovery)?;
        if !(hazard >= 0.0) || !hazard.is_finite() {
            return Err(CurveError::invalid_value(format!("hazard {hazard}")));
        }
        Ok(Self {
            reference_date,
            hazard,
            recovery,
        })
    }

    /// Creates the curve implied by a flat CDS spread with the credit
    /// triangle `hazard = spread / (1 - recovery)`.
    pub fn from_spread(reference_date: Date, spread: f64, recovery: f64) -> CurveResult<Self> {
        check_recovery(recovery)?;
        Self::new(reference_date, spread / (1.0 - recovery), recovery)
    }

    /// The hazard rate.
    #[must_use]
    pub fn hazard(&self) -> f64 {
        self.hazard
    }
}

impl SurvivalCurve for FlatHazardCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn survival_probability_at(&self, t: f64) -> f64 {
        (-self.hazard * t.max(0.0)).exp()
    }

    fn recovery_rate(&self) -> f64 {
        self.recovery
    }

    fn flat_spread(&self) -> Option<f64> {
        Some(self.hazard * (1.0 - self.recovery))
    }
}

/// Piecewise-constant hazard rates; the last hazard extends beyond the final knot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseHazardCurve {
    reference_date: Date,
    end_times: Vec<f64>,
    hazards: Vec<f64>,
    recovery: f64,
}

impl PiecewiseHazardCurve {
    /// Creates a curve where `hazards[i]` applies up to `end_times[i]`.
    pub fn new(
        reference_date: Date,
        end_times: Vec<f64>,
        hazards: Vec<f64>,
        recovery: f64,
    ) -> CurveResult<Self> {
        check_recovery(recovery)?;
        if end_times.is_empty() || end_times.len() != hazards.len() {
            return Err(CurveError::invalid_pillars("need one hazard per knot"));
        }
        if end_times[0] <= 0.0 || end_times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CurveError::invalid_pillars("knots must be positive and increasing"));
        }
        if hazards.iter().any(|h| !(*h >= 0.0)) {
            return Err(CurveError::invalid_value("hazards must be non-negative"));
        }
        Ok(Self {
            reference_date,
            end_times,
            hazards,
            recovery,
        })
    }

    fn integrated_hazard(&self, t: f64) -> f64 {
        let mut total = 0.0;
        let mut start = 0.0;
        for (&end, &h) in self.end_times.iter().zip(&self.hazards) {
            if t <= end {
                return total + h * (t - start);
            }
            total += h * (end - start);
            start = end;
        }
        let last = self.hazards.last().copied().unwrap_or(0.0);
        total + last * (t - start)
    }
}

impl SurvivalCurve for PiecewiseHazardCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn survival_probability_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        (-self.integrated_hazard(t)).exp()
    }

    fn recovery_rate(&self) -> f64 {
        self.recovery
    }

    fn flat_spread(&self) -> Option<f64> {
        let first = self.hazards[0];
        self.hazards
            .iter()
            .all(|h| (h - first).abs() < 1e-15)
            .then(|| first * (1.0 - self.recovery))
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
    fn credit_triangle_round_trips() {
        let c = FlatHazardCurve::from_spread(today(), 0.012, 0.4).unwrap();
        assert_relative_eq!(c.hazard(), 0.02, epsilon = 1e-15);
        assert_relative_eq!(c.flat_spread().unwrap(), 0.012, epsilon = 1e-15);
        assert_relative_eq!(c.survival_probability_at(5.0), (-0.1f64).exp());
        let five_years = Date::from_ymd(2030, 1, 2).unwrap();
        assert_relative_eq!(
            c.survival_probability(five_years),
            (-0.02 * 1826.0 / 365.0_f64).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn piecewise_integrates_hazard() {
        let c = PiecewiseHazardCurve::new(today(), vec![1.0, 3.0], vec![0.01, 0.03], 0.4).unwrap();
        assert_relative_eq!(c.survival_probability_at(2.0), (-0.04f64).exp(), epsilon = 1e-14);
        assert_relative_eq!(c.survival_probability_at(5.0), (-0.13f64).exp(), epsilon = 1e-14);
        assert!(c.flat_spread().is_none());
    }

    #[test]
    fn rejects_bad_recovery() {
        assert!(FlatHazardCurve::new(today(), 0.01, 1.0).is_err());
    }
}
