//! Curve interfaces consumed by the pricing engine.

use std::fmt::Debug;

use tenor_core::Date;

/// ACT/365F time in years from `reference` to `date`.
///
/// Every curve in this crate measures time this way.
#[must_use]
pub fn time_from(reference: Date, date: Date) -> f64 {
    reference.days_between(&date) as f64 / 365.0
}

/// A risk-free discount curve.
///
/// Only [`discount_factor_at`](DiscountCurve::discount_factor_at) and
/// [`reference_date`](DiscountCurve::reference_date) are required.
pub trait DiscountCurve: Send + Sync + Debug {
    /// Valuation date of the curve.
    fn reference_date(&self) -> Date;

    /// Discount factor for time `t` (years from the reference date). 1 for `t <= 0`.
    fn discount_factor_at(&self, t: f64) -> f64;

    /// Time in years from the reference date to `date`.
    fn time(&self, date: Date) -> f64 {
        time_from(self.reference_date(), date)
    }

    /// Discount factor from the reference date to `date`.
    fn discount_factor(&self, date: Date) -> f64 {
        self.discount_factor_at(self.time(date))
    }

    /// Forward discount factor from `from` to `to`.
    fn discount_factor_between(&self, from: Date, to: Date) -> f64 {
        self.discount_factor(to) / self.discount_factor(from)
    }

    /// Continuously compounded zero rate to time `t`.
    fn zero_rate_at(&self, t: f64) -> f64 {
        if t <= 1e-10 {
            return self.forward_rate_at(0.0, 1.0 / 365.0);
        }
        -self.discount_factor_at(t).ln() / t
    }

    /// Continuously compounded forward rate over `[t1, t2]`.
    fn forward_rate_at(&self, t1: f64, t2: f64) -> f64 {
        let dt = t2 - t1;
        if dt.abs() < 1e-12 {
            let h = 1e-4;
            return (self.discount_factor_at(t1).ln() - self.discount_factor_at(t1 + h).ln()) / h;
        }
        (self.discount_factor_at(t1) / self.discount_factor_at(t2)).ln() / dt
    }

    /// Continuously compounded zero rate to `date`.
    fn zero_rate(&self, date: Date) -> f64 {
        self.zero_rate_at(self.time(date))
    }

    /// Continuously compounded forward rate between two dates.
    fn forward_rate(&self, from: Date, to: Date) -> f64 {
        self.forward_rate_at(self.time(from), self.time(to))
    }
}

/// A default-probability curve for the issuer.
pub trait SurvivalCurve: Send + Sync + Debug {
    /// Valuation date of the curve.
    fn reference_date(&self) -> Date;

    /// Survival probability to time `t`. 1 for `t <= 0`.
    fn survival_probability_at(&self, t: f64) -> f64;

    /// Recovery rate as a fraction of notional.
    fn recovery_rate(&self) -> f64;

    /// Flat CDS spread equivalent of the curve, when it has one.
    fn flat_spread(&self) -> Option<f64>;

    /// Survival probability to `date`.
    fn survival_probability(&self, date: Date) -> f64 {
        self.survival_probability_at(time_from(self.reference_date(), date))
    }
}
