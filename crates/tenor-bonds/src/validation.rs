//! Structural checks on [`BondTerms`].

use tenor_core::types::Date;

use crate::error::{BondError, BondResult};
use crate::types::{BondTerms, ExercisePeriod};

impl BondTerms {
    /// Checks the structural invariants of the terms.
    ///
    /// - maturity is after the effective date
    /// - call and put periods are well formed, strictly increasing and disjoint
    /// - amortization dates are strictly increasing inside (effective, maturity]
    ///   and never leave a negative or increasing notional
    /// - coupon steps are increasing
    /// - floating resets are non-decreasing and not before the effective date
    /// - a custom schedule spans exactly [effective, maturity]
    pub fn validate(&self) -> BondResult<()> {
        if self.maturity <= self.effective_date {
            return Err(BondError::validation(format!(
                "maturity {} is not after effective date {}",
                self.maturity, self.effective_date
            )));
        }
        if !is_positive(self.face) {
            return Err(BondError::validation("face must be positive"));
        }
        if !is_positive(self.redemption) {
            return Err(BondError::validation("redemption must be positive"));
        }
        validate_exercise("call", &self.calls)?;
        validate_exercise("put", &self.puts)?;
        self.validate_amortization()?;
        strictly_increasing("coupon step", self.coupon_schedule.iter().map(|s| s.date))?;

        if let Some(floating) = &self.floating {
            if let Some(w) = floating.resets.windows(2).find(|w| w[1].date < w[0].date) {
                return Err(BondError::validation(format!(
                    "reset {} precedes reset {}",
                    w[1].date, w[0].date
                )));
            }
            if let Some(r) = floating.resets.iter().find(|r| r.date < self.effective_date) {
                return Err(BondError::validation(format!(
                    "reset {} precedes effective date {}",
                    r.date, self.effective_date
                )));
            }
        }

        if let Some(conversion) = &self.conversion {
            if conversion.ratio.is_nan() || conversion.ratio < 0.0 || !is_positive(conversion.par_amount) {
                return Err(BondError::validation(
                    "conversion needs a non-negative ratio and positive par amount",
                ));
            }
            if conversion.end_date < conversion.start_date {
                return Err(BondError::validation("conversion window ends before it starts"));
            }
        }

        if let Some(schedule) = &self.custom_schedule {
            if schedule.start_date() != Some(self.effective_date)
                || schedule.end_date() != Some(self.maturity)
            {
                return Err(BondError::validation(
                    "custom schedule must span effective date to maturity",
                ));
            }
        }
        Ok(())
    }

    fn validate_amortization(&self) -> BondResult<()> {
        let entries = self.amortization.entries();
        strictly_increasing("amortization", entries.iter().map(|e| e.date()))?;
        if let Some(e) = entries
            .iter()
            .find(|e| e.date() <= self.effective_date || e.date() > self.maturity)
        {
            return Err(BondError::validation(format!(
                "amortization on {} outside ({}, {}]",
                e.date(),
                self.effective_date,
                self.maturity
            )));
        }
        let mut previous = self.face;
        for (date, notional) in self.amortization.notional_path(self.face) {
            if notional < 0.0 {
                return Err(BondError::validation(format!(
                    "amortization on {date} leaves negative notional {notional}"
                )));
            }
            if notional > previous {
                return Err(BondError::validation(format!(
                    "amortization on {date} increases notional to {notional}"
                )));
            }
            previous = notional;
        }
        Ok(())
    }
}

fn validate_exercise(kind: &str, periods: &[ExercisePeriod]) -> BondResult<()> {
    if let Some(p) = periods.iter().find(|p| p.end_date < p.start_date) {
        return Err(BondError::validation(format!(
            "{kind} period starting {} ends before it starts",
            p.start_date
        )));
    }
    if let Some(p) = periods.iter().find(|p| !is_positive(p.strike)) {
        return Err(BondError::validation(format!(
            "{kind} period starting {} has non-positive strike",
            p.start_date
        )));
    }
    strictly_increasing(kind, periods.iter().map(|p| p.start_date))?;
    if let Some(w) = periods.windows(2).find(|w| w[1].start_date <= w[0].end_date) {
        return Err(BondError::validation(format!(
            "{kind} periods starting {} and {} overlap",
            w[0].start_date, w[1].start_date
        )));
    }
    Ok(())
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn strictly_increasing(kind: &str, dates: impl Iterator<Item = Date>) -> BondResult<()> {
    let mut previous: Option<Date> = None;
    for date in dates {
        if previous.is_some_and(|p| date <= p) {
            return Err(BondError::validation(format!(
                "{kind} dates are not strictly increasing at {date}"
            )));
        }
        previous = Some(date);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AmortizationEntry, AmortizationSchedule, CallPeriod, OptionStyle};
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn terms() -> BondTerms {
        BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
    }

    #[test]
    fn plain_terms_are_valid() {
        assert!(terms().validate().is_ok());
    }

    #[test]
    fn maturity_before_effective() {
        let mut t = terms();
        t.maturity = d(2024, 1, 1);
        assert!(t.validate().unwrap_err().is_validation());
    }

    #[test]
    fn overlapping_calls() {
        let t = terms()
            .with_call(CallPeriod::new(d(2028, 1, 15), d(2030, 1, 15), 101.0, OptionStyle::American))
            .with_call(CallPeriod::new(d(2029, 1, 15), d(2035, 1, 15), 100.0, OptionStyle::American));
        assert!(t.validate().is_err());

        let ok = terms()
            .with_call(CallPeriod::new(d(2028, 1, 15), d(2030, 1, 14), 101.0, OptionStyle::American))
            .with_call(CallPeriod::new(d(2030, 1, 15), d(2035, 1, 15), 100.0, OptionStyle::American));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn unordered_calls() {
        let t = terms()
            .with_call(CallPeriod::european(d(2030, 1, 15), 100.0))
            .with_call(CallPeriod::european(d(2028, 1, 15), 100.0));
        assert!(t.validate().is_err());
    }

    #[test]
    fn amortization_checks() {
        let outside = terms().with_amortization(AmortizationSchedule::sinking_fund(&[d(2036, 1, 15)], 10.0));
        assert!(outside.validate().is_err());

        let negative = terms().with_amortization(AmortizationSchedule::sinking_fund(
            &[d(2030, 1, 15), d(2031, 1, 15)],
            60.0,
        ));
        assert!(negative.validate().is_err());

        let increasing = terms().with_amortization(AmortizationSchedule::new(vec![
            AmortizationEntry::RemainingNotional { date: d(2030, 1, 15), notional: 50.0 },
            AmortizationEntry::RemainingNotional { date: d(2031, 1, 15), notional: 70.0 },
        ]));
        assert!(increasing.validate().is_err());
    }

    #[test]
    fn coupon_steps_must_increase() {
        let t = terms()
            .with_coupon_step(d(2030, 1, 15), 0.06)
            .with_coupon_step(d(2028, 1, 15), 0.055);
        assert!(t.validate().is_err());
    }
}
