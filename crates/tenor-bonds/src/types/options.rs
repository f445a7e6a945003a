//! Embedded call and put periods.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

/// When inside a period the option can be exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OptionStyle {
    /// Only on the period start date.
    European,
    /// On any date in the period.
    #[default]
    American,
    /// On the period start and on coupon dates inside the period.
    Bermudan,
}

/// Extra condition attached to an issuer call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum CallTrigger {
    /// Unconditional.
    #[default]
    None,
    /// Make-whole: redemption is the larger of strike and the remaining flows
    /// discounted at the curve plus `spread`. Never optimal to exercise.
    MakeWhole {
        /// Discount spread over the curve.
        spread: f64,
    },
    /// Convertible soft call: exercisable only while parity is at least
    /// `parity_ratio` times the call strike.
    SoftCall {
        /// Parity to strike ratio, 1.3 for a 130% trigger.
        parity_ratio: f64,
    },
}

/// A window during which a call or put can be exercised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExercisePeriod {
    /// First exercise date.
    pub start_date: Date,
    /// Last exercise date (inclusive).
    pub end_date: Date,
    /// Clean exercise price in percent of outstanding notional.
    pub strike: f64,
    /// Exercise condition.
    pub trigger: CallTrigger,
    /// Exercise style.
    pub style: OptionStyle,
    /// Notice days: no exercise earlier than `settle + grace_days`.
    pub grace_days: u32,
}

/// An issuer call period.
pub type CallPeriod = ExercisePeriod;

/// A holder put period.
pub type PutPeriod = ExercisePeriod;

impl ExercisePeriod {
    /// An unconditional period.
    #[must_use]
    pub fn new(start_date: Date, end_date: Date, strike: f64, style: OptionStyle) -> Self {
        Self {
            start_date,
            end_date,
            strike,
            trigger: CallTrigger::None,
            style,
            grace_days: 0,
        }
    }

    /// A single-date period.
    #[must_use]
    pub fn european(date: Date, strike: f64) -> Self {
        Self::new(date, date, strike, OptionStyle::European)
    }

    /// Sets the trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: CallTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Sets the notice days.
    #[must_use]
    pub fn with_grace_days(mut self, days: u32) -> Self {
        self.grace_days = days;
        self
    }

    /// True if the window covers `date`.
    #[must_use]
    pub fn is_active_on(&self, date: Date) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// True if exercise is contractually possible on `date`.
    ///
    /// `is_coupon_date` drives Bermudan eligibility, `settle` the notice period.
    #[must_use]
    pub fn allows_exercise(&self, date: Date, is_coupon_date: bool, settle: Date) -> bool {
        if date < settle.add_days(i64::from(self.grace_days)) {
            return false;
        }
        match self.style {
            OptionStyle::European => date == self.start_date,
            OptionStyle::American => self.is_active_on(date),
            OptionStyle::Bermudan => {
                self.is_active_on(date) && (is_coupon_date || date == self.start_date)
            }
        }
    }

    /// Exercise dates used for yield-to-call style calculations: the period
    /// start and every coupon date inside the window (European: start only).
    #[must_use]
    pub fn candidate_dates(&self, coupon_dates: &[Date], settle: Date) -> Vec<Date> {
        let mut dates = vec![self.start_date];
        if self.style != OptionStyle::European {
            dates.extend(coupon_dates.iter().copied().filter(|d| self.is_active_on(*d)));
        }
        dates.sort();
        dates.dedup();
        dates.retain(|d| *d > settle && self.allows_exercise(*d, true, settle));
        dates
    }

    /// True for make-whole calls.
    #[must_use]
    pub fn is_make_whole(&self) -> bool {
        matches!(self.trigger, CallTrigger::MakeWhole { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn european_only_on_start() {
        let p = ExercisePeriod::european(d(2027, 6, 15), 100.0);
        assert!(p.allows_exercise(d(2027, 6, 15), false, d(2025, 1, 1)));
        assert!(!p.allows_exercise(d(2027, 6, 16), true, d(2025, 1, 1)));
    }

    #[test]
    fn bermudan_needs_coupon_date() {
        let p = ExercisePeriod::new(d(2027, 1, 1), d(2029, 1, 1), 100.0, OptionStyle::Bermudan);
        assert!(p.allows_exercise(d(2027, 1, 1), false, d(2025, 1, 1)));
        assert!(!p.allows_exercise(d(2027, 3, 1), false, d(2025, 1, 1)));
        assert!(p.allows_exercise(d(2027, 7, 1), true, d(2025, 1, 1)));
    }

    #[test]
    fn grace_days_block_early_exercise() {
        let p = ExercisePeriod::new(d(2025, 1, 1), d(2030, 1, 1), 100.0, OptionStyle::American)
            .with_grace_days(30);
        let settle = d(2025, 3, 1);
        assert!(!p.allows_exercise(d(2025, 3, 20), false, settle));
        assert!(p.allows_exercise(d(2025, 4, 1), false, settle));
    }

    #[test]
    fn candidates_include_window_coupons() {
        let p = ExercisePeriod::new(d(2027, 2, 1), d(2028, 1, 15), 101.0, OptionStyle::American);
        let coupons = [d(2027, 1, 15), d(2027, 7, 15), d(2028, 1, 15), d(2028, 7, 15)];
        let c = p.candidate_dates(&coupons, d(2025, 1, 1));
        assert_eq!(c, vec![d(2027, 2, 1), d(2027, 7, 15), d(2028, 1, 15)]);
    }
}
