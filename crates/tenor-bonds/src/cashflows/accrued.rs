//! Accrued interest with ex-dividend and payment-lag handling.
//!
//! Accrual always runs over unadjusted period boundaries. Inside the
//! ex-dividend window (settle on or after the ex date of the period's
//! payment) the buyer is not entitled to the coupon, so accrued is the
//! negative of the interest still to accrue to the period end.

use rust_decimal::prelude::ToPrimitive;

use tenor_core::calendars::{BusinessDayConvention, Calendar};
use tenor_core::daycounts::{DayCount, DayCountConvention};
use tenor_core::types::{Date, Frequency};

use super::projector::{fraction, notional_segments, period_rate};
use super::schedule::{Period, Schedule};
use crate::types::BondTerms;

/// Accrued interest at a settlement date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccruedInterest {
    /// Accrued amount per `face`; negative inside the ex-dividend window.
    pub amount: f64,
    /// Accrued days; negative inside the ex-dividend window.
    pub days: i64,
    /// True if settlement is in the ex-dividend window.
    pub ex_dividend: bool,
    /// Index of the period containing settlement.
    pub period_index: Option<usize>,
}

impl AccruedInterest {
    /// No accrual.
    #[must_use]
    pub fn zero(period_index: Option<usize>) -> Self {
        Self {
            amount: 0.0,
            days: 0,
            ex_dividend: false,
            period_index,
        }
    }
}

/// Ex-dividend date of a coupon paid on `payment_date`, if the bond has a rule.
///
/// Business-day leads are counted on the bond calendar; calendar-day leads
/// are rolled to the preceding business day.
#[must_use]
pub fn ex_dividend_date(terms: &BondTerms, payment_date: Date) -> Option<Date> {
    let rule = terms.ex_dividend?;
    let calendar = &terms.calendar;
    Some(if rule.business_days {
        calendar.add_business_days(payment_date, -(rule.days as i32))
    } else {
        calendar.roll(
            payment_date.add_days(-i64::from(rule.days)),
            BusinessDayConvention::Preceding,
        )
    })
}

/// Calculator for accrued interest.
pub struct AccruedInterestCalculator;

impl AccruedInterestCalculator {
    /// Accrued interest at `settle` over a bond's schedule.
    ///
    /// Settlement on a period boundary belongs to the period that starts
    /// there and accrues nothing. Amortizing bonds accrue piecewise on the
    /// outstanding notional. Floaters need a fixing, stub rate or current
    /// rate for the period; without one they accrue nothing.
    #[must_use]
    pub fn accrued_interest(settle: Date, schedule: &Schedule, terms: &BondTerms) -> AccruedInterest {
        let Some(index) = schedule.period_index(settle) else {
            return AccruedInterest::zero(None);
        };
        let period = &schedule.periods()[index];
        if settle == period.accrual_start {
            return AccruedInterest::zero(Some(index));
        }
        let rate = period_rate(terms, period, settle, None).unwrap_or(0.0);
        let ex_dividend = is_ex_dividend(terms, period, settle);

        let (from, to) = if ex_dividend {
            (settle, period.accrual_end)
        } else {
            (period.accrual_start, settle)
        };
        let accrued = accrue(terms, period, from, to, rate);
        let days = terms.day_count.day_count(from, to);

        if ex_dividend {
            AccruedInterest {
                amount: -accrued,
                days: -days,
                ex_dividend: true,
                period_index: Some(index),
            }
        } else {
            AccruedInterest {
                amount: accrued,
                days,
                ex_dividend: false,
                period_index: Some(index),
            }
        }
    }

    /// Interest accrued from the start of the period containing `date`,
    /// ignoring any ex-dividend rule.
    ///
    /// This is the accrual an exercise or redemption on `date` pays on top
    /// of its clean strike.
    #[must_use]
    pub fn interest_accrued(date: Date, schedule: &Schedule, terms: &BondTerms) -> f64 {
        let Some(index) = schedule.period_index(date) else {
            return 0.0;
        };
        let period = &schedule.periods()[index];
        let rate = period_rate(terms, period, date, None).unwrap_or(0.0);
        accrue(terms, period, period.accrual_start, date, rate)
    }

    /// Accrued days at `settle`; negative inside the ex-dividend window.
    #[must_use]
    pub fn accrual_days(settle: Date, schedule: &Schedule, terms: &BondTerms) -> i64 {
        Self::accrued_interest(settle, schedule, terms).days
    }

    /// Accrued interest between two explicit regular cycle dates.
    ///
    /// Treats `[prev_cycle, next_cycle)` as one regular period on a constant
    /// `face`. Settlement on or after `ex_dividend_date` gives the negative
    /// accrual to `next_cycle`.
    #[must_use]
    pub fn between_cycle_dates(
        settle: Date,
        prev_cycle: Date,
        next_cycle: Date,
        coupon_rate: f64,
        face: f64,
        day_count: DayCountConvention,
        frequency: Frequency,
        ex_dividend_date: Option<Date>,
    ) -> AccruedInterest {
        if settle <= prev_cycle || settle >= next_cycle {
            return AccruedInterest::zero(None);
        }
        let period = Period {
            accrual_start: prev_cycle,
            accrual_end: next_cycle,
            payment_date: next_cycle,
            cycle_start: prev_cycle,
            cycle_end: next_cycle,
        };
        let ex_dividend = ex_dividend_date.is_some_and(|ex| settle >= ex);
        let (from, to) = if ex_dividend {
            (settle, next_cycle)
        } else {
            (prev_cycle, settle)
        };
        let fraction = period
            .accrual_fraction(from, to, day_count, frequency)
            .to_f64()
            .unwrap_or(0.0);
        let amount = face * coupon_rate * fraction;
        let days = day_count.day_count(from, to);
        AccruedInterest {
            amount: if ex_dividend { -amount } else { amount },
            days: if ex_dividend { -days } else { days },
            ex_dividend,
            period_index: None,
        }
    }
}

fn accrue(terms: &BondTerms, period: &Period, from: Date, to: Date, rate: f64) -> f64 {
    notional_segments(terms, period)
        .into_iter()
        .filter_map(|(start, end, notional)| {
            let start = start.max(from);
            let end = end.min(to);
            (end > start).then(|| notional * rate * fraction(terms, period, start, end))
        })
        .sum()
}

fn is_ex_dividend(terms: &BondTerms, period: &Period, settle: Date) -> bool {
    ex_dividend_date(terms, period.payment_date).is_some_and(|ex| settle >= ex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflows::build_schedule;
    use crate::types::{AmortizationEntry, AmortizationSchedule};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn gilt() -> BondTerms {
        BondTerms::fixed(d(2024, 3, 7), d(2030, 3, 7), 0.04, Frequency::SemiAnnual, DayCountConvention::ActActIcma)
            .with_ex_dividend(7, true)
    }

    #[test]
    fn thirty_360_accrual() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2030, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US);
        let schedule = build_schedule(&terms).unwrap();
        let ai = AccruedInterestCalculator::accrued_interest(d(2025, 4, 15), &schedule, &terms);
        assert_relative_eq!(ai.amount, 1.25, epsilon = 1e-12);
        assert_eq!(ai.days, 90);
        assert_eq!(ai.period_index, Some(0));
        assert_eq!(AccruedInterestCalculator::accrual_days(d(2025, 4, 15), &schedule, &terms), 90);
    }

    #[test]
    fn boundary_belongs_to_next_period() {
        let terms = gilt();
        let schedule = build_schedule(&terms).unwrap();
        let ai = AccruedInterestCalculator::accrued_interest(d(2024, 9, 9), &schedule, &terms);
        assert!(ai.amount > 0.0);
        let on = AccruedInterestCalculator::accrued_interest(d(2024, 9, 7), &schedule, &terms);
        assert_eq!(on.amount, 0.0);
        assert_eq!(on.period_index, Some(1));
    }

    #[test]
    fn ex_dividend_window_is_negative() {
        let terms = gilt();
        let schedule = build_schedule(&terms).unwrap();
        // Coupon 2024-09-07 is a Saturday, paid Monday 2024-09-09; ex date is
        // seven business days earlier, 2024-08-29.
        assert_eq!(ex_dividend_date(&terms, d(2024, 9, 9)), Some(d(2024, 8, 29)));
        let cum = AccruedInterestCalculator::accrued_interest(d(2024, 8, 28), &schedule, &terms);
        let ex = AccruedInterestCalculator::accrued_interest(d(2024, 8, 29), &schedule, &terms);
        assert!(!cum.ex_dividend && cum.amount > 0.0);
        assert!(ex.ex_dividend && ex.amount < 0.0);
        assert_eq!(ex.days, -9);
        assert_relative_eq!(ex.amount, -100.0 * 0.04 * 9.0 / (2.0 * 184.0), epsilon = 1e-12);
    }

    #[test]
    fn calendar_day_ex_dividend_rolls_back() {
        let terms = gilt().with_ex_dividend(7, false);
        // 2024-09-09 minus seven days is Monday 2024-09-02.
        assert_eq!(ex_dividend_date(&terms, d(2024, 9, 9)), Some(d(2024, 9, 2)));
        // 2024-09-15 is a Sunday; minus seven days is Sunday 2024-09-08, rolled to Friday.
        assert_eq!(ex_dividend_date(&terms, d(2024, 9, 15)), Some(d(2024, 9, 6)));
    }

    #[test]
    fn explicit_cycle_dates_agree_with_schedule() {
        let terms = gilt();
        let schedule = build_schedule(&terms).unwrap();
        let period = schedule.periods()[2];
        let ex = ex_dividend_date(&terms, period.payment_date);
        let settle = d(2025, 5, 20);
        let high = AccruedInterestCalculator::accrued_interest(settle, &schedule, &terms);
        let low = AccruedInterestCalculator::between_cycle_dates(
            settle,
            period.accrual_start,
            period.accrual_end,
            0.04,
            100.0,
            DayCountConvention::ActActIcma,
            Frequency::SemiAnnual,
            ex,
        );
        assert_relative_eq!(high.amount, low.amount, epsilon = 1e-12);
    }

    #[test]
    fn amortizing_bond_accrues_on_outstanding() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2030, 1, 15), 0.06, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_amortization(AmortizationSchedule::new(vec![AmortizationEntry::RemainingNotional {
                date: d(2025, 4, 15),
                notional: 50.0,
            }]));
        let schedule = build_schedule(&terms).unwrap();
        let ai = AccruedInterestCalculator::accrued_interest(d(2025, 5, 15), &schedule, &terms);
        let expected = 100.0 * 0.06 * 90.0 / 360.0 + 50.0 * 0.06 * 30.0 / 360.0;
        assert_relative_eq!(ai.amount, expected, epsilon = 1e-12);
    }

    #[test]
    fn exercise_accrual_ignores_ex_dividend() {
        let terms = gilt();
        let schedule = build_schedule(&terms).unwrap();
        let accrual = AccruedInterestCalculator::interest_accrued(d(2024, 8, 29), &schedule, &terms);
        assert_relative_eq!(accrual, 100.0 * 0.04 * 175.0 / (2.0 * 184.0), epsilon = 1e-12);
        assert_eq!(AccruedInterestCalculator::interest_accrued(d(2024, 9, 7), &schedule, &terms), 0.0);
    }

    #[test]
    fn outside_schedule_is_zero() {
        let terms = gilt();
        let schedule = build_schedule(&terms).unwrap();
        let ai = AccruedInterestCalculator::accrued_interest(d(2031, 1, 1), &schedule, &terms);
        assert_eq!(ai, AccruedInterest::zero(None));
    }
}
