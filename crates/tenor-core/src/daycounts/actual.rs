//! Conventions with an actual-days numerator.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// Actual/360.
#[derive(Debug, Clone, Copy, Default)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "ACT/360"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }
}

/// Actual/365 Fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "ACT/365F"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(365)
    }
}

/// Actual/Actual ISDA: days in each calendar year over that year's length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ACT/ACT ISDA"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        if end < start {
            return -self.year_fraction(end, start);
        }
        let mut total = Decimal::ZERO;
        let mut cursor = start.as_naive();
        let stop = end.as_naive();
        while cursor < stop {
            let year = chrono::Datelike::year(&cursor);
            let next_year = chrono::NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap_or(stop);
            let segment_end = next_year.min(stop);
            let basis = if Date::from_naive(cursor).is_leap_year() {
                366
            } else {
                365
            };
            total += Decimal::from((segment_end - cursor).num_days()) / Decimal::from(basis);
            cursor = segment_end;
        }
        total
    }
}

/// Actual/Actual ICMA: days over the length of the enclosing coupon period.
///
/// Without a reference period it falls back to the ISDA split.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActActIcma;

impl DayCount for ActActIcma {
    fn name(&self) -> &'static str {
        "ACT/ACT ICMA"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        ActActIsda.year_fraction(start, end)
    }

    fn period_fraction(
        &self,
        start: Date,
        end: Date,
        ref_start: Date,
        ref_end: Date,
        periods_per_year: u32,
    ) -> Decimal {
        let period_days = ref_start.days_between(&ref_end);
        if period_days <= 0 || periods_per_year == 0 {
            return self.year_fraction(start, end);
        }
        Decimal::from(start.days_between(&end))
            / (Decimal::from(period_days) * Decimal::from(periods_per_year))
    }
}
