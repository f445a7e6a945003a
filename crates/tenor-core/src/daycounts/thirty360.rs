//! 30/360 family.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

fn last_day_of_february(date: Date) -> bool {
    date.month() == 2 && date.is_end_of_month()
}

fn thirty_360_days(start: Date, end: Date, d1: i64, d2: i64) -> i64 {
    360 * i64::from(end.year() - start.year())
        + 30 * (i64::from(end.month()) - i64::from(start.month()))
        + (d2 - d1)
}

/// 30/360 US bond basis.
///
/// Rules, applied in order:
/// 1. both dates last of February: D2 = 30;
/// 2. D1 last of February: D1 = 30;
/// 3. D2 = 31 and D1 >= 30: D2 = 30;
/// 4. D1 = 31: D1 = 30.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thirty360US;

impl DayCount for Thirty360US {
    fn name(&self) -> &'static str {
        "30/360 US"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let mut d1 = i64::from(start.day());
        let mut d2 = i64::from(end.day());
        let feb_start = last_day_of_february(start);
        if feb_start && last_day_of_february(end) {
            d2 = 30;
        }
        if feb_start || d1 == 31 {
            d1 = 30;
        }
        if d2 == 31 && d1 >= 30 {
            d2 = 30;
        }
        thirty_360_days(start, end, d1, d2)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }
}

/// 30E/360 Eurobond basis: the 31st is always treated as the 30th.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = i64::from(start.day().min(30));
        let d2 = i64::from(end.day().min(30));
        thirty_360_days(start, end, d1, d2)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }
}
