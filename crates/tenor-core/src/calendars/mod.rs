//! Business-day calendars.
//!
//! Holiday tables are supplied by the caller; the engine only needs to ask
//! whether a day is a business day, roll a date and count business days.

mod conventions;

pub use conventions::{roll, BusinessDayConvention};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::Date;

/// A business-day calendar.
pub trait Calendar: Send + Sync {
    /// Calendar identifier.
    fn name(&self) -> &str;

    /// True if `date` is a good business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Rolls `date` to a business day with `convention`.
    fn roll(&self, date: Date, convention: BusinessDayConvention) -> Date {
        roll(date, convention, self)
    }

    /// Moves `n` business days forward (negative `n` moves backward).
    ///
    /// A zero shift rolls a holiday forward to the next business day.
    fn add_business_days(&self, date: Date, n: i32) -> Date {
        if n == 0 {
            return self.next_business_day(date);
        }
        let step = if n > 0 { 1 } else { -1 };
        let mut remaining = n.unsigned_abs();
        let mut cursor = date;
        while remaining > 0 {
            cursor = cursor.add_days(step);
            if self.is_business_day(cursor) {
                remaining -= 1;
            }
        }
        cursor
    }

    /// First business day on or after `date`.
    fn next_business_day(&self, date: Date) -> Date {
        let mut cursor = date;
        while !self.is_business_day(cursor) {
            cursor = cursor.add_days(1);
        }
        cursor
    }

    /// First business day on or before `date`.
    fn previous_business_day(&self, date: Date) -> Date {
        let mut cursor = date;
        while !self.is_business_day(cursor) {
            cursor = cursor.add_days(-1);
        }
        cursor
    }

    /// Business days in `(start, end]`.
    fn business_days_between(&self, start: Date, end: Date) -> i64 {
        if end <= start {
            return -self.business_days_between(end, start);
        }
        let mut count = 0;
        let mut cursor = start;
        while cursor < end {
            cursor = cursor.add_days(1);
            if self.is_business_day(cursor) {
                count += 1;
            }
        }
        count
    }
}

/// Weekend-aware calendar with an explicit holiday list.
///
/// An empty holiday list gives a plain Saturday/Sunday calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    name: String,
    #[serde(default)]
    holidays: BTreeSet<Date>,
}

impl HolidayCalendar {
    /// Creates a calendar from a holiday list.
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = Date>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Saturday/Sunday only.
    #[must_use]
    pub fn weekends_only() -> Self {
        Self::new("WEEKEND", [])
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: Date) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Listed holidays.
    pub fn holidays(&self) -> impl Iterator<Item = &Date> {
        self.holidays.iter()
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::weekends_only()
    }
}

impl Calendar for HolidayCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        let cal = HolidayCalendar::weekends_only();
        assert!(!cal.is_business_day(d(2025, 6, 14)));
        assert!(cal.is_business_day(d(2025, 6, 16)));
    }

    #[test]
    fn holidays_are_skipped_by_business_day_arithmetic() {
        let cal = HolidayCalendar::weekends_only().with_holiday(d(2025, 7, 4));
        // Thursday 3rd + 1 business day skips the Friday holiday and the weekend.
        assert_eq!(cal.add_business_days(d(2025, 7, 3), 1), d(2025, 7, 7));
        assert_eq!(cal.add_business_days(d(2025, 7, 7), -1), d(2025, 7, 3));
        assert_eq!(cal.business_days_between(d(2025, 7, 3), d(2025, 7, 8)), 2);
    }

    #[test]
    fn zero_shift_rolls_forward() {
        let cal = HolidayCalendar::weekends_only();
        assert_eq!(cal.add_business_days(d(2025, 6, 14), 0), d(2025, 6, 16));
    }
}
