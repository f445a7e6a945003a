//! Business-day rolling conventions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Calendar;
use crate::types::Date;

/// How a date falling on a non-business day is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BusinessDayConvention {
    /// Leave the date as is.
    Unadjusted,
    /// Next business day.
    #[default]
    Following,
    /// Next business day unless that changes month, else previous.
    ModifiedFollowing,
    /// Previous business day.
    Preceding,
    /// Previous business day unless that changes month, else next.
    ModifiedPreceding,
}

impl fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "Modified Preceding",
        };
        f.write_str(name)
    }
}

/// Rolls `date` onto a business day of `calendar`.
pub fn roll<C: Calendar + ?Sized>(date: Date, convention: BusinessDayConvention, calendar: &C) -> Date {
    if calendar.is_business_day(date) {
        return date;
    }
    match convention {
        BusinessDayConvention::Unadjusted => date,
        BusinessDayConvention::Following => calendar.next_business_day(date),
        BusinessDayConvention::Preceding => calendar.previous_business_day(date),
        BusinessDayConvention::ModifiedFollowing => {
            let next = calendar.next_business_day(date);
            if next.month() == date.month() {
                next
            } else {
                calendar.previous_business_day(date)
            }
        }
        BusinessDayConvention::ModifiedPreceding => {
            let prev = calendar.previous_business_day(date);
            if prev.month() == date.month() {
                prev
            } else {
                calendar.next_business_day(date)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::HolidayCalendar;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn modified_following_stays_in_month() {
        let cal = HolidayCalendar::weekends_only();
        // Saturday 2025-05-31.
        let sat = d(2025, 5, 31);
        assert_eq!(roll(sat, BusinessDayConvention::Following, &cal), d(2025, 6, 2));
        assert_eq!(roll(sat, BusinessDayConvention::ModifiedFollowing, &cal), d(2025, 5, 30));
    }

    #[test]
    fn modified_preceding_stays_in_month() {
        let cal = HolidayCalendar::weekends_only();
        // Sunday 2025-06-01.
        let sun = d(2025, 6, 1);
        assert_eq!(roll(sun, BusinessDayConvention::Preceding, &cal), d(2025, 5, 30));
        assert_eq!(roll(sun, BusinessDayConvention::ModifiedPreceding, &cal), d(2025, 6, 2));
        assert_eq!(roll(sun, BusinessDayConvention::Unadjusted, &cal), sun);
    }
}
