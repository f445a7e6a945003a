//! Day count conventions.
//!
//! Year fractions are returned as `Decimal` so that 30/360 and ACT/360
//! arithmetic is exact; callers convert to `f64` at the discounting boundary.
//!
//! ```rust
//! use tenor_core::daycounts::{DayCount, DayCountConvention};
//! use tenor_core::types::Date;
//! use rust_decimal_macros::dec;
//!
//! let start = Date::from_ymd(2025, 1, 31).unwrap();
//! let end = Date::from_ymd(2025, 3, 31).unwrap();
//! assert_eq!(DayCountConvention::Thirty360US.day_count(start, end), 60);
//! assert_eq!(DayCountConvention::Act360.year_fraction(start, end), dec!(59) / dec!(360));
//! ```

mod actual;
mod thirty360;

pub use actual::{Act360, Act365Fixed, ActActIcma, ActActIsda};
pub use thirty360::{Thirty360E, Thirty360US};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TenorError;
use crate::types::Date;

/// A day count convention.
pub trait DayCount: Send + Sync {
    /// Market name of the convention.
    fn name(&self) -> &'static str;

    /// Days between `start` and `end` under the convention.
    fn day_count(&self, start: Date, end: Date) -> i64;

    /// Year fraction between `start` and `end`.
    fn year_fraction(&self, start: Date, end: Date) -> Decimal;

    /// Year fraction of `[start, end]` measured inside the regular coupon
    /// period `[ref_start, ref_end]` of a bond paying `periods_per_year`.
    ///
    /// Only period-based conventions use the reference period.
    fn period_fraction(
        &self,
        start: Date,
        end: Date,
        _ref_start: Date,
        _ref_end: Date,
        _periods_per_year: u32,
    ) -> Decimal {
        self.year_fraction(start, end)
    }
}

/// Runtime-selectable day count convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// Actual/360.
    Act360,
    /// Actual/365 Fixed.
    Act365Fixed,
    /// Actual/Actual ISDA (calendar-year split).
    ActActIsda,
    /// Actual/Actual ICMA (coupon-period based).
    ActActIcma,
    /// 30/360 US bond basis with February end-of-month rules.
    #[default]
    Thirty360US,
    /// 30E/360 Eurobond basis.
    Thirty360E,
}

impl DayCountConvention {
    /// Every supported convention.
    pub const ALL: [DayCountConvention; 6] = [
        DayCountConvention::Act360,
        DayCountConvention::Act365Fixed,
        DayCountConvention::ActActIsda,
        DayCountConvention::ActActIcma,
        DayCountConvention::Thirty360US,
        DayCountConvention::Thirty360E,
    ];

    fn inner(&self) -> &'static dyn DayCount {
        match self {
            DayCountConvention::Act360 => &Act360,
            DayCountConvention::Act365Fixed => &Act365Fixed,
            DayCountConvention::ActActIsda => &ActActIsda,
            DayCountConvention::ActActIcma => &ActActIcma,
            DayCountConvention::Thirty360US => &Thirty360US,
            DayCountConvention::Thirty360E => &Thirty360E,
        }
    }

    /// True for conventions whose fraction depends on the coupon period.
    #[must_use]
    pub const fn is_period_based(&self) -> bool {
        matches!(self, DayCountConvention::ActActIcma)
    }
}

impl DayCount for DayCountConvention {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        self.inner().day_count(start, end)
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        self.inner().year_fraction(start, end)
    }

    fn period_fraction(
        &self,
        start: Date,
        end: Date,
        ref_start: Date,
        ref_end: Date,
        periods_per_year: u32,
    ) -> Decimal {
        self.inner()
            .period_fraction(start, end, ref_start, ref_end, periods_per_year)
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = TenorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "ACT360" | "A360" => Ok(DayCountConvention::Act360),
            "ACT365F" | "ACT365FIXED" | "A365F" => Ok(DayCountConvention::Act365Fixed),
            "ACTACTISDA" | "ACTACT" => Ok(DayCountConvention::ActActIsda),
            "ACTACTICMA" | "ACTACTISMA" => Ok(DayCountConvention::ActActIcma),
            "30360" | "30360US" | "THIRTY360US" | "BONDBASIS" => Ok(DayCountConvention::Thirty360US),
            "30E360" | "THIRTY360E" | "EUROBONDBASIS" => Ok(DayCountConvention::Thirty360E),
            _ => Err(TenorError::unknown_convention(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for dc in DayCountConvention::ALL {
            assert_eq!(dc.name().parse::<DayCountConvention>().unwrap(), dc);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("BUS/252".parse::<DayCountConvention>().is_err());
    }
}
