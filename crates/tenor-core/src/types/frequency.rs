//! Coupon frequency.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TenorError;

/// Number of coupon payments per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// One payment per year.
    Annual,
    /// Two payments per year.
    #[default]
    SemiAnnual,
    /// Four payments per year.
    Quarterly,
    /// Twelve payments per year.
    Monthly,
    /// Single payment at maturity.
    Zero,
}

impl Frequency {
    /// Payments per year, zero for [`Frequency::Zero`].
    #[must_use]
    pub const fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Zero => 0,
        }
    }

    /// Months in one regular period, zero for [`Frequency::Zero`].
    #[must_use]
    pub const fn months_per_period(&self) -> u32 {
        match self {
            Frequency::Zero => 0,
            other => 12 / other.periods_per_year(),
        }
    }

    /// True for bonds without intermediate coupons.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        matches!(self, Frequency::Zero)
    }

    /// Periods per year as a float, using 1 for zero-coupon bonds.
    #[must_use]
    pub fn compounding_f64(&self) -> f64 {
        match self {
            Frequency::Zero => 1.0,
            other => f64::from(other.periods_per_year()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "SemiAnnual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
            Frequency::Zero => "Zero",
        };
        f.write_str(s)
    }
}

impl FromStr for Frequency {
    type Err = TenorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1" | "A" | "ANNUAL" => Ok(Frequency::Annual),
            "2" | "S" | "SA" | "SEMIANNUAL" => Ok(Frequency::SemiAnnual),
            "4" | "Q" | "QUARTERLY" => Ok(Frequency::Quarterly),
            "12" | "M" | "MONTHLY" => Ok(Frequency::Monthly),
            "0" | "Z" | "ZERO" => Ok(Frequency::Zero),
            _ => Err(TenorError::unknown_convention(s)),
        }
    }
}
