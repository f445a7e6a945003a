//! Equity conversion terms.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

/// Right to exchange the bond for shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionTerms {
    /// Shares received per `par_amount` of bond.
    pub ratio: f64,
    /// First conversion date.
    pub start_date: Date,
    /// Last conversion date (inclusive).
    pub end_date: Date,
    /// Bond notional the ratio refers to.
    pub par_amount: f64,
}

impl ConversionTerms {
    /// Creates conversion terms.
    #[must_use]
    pub fn new(ratio: f64, start_date: Date, end_date: Date, par_amount: f64) -> Self {
        Self {
            ratio,
            start_date,
            end_date,
            par_amount,
        }
    }

    /// Shares received per 100 of notional.
    #[must_use]
    pub fn shares_per_hundred(&self) -> f64 {
        self.ratio * 100.0 / self.par_amount
    }

    /// Conversion value per 100 of notional.
    #[must_use]
    pub fn parity(&self, spot: f64) -> f64 {
        self.shares_per_hundred() * spot
    }

    /// True if conversion is allowed on `date`.
    #[must_use]
    pub fn is_active_on(&self, date: Date) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
