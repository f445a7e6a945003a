//! Floating-rate coupon terms.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

/// An index fixing observed on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateReset {
    /// Fixing date.
    pub date: Date,
    /// Index level (0.05 = 5%).
    pub rate: f64,
}

/// Index, margin and fixings of a floater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingTerms {
    /// Reference index name.
    pub index: String,
    /// Quoted margin over the index.
    pub margin: f64,
    /// Latest index level, used for unfixed periods without a forward curve.
    pub current_rate: Option<f64>,
    /// Index level for the current (stub) period.
    pub stub_rate: Option<f64>,
    /// Historical fixings in date order.
    pub resets: Vec<RateReset>,
}

impl FloatingTerms {
    /// A floater paying `index + margin`.
    #[must_use]
    pub fn new(index: impl Into<String>, margin: f64) -> Self {
        Self {
            index: index.into(),
            margin,
            current_rate: None,
            stub_rate: None,
            resets: Vec::new(),
        }
    }

    /// Sets the current index level.
    #[must_use]
    pub fn with_current_rate(mut self, rate: f64) -> Self {
        self.current_rate = Some(rate);
        self
    }

    /// Sets the stub-period index level.
    #[must_use]
    pub fn with_stub_rate(mut self, rate: f64) -> Self {
        self.stub_rate = Some(rate);
        self
    }

    /// Adds a fixing.
    #[must_use]
    pub fn with_reset(mut self, date: Date, rate: f64) -> Self {
        self.resets.push(RateReset { date, rate });
        self
    }

    /// Latest fixing on or before `accrual_start`.
    #[must_use]
    pub fn fixing_for(&self, accrual_start: Date) -> Option<f64> {
        self.resets
            .iter()
            .rev()
            .find(|r| r.date <= accrual_start)
            .map(|r| r.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixing_is_latest_on_or_before_start() {
        let d = |m: u32| Date::from_ymd(2025, m, 15).unwrap();
        let terms = FloatingTerms::new("SOFR", 0.01)
            .with_reset(d(1), 0.040)
            .with_reset(d(4), 0.042)
            .with_reset(d(7), 0.045);
        assert_eq!(terms.fixing_for(d(1)), Some(0.040));
        assert_eq!(terms.fixing_for(d(6)), Some(0.042));
        assert_eq!(terms.fixing_for(d(12)), Some(0.045));
        assert_eq!(terms.fixing_for(Date::from_ymd(2024, 12, 31).unwrap()), None);
    }
}
