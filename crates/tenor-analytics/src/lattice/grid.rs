//! Date-based time grids for lattices.

use tenor_core::types::Date;
use tenor_curves::time_from;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Ordered lattice dates from settlement, with ACT/365 times.
///
/// Every key date (cash flows, coupon dates, exercise window boundaries) is
/// a grid point. Gaps wider than `365 / steps_per_year` days are split into
/// equal whole-day steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    dates: Vec<Date>,
    times: Vec<f64>,
}

impl TimeGrid {
    /// Builds a grid from `settle` to the last key date.
    ///
    /// Key dates on or before `settle` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidInput` if `steps_per_year` is zero or
    /// no key date lies after `settle`.
    pub fn build<I>(settle: Date, key_dates: I, steps_per_year: u32) -> AnalyticsResult<Self>
    where
        I: IntoIterator<Item = Date>,
    {
        if steps_per_year == 0 {
            return Err(AnalyticsError::invalid_input("steps_per_year must be positive"));
        }
        let mut keys: Vec<Date> = key_dates.into_iter().filter(|d| *d > settle).collect();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Err(AnalyticsError::invalid_input(format!(
                "no lattice dates after {settle}"
            )));
        }

        let max_days = i64::from((365 / steps_per_year).max(1));
        let mut dates = vec![settle];
        for key in keys {
            let from = dates[dates.len() - 1];
            let gap = from.days_between(&key);
            let pieces = (gap + max_days - 1) / max_days;
            for k in 1..pieces {
                dates.push(from.add_days(k * gap / pieces));
            }
            dates.push(key);
        }
        let times = dates.iter().map(|d| time_from(settle, *d)).collect();
        Ok(Self { dates, times })
    }

    /// Grid dates, starting at settlement.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Years from settlement of every grid date.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of time steps (grid points less one).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.dates.len() - 1
    }

    /// Length in years of step `i`.
    #[must_use]
    pub fn dt(&self, i: usize) -> f64 {
        self.times[i + 1] - self.times[i]
    }

    /// Index of the first grid date on or after `date`, clamped to the last point.
    #[must_use]
    pub fn index_on_or_after(&self, date: Date) -> usize {
        self.dates
            .partition_point(|d| *d < date)
            .min(self.dates.len() - 1)
    }

    /// Index of `date` if it is a grid point.
    #[must_use]
    pub fn index_of(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn keeps_key_dates_and_refines() {
        let grid = TimeGrid::build(d(2025, 1, 1), [d(2025, 7, 1), d(2026, 1, 1), d(2024, 1, 1)], 12).unwrap();
        assert_eq!(grid.dates()[0], d(2025, 1, 1));
        assert!(grid.index_of(d(2025, 7, 1)).is_some());
        assert_eq!(*grid.dates().last().unwrap(), d(2026, 1, 1));
        for w in grid.dates().windows(2) {
            let gap = w[0].days_between(&w[1]);
            assert!(gap > 0 && gap <= 30);
        }
    }

    #[test]
    fn index_lookup() {
        let grid = TimeGrid::build(d(2025, 1, 1), [d(2025, 1, 11)], 365).unwrap();
        assert_eq!(grid.steps(), 10);
        assert_eq!(grid.index_on_or_after(d(2024, 6, 1)), 0);
        assert_eq!(grid.index_on_or_after(d(2025, 1, 5)), 4);
        assert_eq!(grid.index_on_or_after(d(2026, 1, 5)), 10);
        assert!((grid.dt(0) - 1.0 / 365.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_empty_grid() {
        assert!(TimeGrid::build(d(2025, 1, 1), [d(2024, 1, 1)], 12).is_err());
        assert!(TimeGrid::build(d(2025, 1, 1), [d(2026, 1, 1)], 0).is_err());
    }
}
