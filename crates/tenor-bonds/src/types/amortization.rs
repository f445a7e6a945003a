//! Sinking-fund / amortizing principal.

use serde::{Deserialize, Serialize};

use tenor_core::Date;

/// One principal reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AmortizationEntry {
    /// Outstanding notional after `date`, in face units.
    RemainingNotional {
        /// Effective date.
        date: Date,
        /// Notional left outstanding.
        notional: f64,
    },
    /// Repay `percent` of the initial notional on `date`.
    PercentOfInitial {
        /// Effective date.
        date: Date,
        /// Percent of the initial notional repaid.
        percent: f64,
    },
}

impl AmortizationEntry {
    /// Effective date of the entry.
    #[must_use]
    pub fn date(&self) -> Date {
        match self {
            AmortizationEntry::RemainingNotional { date, .. }
            | AmortizationEntry::PercentOfInitial { date, .. } => *date,
        }
    }
}

/// Ordered principal reductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AmortizationSchedule {
    entries: Vec<AmortizationEntry>,
}

impl AmortizationSchedule {
    /// Creates a schedule. Ordering is checked by bond validation.
    #[must_use]
    pub fn new(entries: Vec<AmortizationEntry>) -> Self {
        Self { entries }
    }

    /// Equal percentage repayments on each date.
    #[must_use]
    pub fn sinking_fund(dates: &[Date], percent_each: f64) -> Self {
        Self::new(
            dates
                .iter()
                .map(|&date| AmortizationEntry::PercentOfInitial { date, percent: percent_each })
                .collect(),
        )
    }

    /// The entries in order.
    #[must_use]
    pub fn entries(&self) -> &[AmortizationEntry] {
        &self.entries
    }

    /// True for bullet bonds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outstanding notional after each entry, starting from `initial`.
    #[must_use]
    pub fn notional_path(&self, initial: f64) -> Vec<(Date, f64)> {
        let mut outstanding = initial;
        self.entries
            .iter()
            .map(|entry| {
                outstanding = match *entry {
                    AmortizationEntry::RemainingNotional { notional, .. } => notional,
                    AmortizationEntry::PercentOfInitial { percent, .. } => {
                        outstanding - initial * percent / 100.0
                    }
                };
                (entry.date(), outstanding)
            })
            .collect()
    }

    /// Outstanding notional once every entry dated on or before `date` has applied.
    #[must_use]
    pub fn outstanding_on(&self, initial: f64, date: Date) -> f64 {
        self.notional_path(initial)
            .into_iter()
            .take_while(|(d, _)| *d <= date)
            .last()
            .map_or(initial, |(_, n)| n)
    }
}
