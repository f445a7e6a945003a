//! Schedules, accrued interest and cashflow projection.

mod accrued;
mod projector;
mod schedule;

pub use accrued::{ex_dividend_date, AccruedInterest, AccruedInterestCalculator};
pub use projector::{BondCashflow, CashflowKind, CashflowProjector};
pub use schedule::{build_schedule, cycle_date, Period, Schedule};
