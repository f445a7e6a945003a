//! # Tenor Bonds
//!
//! Everything that depends only on a bond's contractual terms:
//!
//! - [`types::BondTerms`]: a single record with optional feature sets
//!   (amortization, step-ups, floating index, calls, puts, conversion)
//! - [`cashflows::build_schedule`]: accrual/payment period generation
//! - [`cashflows::AccruedInterestCalculator`]: accrued interest with
//!   ex-dividend and payment-lag handling
//! - [`cashflows::CashflowProjector`]: interest and principal flows with
//!   exact notional bookkeeping
//! - [`Bond`]: validated terms plus their schedule
//!
//! ## Example
//!
//! ```rust
//! use tenor_bonds::prelude::*;
//! use tenor_core::prelude::*;
//!
//! let terms = BondTerms::fixed(
//!     Date::from_ymd(2024, 3, 15).unwrap(),
//!     Date::from_ymd(2029, 3, 15).unwrap(),
//!     0.05,
//!     Frequency::SemiAnnual,
//!     DayCountConvention::Thirty360US,
//! );
//! let bond = Bond::new(terms).unwrap();
//! assert_eq!(bond.schedule().len(), 10);
//!
//! let accrued = bond.accrued_interest(Date::from_ymd(2024, 6, 15).unwrap());
//! assert!((accrued.amount - 1.25).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::float_cmp)]
#![allow(clippy::struct_excessive_bools)]

mod bond;
pub mod cashflows;
pub mod error;
pub mod types;
pub mod validation;

pub use bond::Bond;
pub use error::{BondError, BondResult};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bond::Bond;
    pub use crate::cashflows::{
        build_schedule, AccruedInterest, AccruedInterestCalculator, BondCashflow, CashflowKind,
        CashflowProjector, Period, Schedule,
    };
    pub use crate::error::{BondError, BondResult};
    pub use crate::types::{
        AmortizationEntry, AmortizationSchedule, BondTerms, BondType, CallPeriod, CallTrigger,
        CashflowFlags, ConversionTerms, CouponStep, CycleRule, ExDividendRule, ExercisePeriod,
        FloatingTerms, OptionStyle, PaymentLag, PutPeriod, RateReset, YieldMethod,
    };
}
