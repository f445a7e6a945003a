//! # Tenor Core
//!
//! Calendar and convention primitives shared by every Tenor crate:
//!
//! - **Types**: [`Date`](types::Date), [`Frequency`](types::Frequency), [`Currency`](types::Currency)
//! - **Day counts**: exact `Decimal` year fractions for the ACT and 30/360 families
//! - **Calendars**: business-day rolling and business-day arithmetic
//!
//! ## Example
//!
//! ```rust
//! use tenor_core::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//! let yf = DayCountConvention::Thirty360US.year_fraction(start, end);
//! assert_eq!(yf, dec!(0.5));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::trivially_copy_pass_by_ref)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{BusinessDayConvention, Calendar, HolidayCalendar};
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{TenorError, TenorResult};
    pub use crate::types::{Currency, Date, Frequency};
}

pub use error::{TenorError, TenorResult};
pub use types::{Currency, Date, Frequency};
