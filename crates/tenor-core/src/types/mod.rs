//! Core value types.

mod currency;
mod date;
mod frequency;

pub use currency::Currency;
pub use date::{days_in_month, Date};
pub use frequency::Frequency;
