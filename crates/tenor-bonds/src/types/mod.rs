//! Contractual bond data.

mod amortization;
mod conversion;
mod floating;
mod options;
mod terms;

pub use amortization::{AmortizationEntry, AmortizationSchedule};
pub use conversion::ConversionTerms;
pub use floating::{FloatingTerms, RateReset};
pub use options::{CallPeriod, CallTrigger, ExercisePeriod, OptionStyle, PutPeriod};
pub use terms::{
    BondTerms, BondType, CashflowFlags, CouponStep, CycleRule, ExDividendRule, PaymentLag,
    YieldMethod,
};
