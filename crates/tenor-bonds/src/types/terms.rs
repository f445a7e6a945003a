//! The bond terms record.

use serde::{Deserialize, Serialize};

use tenor_core::calendars::{BusinessDayConvention, HolidayCalendar};
use tenor_core::daycounts::DayCountConvention;
use tenor_core::types::{Currency, Date, Frequency};

use super::{AmortizationSchedule, CallPeriod, ConversionTerms, FloatingTerms, PutPeriod};
use crate::cashflows::Schedule;

/// How unadjusted coupon dates pick their day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CycleRule {
    /// Keep the day of the generation anchor (maturity, last or first coupon).
    #[default]
    Anchor,
    /// Always the last day of the month.
    EndOfMonth,
    /// A fixed day, clamped to the month length.
    DayOfMonth(u32),
}

/// Stub placement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CashflowFlags {
    /// Generate forward from the effective date, leaving the stub at the end.
    pub stub_at_end: bool,
    /// Merge a stub into its neighbouring regular period.
    pub long_stub: bool,
    /// Keep user first/last coupon dates even when they are off-cycle.
    pub respect_all_user_dates: bool,
}

/// Ex-dividend lead time before each coupon payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExDividendRule {
    /// Lead days.
    pub days: u32,
    /// Count business days rather than calendar days.
    pub business_days: bool,
}

/// Delay between the unadjusted period end and the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLag {
    /// Lag in days.
    pub days: u32,
    /// Count business days rather than calendar days.
    pub business_days: bool,
}

/// A coupon rate change effective for periods starting on or after `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouponStep {
    /// First accrual start the rate applies to.
    pub date: Date,
    /// Annual coupon rate (0.05 = 5%).
    pub rate: f64,
}

/// Market sector; selects the yield convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BondType {
    /// US Treasury note/bond.
    UsTreasury,
    /// US corporate bond.
    #[default]
    UsCorporate,
    /// US Treasury bill.
    UsTBill,
    /// UK gilt.
    UkGilt,
    /// Euro-area government bond.
    EuroGovt,
    /// Italian government bond (BTP).
    ItlGovt,
    /// Any other bond, compounded at its coupon frequency.
    Generic,
}

/// How price and yield are related.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldMethod {
    /// Compounded at the coupon frequency.
    Street {
        /// Use simple interest when one period or less remains.
        simple_final_period: bool,
    },
    /// Effective annual yield regardless of coupon frequency.
    AnnualCompounding,
    /// Money-market discount rate on an ACT/360 basis.
    DiscountBasis,
}

impl BondType {
    /// Yield convention of the sector.
    #[must_use]
    pub const fn yield_method(&self) -> YieldMethod {
        match self {
            BondType::UsTreasury | BondType::UsCorporate => YieldMethod::Street {
                simple_final_period: true,
            },
            BondType::UkGilt | BondType::EuroGovt | BondType::Generic => YieldMethod::Street {
                simple_final_period: false,
            },
            BondType::ItlGovt => YieldMethod::AnnualCompounding,
            BondType::UsTBill => YieldMethod::DiscountBasis,
        }
    }

    /// Every sector.
    pub const ALL: [BondType; 7] = [
        BondType::UsTreasury,
        BondType::UsCorporate,
        BondType::UsTBill,
        BondType::UkGilt,
        BondType::EuroGovt,
        BondType::ItlGovt,
        BondType::Generic,
    ];
}

/// Contractual terms of a bond.
///
/// Optional features are plain fields: an empty call schedule means the
/// bond is not callable, `floating: None` means a fixed coupon, and so on.
/// Amounts are per `face` (100 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Interest accrual start.
    pub effective_date: Date,
    /// Final redemption date.
    pub maturity: Date,
    /// Settlement currency.
    pub currency: Currency,
    /// Annual coupon rate (0.05 = 5%). Ignored for floaters.
    pub coupon_rate: f64,
    /// Accrual day count.
    pub day_count: DayCountConvention,
    /// Coupon frequency.
    pub frequency: Frequency,
    /// Day-of-month rule for generated dates.
    pub cycle_rule: CycleRule,
    /// Payment date rolling.
    pub business_day_convention: BusinessDayConvention,
    /// Payment calendar.
    pub calendar: HolidayCalendar,
    /// First regular coupon date override.
    pub first_coupon: Option<Date>,
    /// Penultimate coupon date override.
    pub last_coupon: Option<Date>,
    /// Stub placement.
    pub flags: CashflowFlags,
    /// Ex-dividend rule.
    pub ex_dividend: Option<ExDividendRule>,
    /// Payment lag.
    pub payment_lag: Option<PaymentLag>,
    /// Principal amortization.
    pub amortization: AmortizationSchedule,
    /// Step-up/step-down coupon changes.
    pub coupon_schedule: Vec<CouponStep>,
    /// Floating index terms.
    pub floating: Option<FloatingTerms>,
    /// Issuer call periods.
    pub calls: Vec<CallPeriod>,
    /// Holder put periods.
    pub puts: Vec<PutPeriod>,
    /// Conversion into equity.
    pub conversion: Option<ConversionTerms>,
    /// Externally supplied schedule that replaces generation.
    pub custom_schedule: Option<Schedule>,
    /// Market sector.
    pub bond_type: BondType,
    /// Face amount flows are expressed in.
    pub face: f64,
    /// Final redemption in percent of outstanding notional.
    pub redemption: f64,
    /// Issuer default date, after which the bond is valued at zero.
    pub default_date: Option<Date>,
}

impl BondTerms {
    /// A plain fixed-coupon bullet on a weekend-only calendar.
    #[must_use]
    pub fn fixed(
        effective_date: Date,
        maturity: Date,
        coupon_rate: f64,
        frequency: Frequency,
        day_count: DayCountConvention,
    ) -> Self {
        Self {
            effective_date,
            maturity,
            currency: Currency::default(),
            coupon_rate,
            day_count,
            frequency,
            cycle_rule: CycleRule::Anchor,
            business_day_convention: BusinessDayConvention::Following,
            calendar: HolidayCalendar::weekends_only(),
            first_coupon: None,
            last_coupon: None,
            flags: CashflowFlags::default(),
            ex_dividend: None,
            payment_lag: None,
            amortization: AmortizationSchedule::default(),
            coupon_schedule: Vec::new(),
            floating: None,
            calls: Vec::new(),
            puts: Vec::new(),
            conversion: None,
            custom_schedule: None,
            bond_type: BondType::default(),
            face: 100.0,
            redemption: 100.0,
            default_date: None,
        }
    }

    /// A zero-coupon bond.
    #[must_use]
    pub fn zero_coupon(effective_date: Date, maturity: Date, day_count: DayCountConvention) -> Self {
        Self::fixed(effective_date, maturity, 0.0, Frequency::Zero, day_count)
    }

    /// Sets the currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Sets the cycle rule.
    pub fn with_cycle_rule(mut self, rule: CycleRule) -> Self {
        self.cycle_rule = rule;
        self
    }

    /// Sets the business-day convention.
    pub fn with_business_day_convention(mut self, bdc: BusinessDayConvention) -> Self {
        self.business_day_convention = bdc;
        self
    }

    /// Sets the payment calendar.
    pub fn with_calendar(mut self, calendar: HolidayCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the first regular coupon date.
    pub fn with_first_coupon(mut self, date: Date) -> Self {
        self.first_coupon = Some(date);
        self
    }

    /// Sets the penultimate coupon date.
    pub fn with_last_coupon(mut self, date: Date) -> Self {
        self.last_coupon = Some(date);
        self
    }

    /// Sets the stub flags.
    pub fn with_flags(mut self, flags: CashflowFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets an ex-dividend rule.
    pub fn with_ex_dividend(mut self, days: u32, business_days: bool) -> Self {
        self.ex_dividend = Some(ExDividendRule { days, business_days });
        self
    }

    /// Sets a payment lag.
    pub fn with_payment_lag(mut self, days: u32, business_days: bool) -> Self {
        self.payment_lag = Some(PaymentLag { days, business_days });
        self
    }

    /// Sets the amortization schedule.
    pub fn with_amortization(mut self, schedule: AmortizationSchedule) -> Self {
        self.amortization = schedule;
        self
    }

    /// Adds a coupon step.
    pub fn with_coupon_step(mut self, date: Date, rate: f64) -> Self {
        self.coupon_schedule.push(CouponStep { date, rate });
        self
    }

    /// Makes the bond a floater.
    pub fn with_floating(mut self, floating: FloatingTerms) -> Self {
        self.floating = Some(floating);
        self
    }

    /// Adds a call period.
    pub fn with_call(mut self, call: CallPeriod) -> Self {
        self.calls.push(call);
        self
    }

    /// Adds a put period.
    pub fn with_put(mut self, put: PutPeriod) -> Self {
        self.puts.push(put);
        self
    }

    /// Adds conversion terms.
    pub fn with_conversion(mut self, conversion: ConversionTerms) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Replaces schedule generation with an explicit schedule.
    pub fn with_custom_schedule(mut self, schedule: Schedule) -> Self {
        self.custom_schedule = Some(schedule);
        self
    }

    /// Sets the market sector.
    pub fn with_bond_type(mut self, bond_type: BondType) -> Self {
        self.bond_type = bond_type;
        self
    }

    /// Sets the final redemption percentage.
    pub fn with_redemption(mut self, redemption: f64) -> Self {
        self.redemption = redemption;
        self
    }

    /// Marks the issuer as defaulted from `date`.
    pub fn with_default_date(mut self, date: Date) -> Self {
        self.default_date = Some(date);
        self
    }

    /// True for convertibles.
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        self.conversion.is_some()
    }

    /// True for floaters.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.floating.is_some()
    }

    /// Fixed coupon rate for a period starting at `accrual_start`.
    #[must_use]
    pub fn fixed_rate_for(&self, accrual_start: Date) -> f64 {
        self.coupon_schedule
            .iter()
            .rev()
            .find(|step| step.date <= accrual_start)
            .map_or(self.coupon_rate, |step| step.rate)
    }

    /// True if `date` is on or after maturity or the default date.
    #[must_use]
    pub fn is_dead(&self, date: Date) -> bool {
        date >= self.maturity || self.default_date.is_some_and(|d| date >= d)
    }
}
