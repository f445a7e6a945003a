//! Interest and principal projection with notional bookkeeping.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use tenor_core::daycounts::DayCount;
use tenor_core::types::Date;
use tenor_curves::DiscountCurve;

use super::schedule::{payment_date, Period, Schedule};
use crate::error::{BondError, BondResult};
use crate::types::{AmortizationEntry, BondTerms};

/// What a projected flow pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashflowKind {
    /// Coupon only.
    Coupon,
    /// Principal only, from an amortization inside a period.
    Principal,
    /// Coupon plus an amortization on the coupon date.
    CouponAndPrincipal,
    /// Final coupon plus redemption of the outstanding notional.
    Redemption,
}

/// One projected payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondCashflow {
    /// Payment date.
    pub pay_date: Date,
    /// Accrual start of the interest in this flow.
    pub accrual_start: Date,
    /// Accrual end of the interest in this flow.
    pub accrual_end: Date,
    /// Annual coupon rate applied.
    pub coupon_rate: f64,
    /// Interest amount.
    pub coupon_amount: f64,
    /// Outstanding notional before the flow.
    pub notional_before: f64,
    /// Outstanding notional after the flow.
    pub notional_after: f64,
    /// Principal repaid.
    pub principal_exchange: f64,
    /// Redemption above par on the final principal.
    pub redemption_premium: f64,
    /// Flow type.
    pub kind: CashflowKind,
    /// Index of the schedule period the flow belongs to.
    pub period_index: usize,
}

impl BondCashflow {
    /// Total amount paid.
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.coupon_amount + self.principal_exchange + self.redemption_premium
    }
}

/// Projects the flows of a bond over its schedule.
///
/// # Example
///
/// ```rust
/// use tenor_bonds::prelude::*;
/// use tenor_core::prelude::*;
///
/// let terms = BondTerms::fixed(
///     Date::from_ymd(2025, 1, 15).unwrap(),
///     Date::from_ymd(2027, 1, 15).unwrap(),
///     0.04,
///     Frequency::SemiAnnual,
///     DayCountConvention::Thirty360US,
/// );
/// let schedule = build_schedule(&terms).unwrap();
/// let flows = CashflowProjector::new(&terms, &schedule).project().unwrap();
/// assert_eq!(flows.len(), 4);
/// assert!((flows[3].amount() - 102.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy)]
pub struct CashflowProjector<'a> {
    terms: &'a BondTerms,
    schedule: &'a Schedule,
    settle: Option<Date>,
    forward_curve: Option<&'a dyn DiscountCurve>,
}

impl<'a> CashflowProjector<'a> {
    /// Creates a projector for `terms` over `schedule`.
    #[must_use]
    pub fn new(terms: &'a BondTerms, schedule: &'a Schedule) -> Self {
        Self {
            terms,
            schedule,
            settle: None,
            forward_curve: None,
        }
    }

    /// Sets the settlement date that splits fixed and projected floating periods.
    #[must_use]
    pub fn with_settle(mut self, settle: Date) -> Self {
        self.settle = Some(settle);
        self
    }

    /// Sets the curve future floating coupons are projected from.
    #[must_use]
    pub fn with_forward_curve(mut self, curve: &'a dyn DiscountCurve) -> Self {
        self.forward_curve = Some(curve);
        self
    }

    /// Projects all flows in payment order.
    pub fn project(&self) -> BondResult<Vec<BondCashflow>> {
        let terms = self.terms;
        let settle = self.settle.unwrap_or(terms.effective_date);
        if let Some(floating) = &terms.floating {
            if let Some(late) = floating.resets.iter().find(|r| r.date > settle) {
                return Err(BondError::validation(format!(
                    "rate reset on {} is after settlement {settle}",
                    late.date
                )));
            }
        }

        let initial = terms.face;
        let last_index = self.schedule.len().saturating_sub(1);
        let mut outstanding = initial;
        let mut flows = Vec::with_capacity(self.schedule.len());

        for (index, period) in self.schedule.iter().enumerate() {
            if outstanding <= 0.0 {
                break;
            }
            let rate = period_rate(terms, period, settle, self.forward_curve)?;
            let mut segment_start = period.accrual_start;
            let mut coupon = 0.0;
            let mut split = false;

            for entry in entries_between(terms, period.accrual_start, period.accrual_end) {
                let date = entry.date();
                let after = apply_entry(entry, outstanding, initial);
                coupon += outstanding * rate * fraction(terms, period, segment_start, date);
                split = true;
                if after < outstanding {
                    flows.push(BondCashflow {
                        pay_date: payment_date(terms, date),
                        accrual_start: segment_start,
                        accrual_end: date,
                        coupon_rate: rate,
                        coupon_amount: 0.0,
                        notional_before: outstanding,
                        notional_after: after,
                        principal_exchange: outstanding - after,
                        redemption_premium: 0.0,
                        kind: CashflowKind::Principal,
                        period_index: index,
                    });
                    outstanding = after;
                }
                segment_start = date;
            }

            coupon += if split || !uses_regular_coupon(terms, period) {
                outstanding * rate * fraction(terms, period, segment_start, period.accrual_end)
            } else {
                outstanding * rate / f64::from(terms.frequency.periods_per_year())
            };

            let before = outstanding;
            let mut after = terms
                .amortization
                .entries()
                .iter()
                .filter(|e| e.date() == period.accrual_end)
                .fold(before, |n, e| apply_entry(e, n, initial));
            let is_final = index == last_index;
            if is_final {
                after = 0.0;
            }
            let principal = before - after;
            let kind = match (is_final, principal != 0.0) {
                (true, _) => CashflowKind::Redemption,
                (false, true) => CashflowKind::CouponAndPrincipal,
                (false, false) => CashflowKind::Coupon,
            };
            let redemption_premium = if is_final {
                principal * (terms.redemption / 100.0 - 1.0)
            } else {
                0.0
            };
            if coupon != 0.0 || principal != 0.0 || is_final {
                flows.push(BondCashflow {
                    pay_date: period.payment_date,
                    accrual_start: period.accrual_start,
                    accrual_end: period.accrual_end,
                    coupon_rate: rate,
                    coupon_amount: coupon,
                    notional_before: before,
                    notional_after: after,
                    principal_exchange: principal,
                    redemption_premium,
                    kind,
                    period_index: index,
                });
            }
            outstanding = after;
        }
        Ok(flows)
    }
}

/// Coupon rate of `period`.
///
/// Fixed bonds use the coupon-rate schedule. Floaters use the reset on or
/// before the period start for periods that have started by `settle`, the
/// stub or current rate when there is no such reset, and the curve's simple
/// forward (current rate without a curve) for later periods.
pub(crate) fn period_rate(
    terms: &BondTerms,
    period: &Period,
    settle: Date,
    curve: Option<&dyn DiscountCurve>,
) -> BondResult<f64> {
    let Some(floating) = &terms.floating else {
        return Ok(terms.fixed_rate_for(period.accrual_start));
    };
    let margin = floating.margin;
    let current = || {
        floating
            .current_rate
            .map(|r| r + margin)
            .ok_or_else(|| BondError::missing_field("floating.current_rate"))
    };

    if period.accrual_start <= settle {
        if let Some(fixing) = floating.fixing_for(period.accrual_start) {
            return Ok(fixing + margin);
        }
        if period.contains(settle) {
            if let Some(stub) = floating.stub_rate {
                return Ok(stub);
            }
        }
        return current();
    }

    match curve {
        Some(curve) => {
            let tau = terms
                .day_count
                .year_fraction(period.accrual_start, period.accrual_end)
                .to_f64()
                .unwrap_or(0.0);
            if tau <= 0.0 {
                return current();
            }
            let growth = curve.discount_factor(period.accrual_start)
                / curve.discount_factor(period.accrual_end);
            Ok((growth - 1.0) / tau + margin)
        }
        None => current(),
    }
}

/// Outstanding notional on each piece of `period` split at amortization dates.
pub(crate) fn notional_segments(terms: &BondTerms, period: &Period) -> Vec<(Date, Date, f64)> {
    let initial = terms.face;
    let mut outstanding = terms.amortization.outstanding_on(initial, period.accrual_start);
    let mut start = period.accrual_start;
    let mut segments = Vec::new();
    for entry in entries_between(terms, period.accrual_start, period.accrual_end) {
        segments.push((start, entry.date(), outstanding));
        outstanding = apply_entry(entry, outstanding, initial);
        start = entry.date();
    }
    segments.push((start, period.accrual_end, outstanding));
    segments
}

/// Day-count fraction of `[from, to]` within `period` as `f64`.
pub(crate) fn fraction(terms: &BondTerms, period: &Period, from: Date, to: Date) -> f64 {
    period
        .accrual_fraction(from, to, terms.day_count, terms.frequency)
        .to_f64()
        .unwrap_or(0.0)
}

fn uses_regular_coupon(terms: &BondTerms, period: &Period) -> bool {
    terms.floating.is_none() && !terms.frequency.is_zero() && period.is_regular()
}

fn entries_between(
    terms: &BondTerms,
    start: Date,
    end: Date,
) -> impl Iterator<Item = &AmortizationEntry> {
    terms
        .amortization
        .entries()
        .iter()
        .filter(move |e| e.date() > start && e.date() < end)
}

fn apply_entry(entry: &AmortizationEntry, outstanding: f64, initial: f64) -> f64 {
    let next = match *entry {
        AmortizationEntry::RemainingNotional { notional, .. } => notional,
        AmortizationEntry::PercentOfInitial { percent, .. } => outstanding - initial * percent / 100.0,
    };
    next.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflows::build_schedule;
    use crate::types::{AmortizationSchedule, FloatingTerms};
    use approx::assert_relative_eq;
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn bullet() -> BondTerms {
        BondTerms::fixed(d(2025, 1, 15), d(2028, 1, 15), 0.06, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
    }

    fn project(terms: &BondTerms) -> Vec<BondCashflow> {
        let schedule = build_schedule(terms).unwrap();
        CashflowProjector::new(terms, &schedule).project().unwrap()
    }

    fn assert_notional_identity(flows: &[BondCashflow]) {
        for f in flows {
            assert_eq!(f.notional_before - f.notional_after, f.principal_exchange);
        }
        for w in flows.windows(2) {
            assert_eq!(w[0].notional_after, w[1].notional_before);
        }
    }

    #[test]
    fn bullet_flows() {
        let flows = project(&bullet());
        assert_eq!(flows.len(), 6);
        assert!(flows[..5].iter().all(|f| f.kind == CashflowKind::Coupon));
        assert_relative_eq!(flows[0].coupon_amount, 3.0);
        assert_eq!(flows[5].kind, CashflowKind::Redemption);
        assert_relative_eq!(flows[5].amount(), 103.0);
        assert_notional_identity(&flows);
    }

    #[test]
    fn step_up_coupons() {
        let flows = project(&bullet().with_coupon_step(d(2026, 1, 15), 0.08));
        assert_relative_eq!(flows[1].coupon_amount, 3.0);
        assert_relative_eq!(flows[2].coupon_amount, 4.0);
    }

    #[test]
    fn amortization_on_coupon_dates_rides_on_the_coupon() {
        let schedule = AmortizationSchedule::sinking_fund(&[d(2026, 1, 15), d(2027, 1, 15)], 25.0);
        let flows = project(&bullet().with_amortization(schedule));
        assert_eq!(flows.len(), 6);
        assert_eq!(flows[1].kind, CashflowKind::CouponAndPrincipal);
        assert_relative_eq!(flows[1].principal_exchange, 25.0);
        assert_relative_eq!(flows[2].coupon_amount, 75.0 * 0.03);
        assert_relative_eq!(flows[5].principal_exchange, 50.0);
        assert_notional_identity(&flows);
    }

    #[test]
    fn mid_period_amortization_splits_the_coupon() {
        let schedule = AmortizationSchedule::new(vec![AmortizationEntry::RemainingNotional {
            date: d(2025, 4, 15),
            notional: 60.0,
        }]);
        let flows = project(&bullet().with_amortization(schedule));
        assert_eq!(flows[0].kind, CashflowKind::Principal);
        assert_relative_eq!(flows[0].principal_exchange, 40.0);
        // 90 days on 100 then 90 days on 60, at 6% 30/360.
        assert_relative_eq!(flows[1].coupon_amount, 100.0 * 0.06 * 0.25 + 60.0 * 0.06 * 0.25, epsilon = 1e-12);
        assert_notional_identity(&flows);
    }

    #[test]
    fn flows_stop_when_notional_is_exhausted() {
        let schedule = AmortizationSchedule::new(vec![AmortizationEntry::RemainingNotional {
            date: d(2026, 1, 15),
            notional: 0.0,
        }]);
        let flows = project(&bullet().with_amortization(schedule));
        assert_eq!(flows.len(), 2);
        assert_relative_eq!(flows[1].principal_exchange, 100.0);
        assert_notional_identity(&flows);
    }

    #[test]
    fn redemption_premium() {
        let flows = project(&bullet().with_redemption(102.0));
        assert_relative_eq!(flows[5].redemption_premium, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn floating_rates_follow_resets_then_forwards() {
        let floating = FloatingTerms::new("SOFR", 0.01)
            .with_current_rate(0.04)
            .with_reset(d(2025, 1, 15), 0.035);
        let terms = bullet().with_floating(floating);
        let schedule = build_schedule(&terms).unwrap();
        let curve = FlatCurve::new(d(2025, 3, 1), 0.05);
        let flows = CashflowProjector::new(&terms, &schedule)
            .with_settle(d(2025, 3, 1))
            .with_forward_curve(&curve)
            .project()
            .unwrap();
        assert_relative_eq!(flows[0].coupon_rate, 0.045);
        assert!(flows[1].coupon_rate > 0.055 && flows[1].coupon_rate < 0.065);

        let flat = CashflowProjector::new(&terms, &schedule)
            .with_settle(d(2025, 3, 1))
            .project()
            .unwrap();
        assert_relative_eq!(flat[1].coupon_rate, 0.05);
    }

    #[test]
    fn stub_rate_applies_to_current_period_only() {
        let floating = FloatingTerms::new("SOFR", 0.01).with_current_rate(0.04).with_stub_rate(0.052);
        let terms = bullet().with_floating(floating);
        let schedule = build_schedule(&terms).unwrap();
        let flows = CashflowProjector::new(&terms, &schedule)
            .with_settle(d(2025, 3, 1))
            .project()
            .unwrap();
        assert_relative_eq!(flows[0].coupon_rate, 0.052);
        assert_relative_eq!(flows[1].coupon_rate, 0.05);
    }

    #[test]
    fn floating_errors() {
        let missing = bullet().with_floating(FloatingTerms::new("SOFR", 0.01));
        let schedule = build_schedule(&missing).unwrap();
        let err = CashflowProjector::new(&missing, &schedule).project().unwrap_err();
        assert!(matches!(err, BondError::MissingField { .. }));

        let late = bullet().with_floating(FloatingTerms::new("SOFR", 0.0).with_current_rate(0.04).with_reset(d(2025, 7, 15), 0.04));
        let err = CashflowProjector::new(&late, &schedule)
            .with_settle(d(2025, 3, 1))
            .project()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn zero_coupon_single_flow() {
        let terms = BondTerms::zero_coupon(d(2025, 1, 15), d(2030, 1, 15), DayCountConvention::Act365Fixed);
        let flows = project(&terms);
        assert_eq!(flows.len(), 1);
        assert_relative_eq!(flows[0].amount(), 100.0);
    }
}
