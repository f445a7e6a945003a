//! Discounting of projected flows on a curve, with optional credit.
//!
//! Every flow is discounted from the pricing settle date. The credit price
//! adds survival weighting and a recovery leg paid at default on the
//! outstanding notional:
//!
//! ```text
//! P = Σ CF_i · Z_i · e^{-s t_i} · Q(t_i) + R · Σ_k N_k · Z_k · e^{-s t_k} · (Q(t_{k-1}) - Q(t_k))
//! ```
//!
//! where the second sum runs over a sub-monthly default grid.

use rust_decimal::prelude::ToPrimitive;

use tenor_bonds::cashflows::{BondCashflow, CashflowKind};
use tenor_bonds::types::BondTerms;
use tenor_bonds::Bond;
use tenor_core::daycounts::DayCount;
use tenor_core::types::Date;
use tenor_curves::{time_from, DiscountCurve, SurvivalCurve};

use crate::context::{MarketQuote, PricingContext};
use crate::error::AnalyticsResult;
use crate::yields::YieldSolver;

const DEFAULT_STEPS_PER_YEAR: f64 = 24.0;

/// A flow with its time and risk-free discount factor from settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedFlow {
    /// The projected flow.
    pub cashflow: BondCashflow,
    /// Years from settle (ACT/365).
    pub time: f64,
    /// Discount factor from settle to the payment date.
    pub discount_factor: f64,
    /// Coupon accrual year fraction from settle; zero for principal-only flows.
    pub accrual_years: f64,
}

impl TimedFlow {
    /// Total amount of the flow.
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.cashflow.amount()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DefaultInterval {
    start: f64,
    end: f64,
    mid_discount_factor: f64,
    notional: f64,
}

/// Entitled flows of a bond timed and discounted from settle.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountedFlows {
    settle: Date,
    flows: Vec<TimedFlow>,
    default_grid: Vec<DefaultInterval>,
}

/// Flows projected at the pricing settle and filtered to the buyer's entitlement.
pub fn projected_flows(bond: &Bond, ctx: &PricingContext) -> AnalyticsResult<Vec<BondCashflow>> {
    let flows = bond
        .projector()
        .with_settle(ctx.settle)
        .with_forward_curve(ctx.discount_curve.as_ref())
        .project()?;
    Ok(bond.entitled_cashflows(&flows, ctx.entitlement_date()))
}

/// Dirty price implied by the context's market quote, if any.
///
/// Clean prices add accrued interest at the entitlement date; yields are
/// converted with the bond's yield convention.
pub fn market_dirty_price(bond: &Bond, ctx: &PricingContext) -> AnalyticsResult<Option<f64>> {
    let Some(quote) = ctx.quote else {
        return Ok(None);
    };
    let dirty = match quote {
        MarketQuote::DirtyPrice(p) => p,
        MarketQuote::CleanPrice(p) => p + bond.accrued_interest(ctx.entitlement_date()).amount,
        MarketQuote::Yield(y) => YieldSolver::new(bond, ctx)?.price_from_yield(y),
    };
    Ok(Some(dirty))
}

impl DiscountedFlows {
    /// Projects, filters and discounts the flows of `bond`.
    pub fn new(bond: &Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        let flows = projected_flows(bond, ctx)?;
        Ok(Self::from_cashflows(
            &flows,
            ctx.settle,
            ctx.discount_curve.as_ref(),
            bond.terms(),
        ))
    }

    /// Discounts explicit flows.
    #[must_use]
    pub fn from_cashflows(
        cashflows: &[BondCashflow],
        settle: Date,
        curve: &dyn DiscountCurve,
        terms: &BondTerms,
    ) -> Self {
        let base = curve.time(settle);
        let df_base = curve.discount_factor_at(base);
        let flows: Vec<TimedFlow> = cashflows
            .iter()
            .map(|cf| {
                let time = time_from(settle, cf.pay_date);
                let accrual_years = if cf.kind == CashflowKind::Principal {
                    0.0
                } else {
                    terms
                        .day_count
                        .year_fraction(cf.accrual_start.max(settle), cf.accrual_end)
                        .to_f64()
                        .unwrap_or(0.0)
                };
                TimedFlow {
                    cashflow: *cf,
                    time,
                    discount_factor: curve.discount_factor_at(base + time) / df_base,
                    accrual_years,
                }
            })
            .collect();

        let mut default_grid = Vec::new();
        let mut previous = 0.0_f64;
        for flow in &flows {
            let span = flow.time - previous;
            if span <= 0.0 {
                continue;
            }
            let pieces = (span * DEFAULT_STEPS_PER_YEAR).ceil().max(1.0) as usize;
            let width = span / pieces as f64;
            for k in 0..pieces {
                let start = previous + k as f64 * width;
                let end = start + width;
                let mid = 0.5 * (start + end);
                default_grid.push(DefaultInterval {
                    start,
                    end,
                    mid_discount_factor: curve.discount_factor_at(base + mid) / df_base,
                    notional: flow.cashflow.notional_before,
                });
            }
            previous = flow.time;
        }

        Self {
            settle,
            flows,
            default_grid,
        }
    }

    /// Pricing settle date.
    #[must_use]
    pub fn settle(&self) -> Date {
        self.settle
    }

    /// The timed flows.
    #[must_use]
    pub fn flows(&self) -> &[TimedFlow] {
        &self.flows
    }

    /// True if no flows remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Risk-free dirty price.
    #[must_use]
    pub fn price(&self) -> f64 {
        self.price_with_spread(0.0)
    }

    /// Dirty price with a continuous spread over the curve.
    #[must_use]
    pub fn price_with_spread(&self, spread: f64) -> f64 {
        self.flows
            .iter()
            .map(|f| f.amount() * f.discount_factor * (-spread * f.time).exp())
            .sum()
    }

    /// Dirty price with spread, survival weighting and recovery at default.
    ///
    /// `survival` maps years from settle to the conditional survival
    /// probability, with `survival(0) = 1`.
    pub fn credit_price<Q>(&self, spread: f64, survival: Q, recovery: f64) -> f64
    where
        Q: Fn(f64) -> f64,
    {
        let survival_leg: f64 = self
            .flows
            .iter()
            .map(|f| f.amount() * f.discount_factor * (-spread * f.time).exp() * survival(f.time))
            .sum();
        let recovery_leg: f64 = self
            .default_grid
            .iter()
            .map(|i| {
                let mid = 0.5 * (i.start + i.end);
                i.notional
                    * i.mid_discount_factor
                    * (-spread * mid).exp()
                    * (survival(i.start) - survival(i.end))
            })
            .sum();
        survival_leg + recovery * recovery_leg
    }

    /// Coupon annuity `Σ τ · N · Z`, with `N` in price units.
    #[must_use]
    pub fn annuity(&self) -> f64 {
        self.flows
            .iter()
            .map(|f| f.accrual_years * f.cashflow.notional_before * f.discount_factor)
            .sum()
    }

    /// Premium-leg annuity `∫ N(t) · Z(t) · Q(t) dt` on the default grid.
    pub fn risky_duration<Q>(&self, survival: Q) -> f64
    where
        Q: Fn(f64) -> f64,
    {
        self.default_grid
            .iter()
            .map(|i| {
                let mid = 0.5 * (i.start + i.end);
                (i.end - i.start) * i.notional * i.mid_discount_factor * survival(mid)
            })
            .sum()
    }
}

/// Survival from `settle` to `settle + t` under `curve`.
pub fn conditional_survival(curve: &dyn SurvivalCurve, settle: Date) -> impl Fn(f64) -> f64 + '_ {
    let base = time_from(curve.reference_date(), settle);
    let q_base = curve.survival_probability_at(base);
    move |t: f64| {
        if q_base > 0.0 {
            curve.survival_probability_at(base + t) / q_base
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use tenor_bonds::types::BondTerms;
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn setup() -> (Bond, PricingContext) {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2030, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US);
        let settle = d(2025, 1, 15);
        (
            Bond::new(terms).unwrap(),
            PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.04))),
        )
    }

    #[test]
    fn zero_coupon_on_flat_curve() {
        let terms = BondTerms::zero_coupon(d(2025, 1, 15), d(2030, 1, 15), DayCountConvention::Act365Fixed);
        let (_, ctx) = setup();
        let flows = DiscountedFlows::new(&Bond::new(terms).unwrap(), &ctx).unwrap();
        let t: f64 = 1826.0 / 365.0;
        assert_relative_eq!(flows.price(), 100.0 * (-0.04 * t).exp(), epsilon = 1e-10);
        assert_relative_eq!(flows.price_with_spread(0.01), 100.0 * (-0.05 * t).exp(), epsilon = 1e-10);
    }

    #[test]
    fn credit_price_without_default_is_risk_free() {
        let (bond, ctx) = setup();
        let flows = DiscountedFlows::new(&bond, &ctx).unwrap();
        assert_relative_eq!(flows.credit_price(0.0, |_| 1.0, 0.4), flows.price(), epsilon = 1e-12);
        let risky = flows.credit_price(0.0, |t| (-0.02 * t).exp(), 0.4);
        assert!(risky < flows.price());
        assert!(risky > flows.credit_price(0.0, |t| (-0.02 * t).exp(), 0.0));
    }

    #[test]
    fn annuity_of_bullet() {
        let (bond, ctx) = setup();
        let flows = DiscountedFlows::new(&bond, &ctx).unwrap();
        let manual: f64 = flows.flows().iter().map(|f| 0.5 * 100.0 * f.discount_factor).sum();
        assert_relative_eq!(flows.annuity(), manual, epsilon = 1e-10);
    }

    #[test]
    fn risky_duration_of_zero_coupon() {
        let terms = BondTerms::zero_coupon(d(2025, 1, 15), d(2030, 1, 15), DayCountConvention::Act365Fixed);
        let (_, ctx) = setup();
        let flows = DiscountedFlows::new(&Bond::new(terms).unwrap(), &ctx).unwrap();
        let t: f64 = 1826.0 / 365.0;
        let exact = 100.0 * (1.0 - (-0.04 * t).exp()) / 0.04;
        assert_relative_eq!(flows.risky_duration(|_| 1.0), exact, max_relative = 1e-4);
    }

    #[test]
    fn conditional_survival_rebases() {
        let curve = tenor_curves::FlatHazardCurve::new(d(2025, 1, 15), 0.02, 0.4).unwrap();
        let q = conditional_survival(&curve, d(2026, 1, 15));
        assert_relative_eq!(q(0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q(2.0), (-0.04_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn quotes_convert_to_dirty() {
        let (bond, ctx) = setup();
        let mid = PricingContext::new(d(2025, 4, 15), ctx.discount_curve.clone());
        assert_eq!(market_dirty_price(&bond, &mid).unwrap(), None);
        let clean = market_dirty_price(&bond, &mid.clone().with_quote(MarketQuote::CleanPrice(99.0))).unwrap();
        assert_relative_eq!(clean.unwrap(), 99.0 + 1.25, epsilon = 1e-12);
        let par = market_dirty_price(&bond, &ctx.clone().with_quote(MarketQuote::Yield(0.05))).unwrap();
        assert_relative_eq!(par.unwrap(), 100.0, epsilon = 1e-10);
    }

    #[test]
    fn settle_on_coupon_excludes_that_coupon() {
        let (bond, ctx) = setup();
        let flows = DiscountedFlows::new(&bond, &ctx.clone()).unwrap();
        assert_eq!(flows.flows().len(), 10);
        let later = PricingContext { settle: d(2025, 7, 15), ..ctx };
        assert_eq!(DiscountedFlows::new(&bond, &later).unwrap().flows().len(), 9);
    }
}
