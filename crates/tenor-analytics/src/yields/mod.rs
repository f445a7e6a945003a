//! Price/yield conversion for bonds, to maturity and to exercise dates.
//!
//! Yields solve
//!
//! ```text
//! Dirty Price = Σ CF_i / (1 + y/f)^(w + k_i)
//! ```
//!
//! where `w` is the fraction of the current period left at settlement and
//! `k_i` counts whole periods to flow `i`. The sector convention of the bond
//! decides the compounding:
//!
//! - **Street**: compounded at the coupon frequency, with simple interest in
//!   the final period for US markets
//! - **Annual compounding**: `(1 + y)^(-t)` with `t` in years (Italian BTPs)
//! - **Discount basis**: `CF × (1 - y × d/360)` (T-bills)

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use tenor_bonds::cashflows::{BondCashflow, CashflowKind, Period};
use tenor_bonds::types::{ExercisePeriod, YieldMethod};
use tenor_bonds::Bond;
use tenor_core::types::Date;
use tenor_math::solvers::{safeguarded_newton, SolverConfig};

use crate::config::{Bracket, PricingConfig};
use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::pricing::projected_flows;
use crate::solve::SolveOutcome;

const TIE_TOLERANCE: f64 = 1e-12;
const DERIVATIVE_STEP: f64 = 1e-6;

/// A yield to an exercise date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseYield {
    /// Redemption date assumed.
    pub date: Date,
    /// Redemption price in percent of outstanding notional.
    pub strike: f64,
    /// Solved yield.
    pub outcome: SolveOutcome,
}

#[derive(Debug, Clone, Copy)]
struct YieldFlow {
    amount: f64,
    exponent: f64,
    days: i64,
}

/// Converts between dirty price and yield for one bond at one settlement.
///
/// Flows are the ones the buyer is entitled to at `settle`.
#[derive(Debug, Clone)]
pub struct YieldSolver<'a> {
    bond: &'a Bond,
    cashflows: Vec<BondCashflow>,
    settle: Date,
    method: YieldMethod,
    config: SolverConfig,
    bracket: Bracket,
}

impl<'a> YieldSolver<'a> {
    /// Projects the bond's entitled flows under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        let flows = projected_flows(bond, ctx)?;
        Ok(Self::from_cashflows(
            bond,
            flows,
            ctx.entitlement_date(),
            &ctx.config,
        ))
    }

    /// Uses explicit entitled flows.
    #[must_use]
    pub fn from_cashflows(
        bond: &'a Bond,
        cashflows: Vec<BondCashflow>,
        settle: Date,
        config: &PricingConfig,
    ) -> Self {
        Self {
            bond,
            cashflows,
            settle,
            method: bond.terms().bond_type.yield_method(),
            config: config.solver_config(),
            bracket: config.yield_bracket,
        }
    }

    /// Overrides the sector yield convention.
    #[must_use]
    pub fn with_method(mut self, method: YieldMethod) -> Self {
        self.method = method;
        self
    }

    /// The yield convention in use.
    #[must_use]
    pub fn method(&self) -> YieldMethod {
        self.method
    }

    /// Dirty price from a yield to maturity.
    #[must_use]
    pub fn price_from_yield(&self, y: f64) -> f64 {
        self.price(y, &self.timed(&self.cashflows))
    }

    /// Yield to maturity from a dirty price.
    #[must_use]
    pub fn yield_to_maturity(&self, dirty_price: f64) -> SolveOutcome {
        self.solve(dirty_price, &self.timed(&self.cashflows))
    }

    /// Yield to redemption at `strike` on `date`.
    #[must_use]
    pub fn yield_to_exercise(&self, dirty_price: f64, date: Date, strike: f64) -> SolveOutcome {
        if date <= self.settle {
            return SolveOutcome::exact(0.0);
        }
        self.solve(dirty_price, &self.timed(&self.exercise_flows(date, strike)))
    }

    /// Yield to the call on `date`, at the strike of the period covering it.
    #[must_use]
    pub fn yield_to_call(&self, dirty_price: f64, date: Date) -> Option<ExerciseYield> {
        let strike = strike_on(&self.bond.terms().calls, date)?;
        Some(ExerciseYield {
            date,
            strike,
            outcome: self.yield_to_exercise(dirty_price, date, strike),
        })
    }

    /// Yield to the put on `date`, at the strike of the period covering it.
    #[must_use]
    pub fn yield_to_put(&self, dirty_price: f64, date: Date) -> Option<ExerciseYield> {
        let strike = strike_on(&self.bond.terms().puts, date)?;
        Some(ExerciseYield {
            date,
            strike,
            outcome: self.yield_to_exercise(dirty_price, date, strike),
        })
    }

    /// Yield to the first eligible call date.
    #[must_use]
    pub fn yield_to_first_call(&self, dirty_price: f64) -> Option<ExerciseYield> {
        let (date, strike) = self.call_candidates().into_iter().next()?;
        Some(ExerciseYield {
            date,
            strike,
            outcome: self.yield_to_exercise(dirty_price, date, strike),
        })
    }

    /// Yield to the first eligible put date.
    #[must_use]
    pub fn yield_to_first_put(&self, dirty_price: f64) -> Option<ExerciseYield> {
        let puts = &self.bond.terms().puts;
        let (date, strike) = candidates(puts, &self.bond.coupon_dates(), self.settle)
            .into_iter()
            .next()?;
        Some(ExerciseYield {
            date,
            strike,
            outcome: self.yield_to_exercise(dirty_price, date, strike),
        })
    }

    /// Lowest yield over every call candidate date and maturity.
    ///
    /// Make-whole calls are never exercised and are skipped. Among yields
    /// within 1e-12 (or the solver tolerance, if larger) of each other the
    /// earliest date wins.
    #[must_use]
    pub fn yield_to_worst(&self, dirty_price: f64) -> ExerciseYield {
        let maturity = ExerciseYield {
            date: self.bond.terms().maturity,
            strike: self.bond.terms().redemption,
            outcome: self.yield_to_maturity(dirty_price),
        };
        let tie = TIE_TOLERANCE.max(self.config.tolerance);
        let mut best: Option<ExerciseYield> = None;
        let call_yields = self.call_candidates().into_iter().map(|(date, strike)| ExerciseYield {
            date,
            strike,
            outcome: self.yield_to_exercise(dirty_price, date, strike),
        });
        for candidate in call_yields.chain(std::iter::once(maturity)) {
            if !candidate.outcome.is_converged() {
                continue;
            }
            match best {
                Some(b) if candidate.outcome.value >= b.outcome.value - tie => {}
                _ => best = Some(candidate),
            }
        }
        best.unwrap_or(maturity)
    }

    /// Call dates and strikes in date order, make-whole calls excluded.
    #[must_use]
    pub fn call_candidates(&self) -> Vec<(Date, f64)> {
        let calls: Vec<ExercisePeriod> = self
            .bond
            .terms()
            .calls
            .iter()
            .filter(|c| !c.is_make_whole())
            .copied()
            .collect();
        candidates(&calls, &self.bond.coupon_dates(), self.settle)
    }

    /// Flows to an exercise on `date` at `strike`.
    ///
    /// Flows accruing past `date` are dropped. The outstanding notional is
    /// repaid at `strike` percent on `date`, together with the interest
    /// accrued since the last coupon.
    #[must_use]
    pub fn exercise_flows(&self, date: Date, strike: f64) -> Vec<BondCashflow> {
        let mut kept: Vec<BondCashflow> = self
            .cashflows
            .iter()
            .filter(|f| f.accrual_end <= date)
            .copied()
            .collect();
        let Some(next) = self.cashflows.iter().find(|f| f.accrual_end > date) else {
            return kept;
        };
        let outstanding = next.notional_before;
        let premium = outstanding * (strike / 100.0 - 1.0);

        match kept.last_mut() {
            Some(last) if last.accrual_end == date => {
                last.principal_exchange += outstanding;
                last.redemption_premium += premium;
                last.notional_after = 0.0;
                last.kind = CashflowKind::Redemption;
            }
            _ => {
                let accrual_start = kept
                    .last()
                    .map_or(next.accrual_start, |f| f.accrual_end.max(next.accrual_start));
                kept.push(BondCashflow {
                    pay_date: date,
                    accrual_start,
                    accrual_end: date,
                    coupon_rate: next.coupon_rate,
                    coupon_amount: self.bond.interest_accrued(date),
                    notional_before: outstanding,
                    notional_after: 0.0,
                    principal_exchange: outstanding,
                    redemption_premium: premium,
                    kind: CashflowKind::Redemption,
                    period_index: next.period_index,
                });
            }
        }
        kept
    }

    fn solve(&self, dirty_price: f64, flows: &[YieldFlow]) -> SolveOutcome {
        if flows.is_empty() || self.bond.terms().is_dead(self.settle) {
            return SolveOutcome::exact(0.0);
        }
        let objective = |y: f64| self.price(y, flows) - dirty_price;
        let derivative = |y: f64| {
            (self.price(y + DERIVATIVE_STEP, flows) - self.price(y - DERIVATIVE_STEP, flows))
                / (2.0 * DERIVATIVE_STEP)
        };
        let guess = self.bond.terms().coupon_rate;
        SolveOutcome::from_solver(
            "yield",
            safeguarded_newton(
                objective,
                derivative,
                self.bracket.lower,
                self.bracket.upper,
                guess,
                &self.config,
            ),
        )
    }

    fn price(&self, y: f64, flows: &[YieldFlow]) -> f64 {
        let f = self.periods_per_year();
        let simple = matches!(
            self.method,
            YieldMethod::Street {
                simple_final_period: true
            }
        ) && flows.last().is_some_and(|last| last.exponent <= 1.0 + TIE_TOLERANCE);

        flows
            .iter()
            .map(|flow| {
                let factor = match self.method {
                    YieldMethod::Street { .. } if simple => 1.0 / (1.0 + y * flow.exponent / f),
                    YieldMethod::Street { .. } => (1.0 + y / f).powf(-flow.exponent),
                    YieldMethod::AnnualCompounding => (1.0 + y).powf(-flow.exponent / f),
                    YieldMethod::DiscountBasis => 1.0 - y * flow.days as f64 / 360.0,
                };
                flow.amount * factor
            })
            .sum()
    }

    fn timed(&self, cashflows: &[BondCashflow]) -> Vec<YieldFlow> {
        cashflows
            .iter()
            .map(|cf| YieldFlow {
                amount: cf.amount(),
                exponent: self.periods_between(self.settle, cf.accrual_end),
                days: self.settle.days_between(&cf.pay_date),
            })
            .collect()
    }

    fn periods_per_year(&self) -> f64 {
        self.bond.terms().frequency.compounding_f64()
    }

    /// Coupon periods from `from` to `to`, counting stubs in notional periods.
    fn periods_between(&self, from: Date, to: Date) -> f64 {
        let terms = self.bond.terms();
        let f = self.periods_per_year();
        let fraction = |p: &Period, a: Date, b: Date| {
            p.accrual_fraction(a, b, terms.day_count, terms.frequency)
                .to_f64()
                .unwrap_or(0.0)
        };
        self.bond
            .schedule()
            .iter()
            .filter(|p| p.accrual_end > from && p.accrual_start < to)
            .map(|p| {
                let part = fraction(p, from.max(p.accrual_start), to.min(p.accrual_end));
                if p.is_regular() && !terms.frequency.is_zero() {
                    let full = fraction(p, p.accrual_start, p.accrual_end);
                    if full > 0.0 {
                        part / full
                    } else {
                        0.0
                    }
                } else {
                    f * part
                }
            })
            .sum()
    }
}

fn strike_on(periods: &[ExercisePeriod], date: Date) -> Option<f64> {
    periods.iter().find(|p| p.is_active_on(date)).map(|p| p.strike)
}

fn candidates(periods: &[ExercisePeriod], coupon_dates: &[Date], settle: Date) -> Vec<(Date, f64)> {
    let mut dates: Vec<(Date, f64)> = periods
        .iter()
        .flat_map(|p| {
            p.candidate_dates(coupon_dates, settle)
                .into_iter()
                .map(move |d| (d, p.strike))
        })
        .collect();
    dates.sort_by(|a, b| a.0.cmp(&b.0));
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use tenor_bonds::types::{BondTerms, BondType, CallPeriod, OptionStyle};
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn ctx(settle: Date) -> PricingContext {
        PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.04)))
    }

    fn bond(terms: BondTerms) -> Bond {
        Bond::new(terms).unwrap()
    }

    #[test]
    fn par_yield_on_coupon_date() {
        let b = bond(BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US));
        let solver = YieldSolver::new(&b, &ctx(d(2027, 1, 15))).unwrap();
        assert_relative_eq!(solver.price_from_yield(0.05), 100.0, epsilon = 1e-10);
        let y = solver.yield_to_maturity(100.0);
        assert!(y.is_converged());
        assert_relative_eq!(y.value, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn mid_period_fraction() {
        let b = bond(BondTerms::fixed(d(2025, 1, 15), d(2027, 1, 15), 0.06, Frequency::SemiAnnual, DayCountConvention::Thirty360US));
        let solver = YieldSolver::new(&b, &ctx(d(2025, 4, 15))).unwrap();
        // Half a period to the first coupon.
        let v: f64 = (0..4)
            .map(|k| {
                let cf = if k == 3 { 103.0 } else { 3.0 };
                cf / 1.03_f64.powf(0.5 + f64::from(k))
            })
            .sum();
        assert_relative_eq!(solver.price_from_yield(0.06), v, epsilon = 1e-10);
    }

    #[test]
    fn us_final_period_is_simple() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2026, 1, 15), 0.04, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_bond_type(BondType::UsCorporate);
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 10, 15))).unwrap();
        assert_relative_eq!(solver.price_from_yield(0.05), 102.0 / (1.0 + 0.05 * 0.5 / 2.0), epsilon = 1e-10);
    }

    #[test]
    fn annual_override_matches_effective_rate() {
        let b = bond(BondTerms::fixed(d(2025, 1, 15), d(2030, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US));
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15)))
            .unwrap()
            .with_method(YieldMethod::AnnualCompounding);
        assert_eq!(solver.method(), YieldMethod::AnnualCompounding);
        let y = solver.yield_to_maturity(100.0);
        assert_relative_eq!(y.value, 1.025_f64.powi(2) - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn discount_basis_bill() {
        let terms = BondTerms::zero_coupon(d(2025, 1, 2), d(2025, 7, 3), DayCountConvention::Act360)
            .with_bond_type(BondType::UsTBill);
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 2))).unwrap();
        let days = d(2025, 1, 2).days_between(&d(2025, 7, 3)) as f64;
        let price = 100.0 * (1.0 - 0.045 * days / 360.0);
        assert_relative_eq!(solver.yield_to_maturity(price).value, 0.045, epsilon = 1e-9);
    }

    #[test]
    fn matured_bond_has_zero_yield() {
        let b = bond(BondTerms::fixed(d(2020, 1, 15), d(2025, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US));
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15))).unwrap();
        let y = solver.yield_to_maturity(100.0);
        assert_eq!(y.value, 0.0);
        assert!(y.is_converged());
    }

    #[test]
    fn exercise_on_coupon_date_redeems_with_coupon() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_call(CallPeriod::european(d(2030, 1, 15), 102.0));
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15))).unwrap();
        let flows = solver.exercise_flows(d(2030, 1, 15), 102.0);
        assert_eq!(flows.len(), 10);
        assert_relative_eq!(flows[9].amount(), 2.5 + 102.0, epsilon = 1e-12);
    }

    #[test]
    fn exercise_mid_period_pays_accrued() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_call(CallPeriod::new(d(2030, 1, 15), d(2035, 1, 15), 100.0, OptionStyle::American));
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15))).unwrap();
        let flows = solver.exercise_flows(d(2030, 4, 15), 100.0);
        assert_eq!(flows.len(), 11);
        assert_relative_eq!(flows[10].coupon_amount, 1.25, epsilon = 1e-12);
        assert_relative_eq!(flows[10].principal_exchange, 100.0);
    }

    #[test]
    fn worst_prefers_earliest_on_ties() {
        // Callable at par on every coupon date: at par every yield equals the coupon.
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2028, 1, 15), 0.05, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_call(CallPeriod::new(d(2026, 1, 15), d(2028, 1, 15), 100.0, OptionStyle::Bermudan));
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15))).unwrap();
        let worst = solver.yield_to_worst(100.0);
        assert_eq!(worst.date, d(2026, 1, 15));
        assert_relative_eq!(worst.outcome.value, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn worst_of_premium_bond_is_call() {
        let terms = BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), 0.07, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_call(CallPeriod::european(d(2030, 1, 15), 100.0));
        let b = bond(terms);
        let solver = YieldSolver::new(&b, &ctx(d(2025, 1, 15))).unwrap();
        let worst = solver.yield_to_worst(110.0);
        assert_eq!(worst.date, d(2030, 1, 15));
        assert!(worst.outcome.value < solver.yield_to_maturity(110.0).value);
    }
}
