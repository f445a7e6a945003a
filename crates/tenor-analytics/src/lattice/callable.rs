//! Callable and puttable bonds on the short-rate tree.
//!
//! BuildTree → PopulateTerminal → BackwardInduct → ExtractRoot. At every
//! node the continuation value is the discounted average of the two
//! successors. Where an option can be exercised:
//!
//! - issuer call: `min(cont, strike × N / 100 + accrued)`
//! - holder put: `max(cont, strike × N / 100 + accrued)`
//!
//! and flows paid on the node date are added afterwards. Make-whole calls
//! are never optimal and are ignored; soft-call triggers need the equity
//! tree and are treated as plain calls here.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tenor_bonds::cashflows::BondCashflow;
use tenor_bonds::types::ExercisePeriod;
use tenor_bonds::Bond;
use tenor_core::types::Date;
use tenor_curves::ShiftedCurve;

use super::grid::TimeGrid;
use super::short_rate::{ShortRateTree, TreeDiagnostics};
use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::pricing::{market_dirty_price, projected_flows};
use crate::solve::SolveOutcome;
use crate::spreads::solve_bracketed;
use crate::yields::{ExerciseYield, YieldSolver};

/// Bump used for PV01.
const PV01_BUMP: f64 = 1e-4;

/// Output of the callable/puttable lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallableResult {
    /// Price including accrued interest.
    pub dirty_price: f64,
    /// Price excluding accrued interest.
    pub clean_price: f64,
    /// Accrued interest at the entitlement date.
    pub accrued: f64,
    /// Price without the embedded options.
    pub straight_price: f64,
    /// `straight_price - dirty_price`: positive for a net short call.
    pub option_value: f64,
    /// Yield to the first call at the lattice price.
    pub yield_to_call: Option<ExerciseYield>,
    /// Yield to the first put at the lattice price.
    pub yield_to_put: Option<ExerciseYield>,
    /// Yield to worst at the lattice price.
    pub yield_to_worst: Option<ExerciseYield>,
    /// Price change for a +1bp parallel curve shift.
    pub pv01: f64,
    /// Option-adjusted spread to the market quote, when one is given.
    pub oas: Option<SolveOutcome>,
    /// Tree calibration report.
    pub diagnostics: TreeDiagnostics,
}

/// Node data for one grid date.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeTerms {
    /// Flows paid on the node date.
    pub(crate) flow: f64,
    /// Outstanding notional after the node's flows.
    pub(crate) notional: f64,
    /// Outstanding notional before the node's flows.
    pub(crate) notional_before: f64,
    /// Interest accrued on the node date, as paid on exercise.
    pub(crate) accrued: f64,
    /// Notional redeemed on exercise: outstanding after flows accrued to the node date.
    pub(crate) redeemed: f64,
    /// Discount factor from the node date to the exercise payment date.
    pub(crate) settlement_df: f64,
    /// Present value at the node of flows already accrued but paid later.
    pub(crate) owed: f64,
    /// Call exercisable on the node date.
    pub(crate) call: Option<ExercisePeriod>,
    /// Put exercisable on the node date.
    pub(crate) put: Option<ExercisePeriod>,
}

impl NodeTerms {
    /// Value at the node of exercising at `strike`.
    ///
    /// Redemption is paid with any coupon ending on the node date, so it
    /// settles on that coupon's payment date. Flows accrued by the node date
    /// but paid after it stay with the holder.
    pub(crate) fn exercise_value(&self, strike: f64) -> f64 {
        (strike * self.redeemed / 100.0 + self.accrued) * self.settlement_df + self.owed
    }
}

/// A bond set up for backward induction on one tree.
#[derive(Debug, Clone)]
pub(crate) struct RateLattice {
    pub(crate) tree: ShortRateTree,
    pub(crate) nodes: Vec<NodeTerms>,
}

impl RateLattice {
    /// Builds the grid from the bond's dates plus `extra_dates`.
    pub(crate) fn build(
        bond: &Bond,
        ctx: &PricingContext,
        steps_per_year: u32,
        extra_dates: &[Date],
    ) -> AnalyticsResult<Self> {
        let flows = projected_flows(bond, ctx)?;
        let mut dates = key_dates(bond, &flows, ctx.settle);
        dates.extend_from_slice(extra_dates);
        let grid = TimeGrid::build(ctx.settle, dates, steps_per_year)?;
        let tree = ShortRateTree::build(grid, ctx.discount_curve.as_ref(), &ctx.volatility)?;
        let nodes = node_terms(bond, &flows, tree.grid(), ctx);
        Ok(Self { tree, nodes })
    }

    /// Root value with a spread on every node rate.
    pub(crate) fn value(&self, spread: f64, with_options: bool, ctx: &PricingContext) -> f64 {
        let parallel = &ctx.config.parallel;
        let n = self.tree.steps();
        let mut values = vec![self.nodes[n].flow; n + 1];
        for i in (0..n).rev() {
            let node = self.nodes[i];
            values = self
                .tree
                .rollback(&values, i, spread, parallel)
                .into_iter()
                .map(|cont| {
                    let v = if with_options && i > 0 {
                        exercise(cont, &node)
                    } else {
                        cont
                    };
                    v + node.flow
                })
                .collect();
        }
        values[0]
    }
}

fn exercise(cont: f64, node: &NodeTerms) -> f64 {
    let mut v = cont;
    if let Some(call) = node.call {
        v = v.min(node.exercise_value(call.strike));
    }
    if let Some(put) = node.put {
        v = v.max(node.exercise_value(put.strike));
    }
    v
}

/// Every date the lattice must land on.
fn key_dates(bond: &Bond, flows: &[BondCashflow], settle: Date) -> Vec<Date> {
    let terms = bond.terms();
    let mut dates: Vec<Date> = flows.iter().map(|f| f.pay_date).collect();
    dates.extend(bond.coupon_dates().into_iter().filter(|d| *d > settle));
    dates.push(terms.maturity);
    for p in terms.calls.iter().chain(&terms.puts) {
        dates.push(p.start_date);
        dates.push(p.end_date);
    }
    dates
}

/// The first non-make-whole period allowing exercise on `date`.
fn exercisable(
    periods: &[ExercisePeriod],
    date: Date,
    is_coupon_date: bool,
    settle: Date,
) -> Option<ExercisePeriod> {
    periods
        .iter()
        .find(|p| !p.is_make_whole() && p.allows_exercise(date, is_coupon_date, settle))
        .copied()
}

fn node_terms(bond: &Bond, flows: &[BondCashflow], grid: &TimeGrid, ctx: &PricingContext) -> Vec<NodeTerms> {
    let terms = bond.terms();
    let settle = ctx.settle;
    let curve = ctx.discount_curve.as_ref();
    let coupon_dates: HashSet<Date> = bond.coupon_dates().into_iter().collect();
    let mut nodes: Vec<NodeTerms> = grid
        .dates()
        .iter()
        .map(|date| {
            let is_coupon = coupon_dates.contains(date);
            let outstanding = |after: bool| {
                flows
                    .iter()
                    .find(|f| if after { f.pay_date > *date } else { f.pay_date >= *date })
                    .map_or(0.0, |f| f.notional_before)
            };
            let settlement = flows
                .iter()
                .find(|f| f.accrual_end == *date)
                .map_or(*date, |f| f.pay_date.max(*date));
            let owed: f64 = flows
                .iter()
                .filter(|f| f.accrual_end <= *date && f.pay_date > *date)
                .map(|f| f.amount() * curve.discount_factor_between(*date, f.pay_date))
                .sum();
            NodeTerms {
                flow: 0.0,
                notional: outstanding(true),
                notional_before: outstanding(false),
                accrued: bond.interest_accrued(*date),
                redeemed: flows
                    .iter()
                    .find(|f| f.accrual_end > *date)
                    .map_or(0.0, |f| f.notional_before),
                settlement_df: curve.discount_factor_between(*date, settlement),
                owed,
                call: exercisable(&terms.calls, *date, is_coupon, settle),
                put: exercisable(&terms.puts, *date, is_coupon, settle),
            }
        })
        .collect();
    for flow in flows {
        nodes[grid.index_on_or_after(flow.pay_date)].flow += flow.amount();
    }
    nodes
}

/// Lattice valuation of a bond with calls and/or puts.
pub struct CallableLattice<'a> {
    bond: &'a Bond,
    ctx: &'a PricingContext,
    lattice: RateLattice,
}

impl std::fmt::Debug for CallableLattice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableLattice")
            .field("steps", &self.lattice.tree.steps())
            .finish_non_exhaustive()
    }
}

impl<'a> CallableLattice<'a> {
    /// Builds the tree and node terms for `bond` under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &'a PricingContext) -> AnalyticsResult<Self> {
        let lattice = RateLattice::build(bond, ctx, ctx.config.lattice.steps_per_year, &[])?;
        Ok(Self { bond, ctx, lattice })
    }

    /// The calibrated tree.
    #[must_use]
    pub fn tree(&self) -> &ShortRateTree {
        &self.lattice.tree
    }

    /// Dirty price with a spread added to every node rate.
    #[must_use]
    pub fn dirty_price_with_oas(&self, oas: f64) -> f64 {
        self.lattice.value(oas, true, self.ctx)
    }

    /// Dirty price without the embedded options.
    #[must_use]
    pub fn straight_price(&self) -> f64 {
        self.lattice.value(0.0, false, self.ctx)
    }

    /// Option-adjusted spread matching `dirty_price`.
    #[must_use]
    pub fn option_adjusted_spread(&self, dirty_price: f64) -> SolveOutcome {
        solve_bracketed(
            "oas",
            |s| self.dirty_price_with_oas(s) - dirty_price,
            self.ctx.config.spread_bracket,
            &self.ctx.config.solver_config(),
        )
    }

    /// Price change for a +1bp parallel shift of the discount curve.
    pub fn pv01(&self) -> AnalyticsResult<f64> {
        let shifted = ShiftedCurve::parallel(Arc::clone(&self.ctx.discount_curve), PV01_BUMP);
        let bumped_ctx = self.ctx.with_discount_curve(Arc::new(shifted));
        let bumped = RateLattice::build(
            self.bond,
            &bumped_ctx,
            self.ctx.config.lattice.steps_per_year,
            &[],
        )?;
        Ok(self.dirty_price_with_oas(0.0) - bumped.value(0.0, true, &bumped_ctx))
    }

    /// Full valuation.
    pub fn price(&self) -> AnalyticsResult<CallableResult> {
        let dirty_price = self.dirty_price_with_oas(0.0);
        let straight_price = self.straight_price();
        let accrued = self.bond.accrued_interest(self.ctx.entitlement_date()).amount;

        let yields = YieldSolver::new(self.bond, self.ctx)?;
        let oas = market_dirty_price(self.bond, self.ctx)?.map(|p| self.option_adjusted_spread(p));

        Ok(CallableResult {
            dirty_price,
            clean_price: dirty_price - accrued,
            accrued,
            straight_price,
            option_value: straight_price - dirty_price,
            yield_to_call: yields.yield_to_first_call(dirty_price),
            yield_to_put: yields.yield_to_first_put(dirty_price),
            yield_to_worst: Some(yields.yield_to_worst(dirty_price)),
            pv01: self.pv01()?,
            oas,
            diagnostics: self.lattice.tree.diagnostics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MarketQuote, VolatilityParams};
    use crate::pricing::DiscountedFlows;
    use approx::assert_relative_eq;
    use tenor_bonds::types::{BondTerms, CallPeriod, CashflowFlags, OptionStyle, PutPeriod};
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn terms(coupon: f64) -> BondTerms {
        BondTerms::fixed(d(2025, 1, 15), d(2035, 1, 15), coupon, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
    }

    fn ctx(rate: f64, sigma: f64) -> PricingContext {
        let settle = d(2025, 1, 15);
        PricingContext::new(settle, Arc::new(FlatCurve::new(settle, rate)))
            .with_volatility(VolatilityParams::new(sigma, 0.03))
    }

    #[test]
    fn optionless_bond_matches_discounting() {
        let b = Bond::new(terms(0.05)).unwrap();
        let c = ctx(0.04, 0.01);
        let lattice = CallableLattice::new(&b, &c).unwrap();
        let expected = DiscountedFlows::new(&b, &c).unwrap().price();
        assert_relative_eq!(lattice.dirty_price_with_oas(0.0), expected, epsilon = 1e-9);
        assert_relative_eq!(lattice.straight_price(), expected, epsilon = 1e-9);
    }

    #[test]
    fn call_caps_and_put_floors() {
        let c = ctx(0.04, 0.012);
        let straight = Bond::new(terms(0.05)).unwrap();
        let callable = Bond::new(terms(0.05).with_call(CallPeriod::new(d(2028, 1, 15), d(2035, 1, 15), 100.0, OptionStyle::Bermudan)))
            .unwrap();
        let puttable = Bond::new(terms(0.05).with_put(PutPeriod::european(d(2030, 1, 15), 100.0))).unwrap();
        let p_straight = CallableLattice::new(&straight, &c).unwrap().dirty_price_with_oas(0.0);
        let call = CallableLattice::new(&callable, &c).unwrap().price().unwrap();
        let put = CallableLattice::new(&puttable, &c).unwrap().price().unwrap();
        assert!(call.dirty_price < p_straight);
        assert!(call.option_value > 0.0);
        assert!(put.dirty_price > p_straight);
        assert!(put.option_value < 0.0);
        assert!(call.pv01 > 0.0);
        assert!(call.yield_to_call.is_some());
        assert!(put.yield_to_put.is_some());
    }

    #[test]
    fn call_at_par_matches_bond_to_call_date() {
        let call_date = d(2030, 1, 15);
        let settle = d(2025, 1, 15);
        let c = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.01)))
            .with_volatility(VolatilityParams::new(0.01, 0.5));
        let callable = Bond::new(terms(0.10).with_call(CallPeriod::european(call_date, 100.0))).unwrap();
        let to_call = Bond::new(
            BondTerms::fixed(d(2025, 1, 15), call_date, 0.10, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
                .with_flags(CashflowFlags {
                    stub_at_end: true,
                    ..CashflowFlags::default()
                }),
        )
        .unwrap();
        let lattice = CallableLattice::new(&callable, &c).unwrap().dirty_price_with_oas(0.0);
        let plain = DiscountedFlows::new(&to_call, &c).unwrap().price();
        assert_relative_eq!(lattice, plain, epsilon = 1e-9);
    }

    #[test]
    fn call_on_weekend_coupon_date_keeps_the_rolled_coupon() {
        // 2028-01-15 is a Saturday; the coupon and the redemption are paid on Monday.
        let call_date = d(2028, 1, 15);
        let settle = d(2025, 1, 15);
        let c = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.01)))
            .with_volatility(VolatilityParams::new(0.01, 0.5));
        let callable = Bond::new(terms(0.10).with_call(CallPeriod::european(call_date, 100.0))).unwrap();
        let to_call = Bond::new(BondTerms::fixed(settle, call_date, 0.10, Frequency::SemiAnnual, DayCountConvention::Thirty360US))
            .unwrap();
        assert_eq!(to_call.cashflows().unwrap().last().unwrap().pay_date, d(2028, 1, 17));

        let lattice = CallableLattice::new(&callable, &c).unwrap().dirty_price_with_oas(0.0);
        let plain = DiscountedFlows::new(&to_call, &c).unwrap().price();
        assert_relative_eq!(lattice, plain, epsilon = 1e-9);
    }

    #[test]
    fn oas_round_trip() {
        let callable = Bond::new(terms(0.05).with_call(CallPeriod::new(d(2028, 1, 15), d(2035, 1, 15), 100.0, OptionStyle::American)))
            .unwrap();
        let base = ctx(0.04, 0.01);
        let target = CallableLattice::new(&callable, &base).unwrap().dirty_price_with_oas(0.015);
        let quoted = base.clone().with_quote(MarketQuote::DirtyPrice(target));
        let result = CallableLattice::new(&callable, &quoted).unwrap().price().unwrap();
        let oas = result.oas.unwrap();
        assert!(oas.is_converged());
        assert_relative_eq!(oas.value, 0.015, epsilon = 1e-7);
    }

    #[test]
    fn zero_coupon_price_falls_with_maturity_at_zero_vol() {
        let c = ctx(0.03, 0.0);
        let mut last = f64::INFINITY;
        for years in [1, 2, 5, 10] {
            let zero = Bond::new(BondTerms::zero_coupon(d(2025, 1, 15), d(2025 + years, 1, 15), DayCountConvention::Act365Fixed))
                .unwrap();
            let p = CallableLattice::new(&zero, &c).unwrap().dirty_price_with_oas(0.0);
            assert!(p < last);
            last = p;
        }
    }
}
