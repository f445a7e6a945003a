//! Convertible bonds on a joint stock and short-rate tree.
//!
//! The stock tree shares the rate tree's grid. Log-prices are laid out as
//!
//! ```text
//! ln S(i, k) = ln F_i - i × ln cosh(h_i) + (2k - i) × h_i,    h_i = σ_S sqrt(t_i / i)
//! ```
//!
//! where `F_i` is the curve forward of the stock net of the continuous
//! dividend yield and the proportional discrete dividends paid up to `t_i`.
//! From node `(i, j, k)` the stock moves up with the probability `p` that
//! makes the step risk-neutral under that node's own short rate:
//!
//! ```text
//! p = (S(i, k) × g_i / D(i, j) - S(i+1, k)) / (S(i+1, k+1) - S(i+1, k))
//! ```
//!
//! with `g_i` the dividend carry over the step and `D(i, j)` the step
//! discount factor. The four joint branches keep the rate marginal at ½:
//! `½p + c` (both up), `½(1 - p) + c` (both down) and `½(1 - p) - c`,
//! `½p - c` for the crossed moves, where `c = ½ρ sqrt(p(1 - p))`. At
//! `p = ½` these are the usual `¼(1 ± ρ)`.
//!
//! At every node after the root:
//!
//! ```text
//! V = max(conv, max(put, min(cont, max(call, conv)))) + CF
//! ```
//!
//! with each right applied only where it is active. A soft call is active
//! only while parity is at least its trigger times the call strike.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use tenor_bonds::types::{CallTrigger, ConversionTerms};
use tenor_bonds::Bond;
use tenor_core::types::Date;

use super::callable::{NodeTerms, RateLattice};
use super::short_rate::{ShortRateTree, TreeDiagnostics};
use crate::context::{PricingContext, StockParams};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::parallel::maybe_parallel_fill;

/// Output of the convertible lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertibleResult {
    /// Price including accrued interest.
    pub dirty_price: f64,
    /// Price excluding accrued interest.
    pub clean_price: f64,
    /// Accrued interest at the entitlement date.
    pub accrued: f64,
    /// Conversion value of 100 notional at the current spot.
    pub parity: f64,
    /// `dirty_price - parity`.
    pub premium: f64,
    /// Price with conversion disabled.
    pub bond_floor: f64,
    /// Price sensitivity to the spot.
    pub delta: f64,
    /// Second-order price sensitivity to the spot.
    pub gamma: f64,
    /// Shares to short per 100 notional: `delta / shares_per_hundred`.
    pub hedge_ratio: f64,
    /// Largest relative gap between `E[S·B]` and the dividend-adjusted spot.
    pub martingale_error: f64,
    /// Rate tree calibration report.
    pub diagnostics: TreeDiagnostics,
}

/// Stock prices on the rate tree's grid.
#[derive(Debug, Clone)]
struct StockTree {
    /// `ln F_i - i × ln cosh(h_i)`.
    centres: Vec<f64>,
    spacings: Vec<f64>,
    /// Dividend carry from step `i` to `i + 1`.
    carry: Vec<f64>,
}

/// Joint rate and stock transition weights out of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Branches {
    up_up: f64,
    down_down: f64,
    up_down: f64,
    down_up: f64,
}

impl StockTree {
    fn build(tree: &ShortRateTree, stock: &StockParams, settle: Date) -> Self {
        let grid = tree.grid();
        let steps = grid.dates().len();
        let mut centres = Vec::with_capacity(steps);
        let mut spacings = Vec::with_capacity(steps);
        let mut factors = Vec::with_capacity(steps);
        for (i, (date, &t)) in grid.dates().iter().zip(grid.times()).enumerate() {
            let h = if i == 0 {
                0.0
            } else {
                stock.volatility * (t / i as f64).sqrt()
            };
            let factor = carry_factor(stock, settle, *date, t);
            let forward = stock.spot * factor / tree.discount_factor(i);
            centres.push(forward.ln() - i as f64 * h.cosh().ln());
            spacings.push(h);
            factors.push(factor);
        }
        let carry = factors
            .windows(2)
            .map(|w| if w[0] > 0.0 { w[1] / w[0] } else { 0.0 })
            .collect();
        Self {
            centres,
            spacings,
            carry,
        }
    }

    fn price(&self, i: usize, k: usize) -> f64 {
        (self.centres[i] + (2.0 * k as f64 - i as f64) * self.spacings[i]).exp()
    }

    /// Risk-neutral probability of an up move from `(i, k)` given the
    /// node's step discount factor.
    fn up_probability(&self, i: usize, k: usize, discount: f64) -> f64 {
        let up = self.price(i + 1, k + 1);
        let down = self.price(i + 1, k);
        let width = up - down;
        if !(width > 0.0 && width.is_finite()) {
            return 0.5;
        }
        let forward = self.price(i, k) * self.carry[i] / discount;
        ((forward - down) / width).clamp(0.0, 1.0)
    }

    fn branches(&self, i: usize, k: usize, discount: f64, rho: f64) -> Branches {
        let p = self.up_probability(i, k, discount);
        let bound = 0.5 * p.min(1.0 - p);
        let c = (0.5 * rho * (p * (1.0 - p)).sqrt()).clamp(-bound, bound);
        Branches {
            up_up: 0.5 * p + c,
            down_down: 0.5 * (1.0 - p) + c,
            up_down: 0.5 * (1.0 - p) - c,
            down_up: 0.5 * p - c,
        }
    }
}

/// Fraction of the spot left after the dividends paid in `(settle, date]`.
fn carry_factor(stock: &StockParams, settle: Date, date: Date, t: f64) -> f64 {
    stock
        .dividends
        .iter()
        .filter(|d| d.date > settle && d.date <= date)
        .fold((-stock.dividend_yield * t).exp(), |s, d| s * (1.0 - d.proportion))
}

/// Per-node rights, fixed for one induction pass.
#[derive(Debug, Clone, Copy)]
struct ConvertibleRights {
    conversion: ConversionTerms,
    allow_conversion: bool,
}

impl ConvertibleRights {
    fn conversion_value(&self, date: Date, spot: f64, notional: f64) -> Option<f64> {
        (self.allow_conversion && self.conversion.is_active_on(date))
            .then(|| self.conversion.parity(spot) * notional / 100.0)
    }

    fn node_value(&self, cont: f64, node: &NodeTerms, date: Date, spot: f64) -> f64 {
        let conv = self.conversion_value(date, spot, node.notional);
        let parity = self.conversion.parity(spot);

        let call_bound = node
            .call
            .filter(|call| match call.trigger {
                CallTrigger::SoftCall { parity_ratio } => parity >= parity_ratio * call.strike,
                _ => true,
            })
            .map_or(f64::INFINITY, |call| {
                let redeem = node.exercise_value(call.strike);
                conv.map_or(redeem, |c| redeem.max(c))
            });

        let mut v = cont.min(call_bound);
        if let Some(put) = node.put {
            v = v.max(node.exercise_value(put.strike));
        }
        conv.map_or(v, |c| v.max(c))
    }
}

/// Lattice valuation of a convertible bond.
pub struct ConvertibleLattice<'a> {
    bond: &'a Bond,
    ctx: &'a PricingContext,
    conversion: ConversionTerms,
    stock: StockParams,
    lattice: RateLattice,
}

impl std::fmt::Debug for ConvertibleLattice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertibleLattice")
            .field("steps", &self.lattice.tree.steps())
            .field("conversion", &self.conversion)
            .field("spot", &self.stock.spot)
            .finish_non_exhaustive()
    }
}

impl<'a> ConvertibleLattice<'a> {
    /// Builds the joint grid for `bond` under `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Unsupported` if the bond has no conversion
    /// terms and `AnalyticsError::MissingMarketData` without stock data.
    pub fn new(bond: &'a Bond, ctx: &'a PricingContext) -> AnalyticsResult<Self> {
        let terms = bond.terms();
        let conversion = terms
            .conversion
            .ok_or_else(|| AnalyticsError::unsupported("bond has no conversion terms"))?;
        let stock = ctx.stock()?.clone();
        if stock.spot < 0.0 || stock.volatility < 0.0 || stock.correlation.abs() > 1.0 {
            return Err(AnalyticsError::invalid_input(format!(
                "stock parameters out of range: spot {}, volatility {}, correlation {}",
                stock.spot, stock.volatility, stock.correlation
            )));
        }

        let mut extra = vec![conversion.start_date, conversion.end_date];
        extra.extend(stock.dividends.iter().map(|d| d.date));
        extra.retain(|d| *d <= terms.maturity);

        let lattice = RateLattice::build(bond, ctx, ctx.config.lattice.convertible_steps_per_year, &extra)?;
        tracing::debug!(
            steps = lattice.tree.steps(),
            spot = stock.spot,
            correlation = stock.correlation,
            "built convertible lattice"
        );
        Ok(Self {
            bond,
            ctx,
            conversion,
            stock,
            lattice,
        })
    }

    /// The calibrated rate tree.
    #[must_use]
    pub fn tree(&self) -> &ShortRateTree {
        &self.lattice.tree
    }

    /// Dirty price at the context spot.
    #[must_use]
    pub fn dirty_price(&self) -> f64 {
        self.price_at_spot(self.stock.spot, true)
    }

    /// Dirty price with conversion disabled.
    #[must_use]
    pub fn bond_floor(&self) -> f64 {
        self.price_at_spot(self.stock.spot, false)
    }

    /// Dirty price for another spot.
    #[must_use]
    pub fn price_at_spot(&self, spot: f64, allow_conversion: bool) -> f64 {
        let stock = self.stock.with_spot(spot);
        let stocks = StockTree::build(&self.lattice.tree, &stock, self.ctx.settle);
        let rights = ConvertibleRights {
            conversion: self.conversion,
            allow_conversion,
        };
        self.induct(&stocks, rights)
    }

    fn induct(&self, stocks: &StockTree, rights: ConvertibleRights) -> f64 {
        let tree = &self.lattice.tree;
        let nodes = &self.lattice.nodes;
        let dates = tree.grid().dates();
        let parallel = &self.ctx.config.parallel;
        let rho = self.stock.correlation;

        let n = tree.steps();
        let terminal = nodes[n];
        let mut values = Array2::from_shape_fn((n + 1, n + 1), |(_, k)| {
            rights
                .conversion_value(dates[n], stocks.price(n, k), terminal.notional_before)
                .map_or(terminal.flow, |c| c.max(terminal.flow))
        });

        for i in (0..n).rev() {
            let node = nodes[i];
            let date = dates[i];
            let next = &values;
            let rows = maybe_parallel_fill(i + 1, parallel, |j| {
                let disc = tree.step_discount(i, j, 0.0);
                (0..=i)
                    .map(|k| {
                        let b = stocks.branches(i, k, disc, rho);
                        let cont = disc
                            * (b.up_up * next[[j + 1, k + 1]]
                                + b.down_down * next[[j, k]]
                                + b.up_down * next[[j + 1, k]]
                                + b.down_up * next[[j, k + 1]]);
                        let v = if i > 0 {
                            rights.node_value(cont, &node, date, stocks.price(i, k))
                        } else {
                            cont
                        };
                        v + node.flow
                    })
                    .collect::<Vec<f64>>()
            });
            values = Array2::from_shape_fn((i + 1, i + 1), |(j, k)| rows[j][k]);
        }
        values[[0, 0]]
    }

    /// Largest relative gap, over all steps, between the state-price weighted
    /// stock and the dividend-adjusted spot.
    #[must_use]
    pub fn martingale_error(&self) -> f64 {
        let tree = &self.lattice.tree;
        let grid = tree.grid();
        let stocks = StockTree::build(tree, &self.stock, self.ctx.settle);
        let rho = self.stock.correlation;
        let scale = self.stock.spot.max(f64::MIN_POSITIVE);

        let mut prices = Array2::from_elem((1, 1), 1.0);
        let mut worst = 0.0_f64;
        for i in 0..tree.steps() {
            let mut next = Array2::zeros((i + 2, i + 2));
            for ((j, k), &q) in prices.indexed_iter() {
                let disc = tree.step_discount(i, j, 0.0);
                let b = stocks.branches(i, k, disc, rho);
                let q = q * disc;
                next[[j + 1, k + 1]] += b.up_up * q;
                next[[j, k]] += b.down_down * q;
                next[[j + 1, k]] += b.up_down * q;
                next[[j, k + 1]] += b.down_up * q;
            }
            prices = next;

            let expected = self.stock.spot
                * carry_factor(&self.stock, self.ctx.settle, grid.dates()[i + 1], grid.times()[i + 1]);
            let actual: f64 = prices
                .indexed_iter()
                .map(|((_, k), &q)| q * stocks.price(i + 1, k))
                .sum();
            worst = worst.max((actual - expected).abs() / scale);
        }
        worst
    }

    /// Full valuation.
    pub fn price(&self) -> AnalyticsResult<ConvertibleResult> {
        let spot = self.stock.spot;
        let dirty_price = self.dirty_price();
        let accrued = self.bond.accrued_interest(self.ctx.entitlement_date()).amount;
        let parity = self.conversion.parity(spot);

        let (delta, gamma) = if spot > 0.0 {
            let bump = self.ctx.config.lattice.spot_bump * spot;
            let up = self.price_at_spot(spot + bump, true);
            let down = self.price_at_spot(spot - bump, true);
            ((up - down) / (2.0 * bump), (up - 2.0 * dirty_price + down) / (bump * bump))
        } else {
            (0.0, 0.0)
        };
        let shares = self.conversion.shares_per_hundred();
        let hedge_ratio = if shares > 0.0 { delta / shares } else { 0.0 };

        Ok(ConvertibleResult {
            dirty_price,
            clean_price: dirty_price - accrued,
            accrued,
            parity,
            premium: dirty_price - parity,
            bond_floor: self.bond_floor(),
            delta,
            gamma,
            hedge_ratio,
            martingale_error: self.martingale_error(),
            diagnostics: self.lattice.tree.diagnostics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::lattice::CallableLattice;
    use crate::context::VolatilityParams;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use tenor_bonds::types::{BondTerms, CallPeriod, OptionStyle};
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn config() -> PricingConfig {
        let mut config = PricingConfig::default();
        config.lattice.steps_per_year = 12;
        config.lattice.convertible_steps_per_year = 12;
        config
    }

    fn convertible(coupon: f64, years: i32, ratio: f64) -> BondTerms {
        let (eff, mat) = (d(2025, 1, 15), d(2025 + years, 1, 15));
        BondTerms::fixed(eff, mat, coupon, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
            .with_conversion(ConversionTerms::new(ratio, eff, mat, 100.0))
    }

    fn ctx(stock: StockParams) -> PricingContext {
        let settle = d(2025, 1, 15);
        PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.03)))
            .with_volatility(VolatilityParams::new(0.01, 0.1))
            .with_stock(stock)
            .with_config(config())
    }

    #[test]
    fn vanishing_ratio_matches_callable() {
        let terms = convertible(0.04, 5, 1e-9)
            .with_call(CallPeriod::new(d(2027, 1, 15), d(2030, 1, 15), 100.0, OptionStyle::Bermudan));
        let bond = Bond::new(terms).unwrap();
        let c = ctx(StockParams::new(50.0, 0.3));
        let conv = ConvertibleLattice::new(&bond, &c).unwrap().dirty_price();
        let call = CallableLattice::new(&bond, &c).unwrap().dirty_price_with_oas(0.0);
        assert_relative_eq!(conv, call, epsilon = 1e-3);
    }

    #[test]
    fn zero_spot_matches_callable() {
        let terms = convertible(0.04, 5, 1.0)
            .with_call(CallPeriod::new(d(2027, 1, 15), d(2030, 1, 15), 100.0, OptionStyle::Bermudan));
        let bond = Bond::new(terms).unwrap();
        let c = ctx(StockParams::new(0.0, 0.3));
        let conv = ConvertibleLattice::new(&bond, &c).unwrap().dirty_price();
        let call = CallableLattice::new(&bond, &c).unwrap().dirty_price_with_oas(0.0);
        assert_relative_eq!(conv, call, epsilon = 1e-3);
    }

    #[test]
    fn deep_in_the_money_trades_at_parity() {
        let bond = Bond::new(convertible(0.005, 2, 1.0)).unwrap();
        let c = ctx(StockParams::new(300.0, 0.25));
        let result = ConvertibleLattice::new(&bond, &c).unwrap().price().unwrap();
        assert_relative_eq!(result.parity, 300.0, epsilon = 1e-12);
        assert!((result.dirty_price / result.parity - 1.0).abs() < 0.01);
        assert!(result.premium >= 0.0);
    }

    #[test]
    fn price_rises_with_spot_and_stays_above_floor() {
        let bond = Bond::new(convertible(0.02, 5, 1.0)).unwrap();
        let c = ctx(StockParams::new(100.0, 0.3));
        let lattice = ConvertibleLattice::new(&bond, &c).unwrap();
        let mut last = f64::NEG_INFINITY;
        for spot in [20.0, 40.0, 60.0, 80.0, 100.0, 150.0] {
            let price = lattice.price_at_spot(spot, true);
            let floor = lattice.price_at_spot(spot, false);
            assert!(price >= last - 1e-12);
            assert!(price >= floor - 1e-12);
            last = price;
        }
        let result = lattice.price().unwrap();
        assert!(result.delta > 0.0 && result.delta < 1.0);
        assert_relative_eq!(result.hedge_ratio, result.delta, epsilon = 1e-12);
    }

    #[test]
    fn stock_tree_is_a_martingale() {
        let bond = Bond::new(convertible(0.02, 5, 1.0)).unwrap();
        let c = ctx(StockParams::new(80.0, 0.35));
        let lattice = ConvertibleLattice::new(&bond, &c).unwrap();
        assert!(lattice.martingale_error() < 5e-4);

        let with_dividends = ctx(StockParams::new(80.0, 0.35)
            .with_dividend_yield(0.01)
            .with_dividend(d(2026, 6, 1), 0.02));
        let lattice = ConvertibleLattice::new(&bond, &with_dividends).unwrap();
        assert!(lattice.martingale_error() < 5e-4);
    }

    #[test]
    fn martingale_holds_under_correlation() {
        let bond = Bond::new(convertible(0.02, 5, 1.0)).unwrap();
        for rho in [-0.2, 0.5] {
            let c = ctx(StockParams::new(80.0, 0.35)
                .with_correlation(rho)
                .with_dividend(d(2027, 3, 1), 0.03));
            let lattice = ConvertibleLattice::new(&bond, &c).unwrap();
            assert!(lattice.martingale_error() < 5e-4, "rho {rho}: {}", lattice.martingale_error());
        }
    }

    #[test]
    fn branch_weights_keep_both_marginals() {
        let bond = Bond::new(convertible(0.02, 5, 1.0)).unwrap();
        let c = ctx(StockParams::new(80.0, 0.35).with_correlation(-0.2));
        let lattice = ConvertibleLattice::new(&bond, &c).unwrap();
        let stocks = StockTree::build(&lattice.lattice.tree, &lattice.stock, c.settle);
        let (i, k) = (10, 4);
        let disc = lattice.lattice.tree.step_discount(i, 3, 0.0);
        let b = stocks.branches(i, k, disc, -0.2);
        let p = stocks.up_probability(i, k, disc);
        assert!(b.up_up >= 0.0 && b.down_down >= 0.0 && b.up_down >= 0.0 && b.down_up >= 0.0);
        assert_relative_eq!(b.up_up + b.up_down, 0.5, epsilon = 1e-12);
        assert_relative_eq!(b.up_up + b.down_up, p, epsilon = 1e-12);
        let expected = stocks.price(i, k) * stocks.carry[i] / disc;
        let mean = p * stocks.price(i + 1, k + 1) + (1.0 - p) * stocks.price(i + 1, k);
        assert_relative_eq!(mean, expected, max_relative = 1e-12);
    }

    #[test]
    fn high_spot_converges_to_parity() {
        let call = CallPeriod::new(d(2027, 1, 15), d(2030, 1, 15), 100.0, OptionStyle::American);
        let bond = Bond::new(convertible(0.03, 5, 1.0).with_call(call)).unwrap();
        for spot in [1_000.0, 10_000.0] {
            let c = ctx(StockParams::new(spot, 0.3).with_correlation(-0.2));
            let result = ConvertibleLattice::new(&bond, &c).unwrap().price().unwrap();
            let ratio = result.dirty_price / result.parity;
            assert!(ratio >= 1.0 - 1e-9 && ratio < 1.01, "spot {spot}: ratio {ratio}");
        }
    }

    #[test]
    fn soft_call_needs_parity_trigger() {
        let soft = CallPeriod::new(d(2026, 1, 15), d(2030, 1, 15), 100.0, OptionStyle::American)
            .with_trigger(CallTrigger::SoftCall { parity_ratio: 1.3 });
        let hard = CallPeriod::new(d(2026, 1, 15), d(2030, 1, 15), 100.0, OptionStyle::American);
        let c = ctx(StockParams::new(90.0, 0.3));
        let soft_price = ConvertibleLattice::new(&Bond::new(convertible(0.05, 5, 1.0).with_call(soft)).unwrap(), &c)
            .unwrap()
            .dirty_price();
        let hard_price = ConvertibleLattice::new(&Bond::new(convertible(0.05, 5, 1.0).with_call(hard)).unwrap(), &c)
            .unwrap()
            .dirty_price();
        assert!(soft_price > hard_price);
    }

    #[test]
    fn requires_conversion_terms_and_stock() {
        let plain = Bond::new(BondTerms::fixed(
            d(2025, 1, 15),
            d(2030, 1, 15),
            0.04,
            Frequency::SemiAnnual,
            DayCountConvention::Thirty360US,
        ))
        .unwrap();
        let c = ctx(StockParams::new(50.0, 0.3));
        assert!(matches!(ConvertibleLattice::new(&plain, &c), Err(AnalyticsError::Unsupported { .. })));

        let bond = Bond::new(convertible(0.04, 5, 1.0)).unwrap();
        let settle = d(2025, 1, 15);
        let no_stock = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.03)));
        assert!(matches!(
            ConvertibleLattice::new(&bond, &no_stock),
            Err(AnalyticsError::MissingMarketData { .. })
        ));
    }
}
