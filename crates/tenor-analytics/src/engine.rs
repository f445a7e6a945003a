//! Strategy selection and the one-call analytics facade.
//!
//! [`PricingStrategy::select`] picks the valuation method from the bond's
//! feature sets alone:
//!
//! | Terms | Strategy |
//! |-------|----------|
//! | conversion | [`PricingStrategy::ConvertibleLattice`] |
//! | put, or a call that is not make-whole | [`PricingStrategy::ShortRateLattice`] |
//! | otherwise | [`PricingStrategy::Discounting`] |
//!
//! [`BondAnalytics`] prices with that strategy and, when the context
//! carries a market quote, reports yields and spreads at the quoted price.

use serde::{Deserialize, Serialize};

use tenor_bonds::types::BondTerms;
use tenor_bonds::Bond;

use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::lattice::{CallableLattice, CallableResult, ConvertibleLattice, ConvertibleResult};
use crate::pricing::{conditional_survival, market_dirty_price, DiscountedFlows};
use crate::solve::SolveOutcome;
use crate::spreads::{
    AssetSwapCalculator, CdsImpliedCalculator, CdsImpliedSpread, DiscountMarginCalculator,
    RSpreadCalculator, ZSpreadCalculator,
};
use crate::yields::{ExerciseYield, YieldSolver};

/// Valuation method for a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingStrategy {
    /// Discount projected flows on the curve.
    Discounting,
    /// Backward induction on a short-rate tree.
    ShortRateLattice,
    /// Backward induction on a joint stock and short-rate tree.
    ConvertibleLattice,
}

impl PricingStrategy {
    /// Chooses the method from the features present in `terms`.
    #[must_use]
    pub fn select(terms: &BondTerms) -> Self {
        if terms.is_convertible() {
            Self::ConvertibleLattice
        } else if !terms.puts.is_empty() || terms.calls.iter().any(|c| !c.is_make_whole()) {
            Self::ShortRateLattice
        } else {
            Self::Discounting
        }
    }
}

/// Measures at the quoted market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketMeasures {
    /// Dirty price implied by the quote.
    pub dirty_price: f64,
    /// Yield to maturity.
    pub yield_to_maturity: SolveOutcome,
    /// Yield to worst over calls and maturity.
    pub yield_to_worst: ExerciseYield,
    /// Z-spread over the discount curve.
    pub z_spread: SolveOutcome,
    /// Survival-weighted spread with recovery.
    pub r_spread: SolveOutcome,
    /// CDS-implied level and spread.
    pub cds_implied: CdsImpliedSpread,
    /// Par-par asset swap spread.
    pub asset_swap_spread: f64,
    /// Discount margin, for floaters.
    pub discount_margin: Option<SolveOutcome>,
}

/// Output of [`BondAnalytics::price`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Method used for the model price.
    pub strategy: PricingStrategy,
    /// Model price including accrued interest, per 100 face.
    pub dirty_price: f64,
    /// Model price excluding accrued interest.
    pub clean_price: f64,
    /// Accrued interest at the entitlement date.
    pub accrued: f64,
    /// `dirty_price × notional / 100`.
    pub market_value: f64,
    /// Yields and spreads at the market quote, if one was given.
    pub market: Option<MarketMeasures>,
    /// Lattice details for callable and puttable bonds.
    pub callable: Option<CallableResult>,
    /// Lattice details for convertibles.
    pub convertible: Option<ConvertibleResult>,
}

impl PricingResult {
    fn dead(strategy: PricingStrategy) -> Self {
        Self {
            strategy,
            dirty_price: 0.0,
            clean_price: 0.0,
            accrued: 0.0,
            market_value: 0.0,
            market: None,
            callable: None,
            convertible: None,
        }
    }
}

/// Prices one bond in one context.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tenor_analytics::prelude::*;
/// use tenor_bonds::prelude::*;
/// use tenor_core::prelude::*;
/// use tenor_curves::FlatCurve;
///
/// let settle = Date::from_ymd(2025, 1, 15).unwrap();
/// let terms = BondTerms::fixed(
///     settle,
///     Date::from_ymd(2030, 1, 15).unwrap(),
///     0.05,
///     Frequency::SemiAnnual,
///     DayCountConvention::Thirty360US,
/// );
/// let bond = Bond::new(terms).unwrap();
/// let ctx = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.04)))
///     .with_quote(MarketQuote::CleanPrice(101.0));
///
/// let result = BondAnalytics::new(&bond, &ctx).unwrap().price().unwrap();
/// assert_eq!(result.strategy, PricingStrategy::Discounting);
/// assert!(result.market.unwrap().z_spread.is_converged());
/// ```
pub struct BondAnalytics<'a> {
    bond: &'a Bond,
    ctx: &'a PricingContext,
    strategy: PricingStrategy,
}

impl std::fmt::Debug for BondAnalytics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondAnalytics")
            .field("strategy", &self.strategy)
            .field("settle", &self.ctx.settle)
            .finish_non_exhaustive()
    }
}

impl<'a> BondAnalytics<'a> {
    /// Validates the context and selects the strategy.
    pub fn new(bond: &'a Bond, ctx: &'a PricingContext) -> AnalyticsResult<Self> {
        ctx.validate()?;
        Ok(Self {
            bond,
            ctx,
            strategy: PricingStrategy::select(bond.terms()),
        })
    }

    /// The selected strategy.
    #[must_use]
    pub fn strategy(&self) -> PricingStrategy {
        self.strategy
    }

    /// Overrides the selected strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PricingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Model price plus market measures.
    ///
    /// Matured and defaulted bonds price at 0 with no further measures.
    pub fn price(&self) -> AnalyticsResult<PricingResult> {
        if self.bond.terms().is_dead(self.ctx.entitlement_date()) {
            tracing::debug!(strategy = ?self.strategy, "bond is dead at settle, pricing at zero");
            return Ok(PricingResult::dead(self.strategy));
        }

        let (dirty_price, callable, convertible) = match self.strategy {
            PricingStrategy::Discounting => (self.discounted_price()?, None, None),
            PricingStrategy::ShortRateLattice => {
                let result = CallableLattice::new(self.bond, self.ctx)?.price()?;
                (result.dirty_price, Some(result), None)
            }
            PricingStrategy::ConvertibleLattice => {
                let result = ConvertibleLattice::new(self.bond, self.ctx)?.price()?;
                (result.dirty_price, None, Some(result))
            }
        };
        let accrued = self.bond.accrued_interest(self.ctx.entitlement_date()).amount;
        let market = match market_dirty_price(self.bond, self.ctx)? {
            Some(quoted) => Some(self.market_measures(quoted)?),
            None => None,
        };

        Ok(PricingResult {
            strategy: self.strategy,
            dirty_price,
            clean_price: dirty_price - accrued,
            accrued,
            market_value: dirty_price * self.ctx.notional / 100.0,
            market,
            callable,
            convertible,
        })
    }

    /// Curve price, survival-weighted when the context has a survival curve.
    fn discounted_price(&self) -> AnalyticsResult<f64> {
        let flows = DiscountedFlows::new(self.bond, self.ctx)?;
        Ok(match &self.ctx.survival_curve {
            Some(curve) => flows.credit_price(
                0.0,
                conditional_survival(curve.as_ref(), self.ctx.settle),
                self.ctx.recovery(),
            ),
            None => flows.price(),
        })
    }

    /// Yields and spreads at a quoted dirty price.
    pub fn market_measures(&self, dirty_price: f64) -> AnalyticsResult<MarketMeasures> {
        let yields = YieldSolver::new(self.bond, self.ctx)?;
        let discount_margin = if self.bond.terms().is_floating() {
            Some(DiscountMarginCalculator::new(self.bond, self.ctx)?.calculate(dirty_price))
        } else {
            None
        };
        Ok(MarketMeasures {
            dirty_price,
            yield_to_maturity: yields.yield_to_maturity(dirty_price),
            yield_to_worst: yields.yield_to_worst(dirty_price),
            z_spread: ZSpreadCalculator::new(self.bond, self.ctx)?.calculate(dirty_price),
            r_spread: RSpreadCalculator::new(self.bond, self.ctx)?.calculate(dirty_price),
            cds_implied: CdsImpliedCalculator::new(self.bond, self.ctx)?.calculate(dirty_price),
            asset_swap_spread: AssetSwapCalculator::new(self.bond, self.ctx)?.calculate(dirty_price)?,
            discount_margin,
        })
    }
}
