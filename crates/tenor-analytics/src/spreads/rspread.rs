//! R-spread: a curve shift applied jointly to discounting and the recovery leg.
//!
//! ```text
//! Dirty Price = Σ CF_i × Z_i × e^{-s t_i} × Q(t_i) + R × Σ N_k × Z_k × e^{-s t_k} × ΔQ_k
//! ```
//!
//! Without a survival curve `Q = 1` and the R-spread equals the Z-spread.

use std::sync::Arc;

use tenor_bonds::Bond;
use tenor_curves::SurvivalCurve;
use tenor_math::solvers::SolverConfig;

use crate::config::Bracket;
use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::pricing::{conditional_survival, DiscountedFlows};
use crate::solve::SolveOutcome;

use super::solve_bracketed;

/// R-spread calculator.
pub struct RSpreadCalculator<'a> {
    bond: &'a Bond,
    flows: DiscountedFlows,
    survival: Option<Arc<dyn SurvivalCurve>>,
    recovery: f64,
    config: SolverConfig,
    bracket: Bracket,
}

impl std::fmt::Debug for RSpreadCalculator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RSpreadCalculator")
            .field("recovery", &self.recovery)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> RSpreadCalculator<'a> {
    /// Projects and discounts the bond's flows under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        Ok(Self {
            bond,
            flows: DiscountedFlows::new(bond, ctx)?,
            survival: ctx.survival_curve.clone(),
            recovery: ctx.recovery(),
            config: ctx.config.solver_config(),
            bracket: ctx.config.spread_bracket,
        })
    }

    /// Dirty price at an R-spread.
    #[must_use]
    pub fn price_with_spread(&self, spread: f64) -> f64 {
        if self.bond.terms().is_dead(self.flows.settle()) {
            return 0.0;
        }
        match &self.survival {
            Some(curve) => self.flows.credit_price(
                spread,
                conditional_survival(curve.as_ref(), self.flows.settle()),
                self.recovery,
            ),
            None => self.flows.price_with_spread(spread),
        }
    }

    /// R-spread matching `dirty_price`.
    #[must_use]
    pub fn calculate(&self, dirty_price: f64) -> SolveOutcome {
        if self.flows.is_empty() || self.bond.terms().is_dead(self.flows.settle()) {
            return SolveOutcome::exact(0.0);
        }
        solve_bracketed(
            "r_spread",
            |s| self.price_with_spread(s) - dirty_price,
            self.bracket,
            &self.config,
        )
    }
}
