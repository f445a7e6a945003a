//! Z-spread (zero-volatility spread) calculator.
//!
//! The Z-spread is the constant continuously-compounded shift of the
//! discount curve that reprices the bond:
//!
//! ```text
//! Dirty Price = Σ CF_i × DF(t_i) × exp(-Z × t_i)
//! ```
//!
//! It is a pure rates measure and never reads the survival curve.

use tenor_bonds::Bond;
use tenor_math::solvers::SolverConfig;

use crate::config::Bracket;
use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::pricing::DiscountedFlows;
use crate::solve::SolveOutcome;

use super::solve_bracketed;

/// Z-spread calculator for one bond under one context.
pub struct ZSpreadCalculator<'a> {
    bond: &'a Bond,
    flows: DiscountedFlows,
    config: SolverConfig,
    bracket: Bracket,
}

impl std::fmt::Debug for ZSpreadCalculator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZSpreadCalculator")
            .field("config", &self.config)
            .field("bracket", &self.bracket)
            .finish_non_exhaustive()
    }
}

impl<'a> ZSpreadCalculator<'a> {
    /// Projects and discounts the bond's flows under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        Ok(Self {
            bond,
            flows: DiscountedFlows::new(bond, ctx)?,
            config: ctx.config.solver_config(),
            bracket: ctx.config.spread_bracket,
        })
    }

    /// Sets the solver tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config = SolverConfig::new(tolerance, self.config.max_iterations);
        self
    }

    /// Z-spread matching `dirty_price`.
    #[must_use]
    pub fn calculate(&self, dirty_price: f64) -> SolveOutcome {
        if self.flows.is_empty() || self.bond.terms().is_dead(self.flows.settle()) {
            return SolveOutcome::exact(0.0);
        }
        solve_bracketed(
            "z_spread",
            |z| self.flows.price_with_spread(z) - dirty_price,
            self.bracket,
            &self.config,
        )
    }

    /// Dirty price at a Z-spread.
    #[must_use]
    pub fn price_with_spread(&self, z_spread: f64) -> f64 {
        if self.bond.terms().is_dead(self.flows.settle()) {
            return 0.0;
        }
        self.flows.price_with_spread(z_spread)
    }

    /// Price change for a one basis point increase in spread.
    #[must_use]
    pub fn spread_dv01(&self, z_spread: f64) -> f64 {
        self.price_with_spread(z_spread) - self.price_with_spread(z_spread + 1e-4)
    }
}
