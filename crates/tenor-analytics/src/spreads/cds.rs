//! CDS-implied level and spread.
//!
//! The level is the flat CDS spread `s` such that pricing under the flat
//! hazard `h = s / (1 - R)`, discounting risk-free, reproduces the market
//! price. Bond price as a function of `s` need not be monotone: with
//! recovery paid at default it falls to a minimum and then rises towards
//! `R × 100`. The solve therefore:
//!
//! 1. returns exactly 0 when the market price is at or above the risk-free price
//! 2. samples `[0, max_spread]`, locates the sampled minimum `s_min` and runs
//!    Brent on `[0, s_min]` when the market lies on the falling branch and no
//!    later sample reaches it again
//! 3. otherwise (market below the minimum, or a second root on the rising
//!    branch) falls back to the fixed point `s = (P_rf - P_mkt) / RD(s)`,
//!    where `RD` is the risky premium-leg duration

use serde::{Deserialize, Serialize};

use tenor_bonds::Bond;
use tenor_math::solvers::{brent, fixed_point, scan_bracket, SolverConfig};

use crate::config::CdsSettings;
use crate::context::PricingContext;
use crate::error::AnalyticsResult;
use crate::pricing::DiscountedFlows;
use crate::solve::{SolveFailure, SolveOutcome};

const SCAN_POINTS: usize = 50;

/// Result of a CDS-implied solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdsImpliedSpread {
    /// Flat CDS level explaining the price.
    pub level: SolveOutcome,
    /// Level less the survival curve's flat spread (the level itself without one).
    pub spread: f64,
    /// Flat hazard rate of the level.
    pub hazard_rate: f64,
    /// True if the fixed-point fallback produced the level.
    pub used_fallback: bool,
}

/// CDS-implied level calculator.
pub struct CdsImpliedCalculator<'a> {
    bond: &'a Bond,
    flows: DiscountedFlows,
    recovery: f64,
    curve_spread: Option<f64>,
    settings: CdsSettings,
    config: SolverConfig,
}

impl std::fmt::Debug for CdsImpliedCalculator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdsImpliedCalculator")
            .field("recovery", &self.recovery)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> CdsImpliedCalculator<'a> {
    /// Projects and discounts the bond's flows under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        let curve_spread = match &ctx.survival_curve {
            Some(curve) => {
                let spread = curve.flat_spread();
                if spread.is_none() {
                    tracing::debug!("survival curve has no flat spread; reporting the level");
                }
                spread
            }
            None => None,
        };
        Ok(Self {
            bond,
            flows: DiscountedFlows::new(bond, ctx)?,
            recovery: ctx.recovery(),
            curve_spread,
            settings: ctx.config.cds,
            config: ctx.config.solver_config(),
        })
    }

    /// Overrides the CDS solve settings.
    #[must_use]
    pub fn with_settings(mut self, settings: CdsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Flat hazard rate of a CDS level.
    #[must_use]
    pub fn hazard_rate(&self, level: f64) -> f64 {
        level / (1.0 - self.recovery)
    }

    /// Dirty price under the flat hazard of `level`.
    #[must_use]
    pub fn price_at_level(&self, level: f64) -> f64 {
        let h = self.hazard_rate(level);
        self.flows
            .credit_price(0.0, |t| (-h * t).exp(), self.recovery)
    }

    /// Risky premium-leg duration at `level`.
    #[must_use]
    pub fn risky_duration(&self, level: f64) -> f64 {
        let h = self.hazard_rate(level);
        self.flows.risky_duration(|t| (-h * t).exp())
    }

    /// Solves the level, hazard and spread for `dirty_price`.
    #[must_use]
    pub fn calculate(&self, dirty_price: f64) -> CdsImpliedSpread {
        let (level, used_fallback) = self.solve_level(dirty_price);
        let spread = level.value - self.curve_spread.unwrap_or(0.0);
        CdsImpliedSpread {
            level,
            spread,
            hazard_rate: self.hazard_rate(level.value),
            used_fallback,
        }
    }

    fn solve_level(&self, dirty_price: f64) -> (SolveOutcome, bool) {
        if self.flows.is_empty() || self.bond.terms().is_dead(self.flows.settle()) {
            return (SolveOutcome::exact(0.0), false);
        }
        let risk_free = self.flows.price();
        if dirty_price >= risk_free {
            return (SolveOutcome::exact(0.0), false);
        }

        let max = self.settings.max_spread;
        let grid: Vec<f64> = (0..=SCAN_POINTS)
            .map(|k| max * k as f64 / SCAN_POINTS as f64)
            .collect();
        let prices: Vec<f64> = grid.iter().map(|s| self.price_at_level(*s)).collect();
        let (min_index, min_price) = prices
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (k, p)| if p < best.1 { (k, p) } else { best });

        if dirty_price < min_price {
            tracing::debug!(
                max_spread = max,
                min_price,
                "market price below the sampled minimum; using risky-duration fallback"
            );
        } else if prices[min_index + 1..].iter().any(|p| *p >= dirty_price) {
            tracing::debug!(
                level_at_min = grid[min_index],
                "market price has a second root on the rising branch; using risky-duration fallback"
            );
        } else {
            let objective = |s: f64| self.price_at_level(s) - dirty_price;
            match scan_bracket(&objective, &grid[..=min_index]) {
                Ok((lo, hi)) if lo == hi => return (SolveOutcome::converged(lo, 0), false),
                Ok((lo, hi)) => {
                    let result = brent(&objective, lo, hi, &self.config);
                    return (SolveOutcome::from_solver("cds_level", result), false);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "falling branch not bracketable; using risky-duration fallback");
                }
            }
        }

        if !self.settings.fallback_enabled {
            return (
                SolveOutcome::failed(SolveFailure::NonMonotonicWithoutFallback, 0),
                false,
            );
        }

        let gap = risk_free - dirty_price;
        let iteration = |s: f64| {
            let rd = self.risky_duration(s.max(0.0));
            if rd > 0.0 {
                gap / rd
            } else {
                f64::INFINITY
            }
        };
        let start = iteration(0.0);
        let outcome = match fixed_point(iteration, start, &self.config) {
            Ok(r) => SolveOutcome::converged(r.root, r.iterations),
            Err(err) => {
                tracing::warn!(
                    solver = "cds_fallback",
                    iterations = self.config.max_iterations,
                    error = %err,
                    "risky-duration fallback did not converge"
                );
                SolveOutcome::failed(SolveFailure::MaxIterations, self.config.max_iterations)
            }
        };
        (outcome, true)
    }
}
