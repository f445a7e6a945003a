//! Discount margin for floating rate notes.
//!
//! Coupons are projected from the discount curve's forwards plus the
//! quoted margin. Each flow is then discounted period by period at the
//! index forward plus the discount margin:
//!
//! ```text
//! Price = Σ CF_i × Π_{k<=i} 1 / (1 + (F_k + DM) × τ_k)
//! ```
//!
//! A floater priced at par on a reset date has a discount margin equal to
//! its quoted margin.

use rust_decimal::prelude::ToPrimitive;

use tenor_bonds::cashflows::BondCashflow;
use tenor_bonds::Bond;
use tenor_core::daycounts::DayCount;
use tenor_core::types::Date;
use tenor_math::solvers::SolverConfig;

use crate::config::Bracket;
use crate::context::PricingContext;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::pricing::projected_flows;
use crate::solve::SolveOutcome;

use super::solve_bracketed;

#[derive(Debug, Clone, Copy)]
struct MarginStep {
    amount: f64,
    forward: f64,
    tau: f64,
}

/// Discount margin calculator for floaters.
pub struct DiscountMarginCalculator<'a> {
    bond: &'a Bond,
    settle: Date,
    steps: Vec<MarginStep>,
    config: SolverConfig,
    bracket: Bracket,
}

impl std::fmt::Debug for DiscountMarginCalculator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountMarginCalculator")
            .field("settle", &self.settle)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl<'a> DiscountMarginCalculator<'a> {
    /// Projects the floater's flows under `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Unsupported` for fixed-rate bonds.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        if !bond.terms().is_floating() {
            return Err(AnalyticsError::unsupported(
                "discount margin needs floating-rate terms",
            ));
        }
        let flows = projected_flows(bond, ctx)?;
        let steps = Self::steps(bond, ctx, &flows);
        Ok(Self {
            bond,
            settle: ctx.settle,
            steps,
            config: ctx.config.solver_config(),
            bracket: ctx.config.spread_bracket,
        })
    }

    fn steps(bond: &Bond, ctx: &PricingContext, flows: &[BondCashflow]) -> Vec<MarginStep> {
        let curve = ctx.discount_curve.as_ref();
        let day_count = bond.terms().day_count;
        let mut previous = ctx.settle;
        flows
            .iter()
            .map(|cf| {
                let end = cf.accrual_end.max(previous);
                let tau = day_count
                    .year_fraction(previous, end)
                    .to_f64()
                    .unwrap_or(0.0);
                let forward = if tau > 0.0 {
                    (curve.discount_factor_between(previous, end).recip() - 1.0) / tau
                } else {
                    0.0
                };
                previous = end;
                MarginStep {
                    amount: cf.amount(),
                    forward,
                    tau,
                }
            })
            .collect()
    }

    /// Dirty price at a discount margin.
    #[must_use]
    pub fn price_with_margin(&self, margin: f64) -> f64 {
        if self.bond.terms().is_dead(self.settle) {
            return 0.0;
        }
        let mut factor = 1.0;
        self.steps
            .iter()
            .map(|step| {
                factor /= 1.0 + (step.forward + margin) * step.tau;
                step.amount * factor
            })
            .sum()
    }

    /// Discount margin matching `dirty_price`.
    #[must_use]
    pub fn calculate(&self, dirty_price: f64) -> SolveOutcome {
        if self.steps.is_empty() || self.bond.terms().is_dead(self.settle) {
            return SolveOutcome::exact(0.0);
        }
        solve_bracketed(
            "discount_margin",
            |dm| self.price_with_margin(dm) - dirty_price,
            self.bracket,
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use tenor_bonds::types::{BondTerms, FloatingTerms};
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::Frequency;
    use tenor_curves::{DiscountCurve, FlatCurve};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn par_floater_margin_is_quoted_margin() {
        let settle = d(2025, 1, 15);
        let curve = FlatCurve::new(settle, 0.04);
        let first_end = d(2025, 4, 15);
        let tau = 90.0 / 360.0;
        let first_fixing = (curve.discount_factor_between(settle, first_end).recip() - 1.0) / tau;
        let terms = BondTerms::fixed(settle, d(2028, 1, 15), 0.0, Frequency::Quarterly, DayCountConvention::Act360)
            .with_floating(FloatingTerms::new("SOFR", 0.01).with_current_rate(first_fixing));
        let b = Bond::new(terms).unwrap();
        let ctx = PricingContext::new(settle, Arc::new(curve));
        let calc = DiscountMarginCalculator::new(&b, &ctx).unwrap();
        assert_relative_eq!(calc.price_with_margin(0.01), 100.0, epsilon = 1e-9);
        let dm = calc.calculate(100.0);
        assert!(dm.is_converged());
        assert_relative_eq!(dm.value, 0.01, epsilon = 1e-8);
    }

    #[test]
    fn fixed_bond_is_unsupported() {
        let settle = d(2025, 1, 15);
        let b = Bond::new(BondTerms::fixed(settle, d(2028, 1, 15), 0.05, Frequency::Quarterly, DayCountConvention::Act360))
            .unwrap();
        let ctx = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.04)));
        assert!(matches!(
            DiscountMarginCalculator::new(&b, &ctx),
            Err(AnalyticsError::Unsupported { .. })
        ));
    }
}
