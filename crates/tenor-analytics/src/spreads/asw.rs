//! Par-par asset swap spread.
//!
//! The buyer pays par for the bond and enters a swap paying the bond's
//! coupons against floating plus the asset swap spread. The upfront
//! difference between the curve value and the dirty price is amortized over
//! the annuity:
//!
//! ```text
//! ASW = (P_curve - P_dirty) / Σ τ_i × N_i × Z_i
//! ```

use tenor_bonds::Bond;

use crate::context::PricingContext;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::pricing::DiscountedFlows;

/// Par-par asset swap spread calculator.
#[derive(Debug, Clone)]
pub struct AssetSwapCalculator<'a> {
    bond: &'a Bond,
    flows: DiscountedFlows,
}

impl<'a> AssetSwapCalculator<'a> {
    /// Projects and discounts the bond's flows under `ctx`.
    pub fn new(bond: &'a Bond, ctx: &PricingContext) -> AnalyticsResult<Self> {
        Ok(Self {
            bond,
            flows: DiscountedFlows::new(bond, ctx)?,
        })
    }

    /// Asset swap spread for `dirty_price`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidInput` when no coupon accrues after
    /// settlement, so the annuity is zero.
    pub fn calculate(&self, dirty_price: f64) -> AnalyticsResult<f64> {
        if self.flows.is_empty() || self.bond.terms().is_dead(self.flows.settle()) {
            return Ok(0.0);
        }
        let annuity = self.flows.annuity();
        if annuity <= 0.0 {
            return Err(AnalyticsError::invalid_input(
                "annuity is zero - no accrual after settlement",
            ));
        }
        Ok((self.flows.price() - dirty_price) / annuity)
    }

    /// The swap annuity.
    #[must_use]
    pub fn annuity(&self) -> f64 {
        self.flows.annuity()
    }
}
