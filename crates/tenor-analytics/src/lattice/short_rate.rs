//! Recombining binomial short-rate tree fitted to a discount curve.
//!
//! Node rates follow
//!
//! ```text
//! r(i, j) = α_i + (2j - i) × s_i,    s_i = sqrt(V(t_i) / i)
//! ```
//!
//! so the rate spread at step `i` matches the Hull-White short-rate variance
//! `V(t) = σ²(1 - e^{-2at}) / 2a`. Branching probabilities are ½ and node
//! `(i, j)` moves to `(i+1, j)` or `(i+1, j+1)`. The shifts `α_i` are solved
//! by forward induction of Arrow-Debreu prices so that the tree reprices
//! every grid discount factor of the curve.
//!
//! ```text
//!                    [0,0]
//!                   /     \
//!              [1,1]       [1,0]
//!             /    \      /    \
//!         [2,2]   [2,1]  [2,1]  [2,0]
//! ```

use serde::{Deserialize, Serialize};

use tenor_curves::DiscountCurve;

use super::grid::TimeGrid;
use crate::config::ParallelSettings;
use crate::context::VolatilityParams;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::parallel::maybe_parallel_fill;

/// Calibration report of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeDiagnostics {
    /// Number of time steps.
    pub steps: usize,
    /// Total number of nodes.
    pub nodes: usize,
    /// Largest absolute gap between summed Arrow-Debreu prices and the curve.
    pub max_discount_error: f64,
    /// Lowest node rate.
    pub min_rate: f64,
    /// Highest node rate.
    pub max_rate: f64,
}

/// A calibrated short-rate tree on a [`TimeGrid`].
#[derive(Debug, Clone)]
pub struct ShortRateTree {
    grid: TimeGrid,
    alphas: Vec<f64>,
    spacings: Vec<f64>,
    discount_factors: Vec<f64>,
    diagnostics: TreeDiagnostics,
}

impl ShortRateTree {
    /// Builds and calibrates a tree.
    ///
    /// `curve` is sampled relative to the first grid date, so grid time 0 has
    /// a discount factor of 1.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidInput` if the curve gives a
    /// non-positive discount factor or calibration breaks down.
    pub fn build(
        grid: TimeGrid,
        curve: &dyn DiscountCurve,
        volatility: &VolatilityParams,
    ) -> AnalyticsResult<Self> {
        let base = curve.time(grid.dates()[0]);
        let df_base = curve.discount_factor_at(base);
        let discount_factors: Vec<f64> = grid
            .times()
            .iter()
            .map(|t| curve.discount_factor_at(base + t) / df_base)
            .collect();
        if discount_factors.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(AnalyticsError::invalid_input(
                "curve returned a non-positive discount factor",
            ));
        }

        let steps = grid.steps();
        let spacings: Vec<f64> = (0..steps)
            .map(|i| {
                if i == 0 {
                    0.0
                } else {
                    (volatility.variance(grid.times()[i]) / i as f64).sqrt()
                }
            })
            .collect();

        let mut alphas = Vec::with_capacity(steps);
        let mut prices = vec![1.0];
        let mut max_error: f64 = 0.0;
        let mut min_rate = f64::INFINITY;
        let mut max_rate = f64::NEG_INFINITY;

        for i in 0..steps {
            let dt = grid.dt(i);
            let s = spacings[i];
            let offset = |j: usize| (2.0 * j as f64 - i as f64) * s;
            let weighted: f64 = prices
                .iter()
                .enumerate()
                .map(|(j, q)| q * (-offset(j) * dt).exp())
                .sum();
            let alpha = (weighted.ln() - discount_factors[i + 1].ln()) / dt;
            if !alpha.is_finite() {
                return Err(AnalyticsError::invalid_input(format!(
                    "tree calibration failed at step {i}"
                )));
            }
            alphas.push(alpha);
            min_rate = min_rate.min(alpha + offset(0));
            max_rate = max_rate.max(alpha + offset(i));

            let mut next = vec![0.0; i + 2];
            for (j, q) in prices.iter().enumerate() {
                let carried = 0.5 * q * (-(alpha + offset(j)) * dt).exp();
                next[j] += carried;
                next[j + 1] += carried;
            }
            let sum: f64 = next.iter().sum();
            max_error = max_error.max((sum - discount_factors[i + 1]).abs());
            prices = next;
        }

        let diagnostics = TreeDiagnostics {
            steps,
            nodes: (steps + 1) * (steps + 2) / 2,
            max_discount_error: max_error,
            min_rate,
            max_rate,
        };
        tracing::debug!(
            steps,
            nodes = diagnostics.nodes,
            max_discount_error = max_error,
            "short-rate tree calibrated"
        );

        Ok(Self {
            grid,
            alphas,
            spacings,
            discount_factors,
            diagnostics,
        })
    }

    /// The time grid.
    #[must_use]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of time steps.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.grid.steps()
    }

    /// Short rate at node `(i, j)` for `i < steps`.
    #[must_use]
    pub fn rate(&self, i: usize, j: usize) -> f64 {
        self.alphas[i] + (2.0 * j as f64 - i as f64) * self.spacings[i]
    }

    /// Calibrated shift of step `i`.
    #[must_use]
    pub fn alpha(&self, i: usize) -> f64 {
        self.alphas[i]
    }

    /// Curve discount factor to grid point `i`.
    #[must_use]
    pub fn discount_factor(&self, i: usize) -> f64 {
        self.discount_factors[i]
    }

    /// Calibration report.
    #[must_use]
    pub fn diagnostics(&self) -> TreeDiagnostics {
        self.diagnostics
    }

    /// Discount factor over step `i` from node `(i, j)` with a spread.
    #[must_use]
    pub fn step_discount(&self, i: usize, j: usize, spread: f64) -> f64 {
        (-(self.rate(i, j) + spread) * self.grid.dt(i)).exp()
    }

    /// Expected discounted value at layer `i` of the layer `i + 1` values.
    #[must_use]
    pub fn rollback(
        &self,
        next: &[f64],
        i: usize,
        spread: f64,
        parallel: &ParallelSettings,
    ) -> Vec<f64> {
        maybe_parallel_fill(i + 1, parallel, |j| {
            self.step_discount(i, j, spread) * 0.5 * (next[j] + next[j + 1])
        })
    }
}
