//! Market inputs for a valuation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tenor_core::types::Date;
use tenor_curves::{DiscountCurve, SurvivalCurve};

use crate::config::PricingConfig;
use crate::error::{AnalyticsError, AnalyticsResult};

/// A market quote for the bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarketQuote {
    /// Clean price per 100 face.
    CleanPrice(f64),
    /// Dirty price per 100 face.
    DirtyPrice(f64),
    /// Yield to maturity under the bond's convention.
    Yield(f64),
}

/// Short-rate model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityParams {
    /// Short-rate (normal) volatility.
    pub sigma: f64,
    /// Mean reversion speed.
    pub mean_reversion: f64,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            sigma: 0.01,
            mean_reversion: 0.03,
        }
    }
}

impl VolatilityParams {
    /// Creates volatility parameters.
    #[must_use]
    pub fn new(sigma: f64, mean_reversion: f64) -> Self {
        Self {
            sigma,
            mean_reversion,
        }
    }

    /// Variance of the short rate at time `t`.
    #[must_use]
    pub fn variance(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        let s2 = self.sigma * self.sigma;
        if a.abs() < 1e-12 {
            s2 * t
        } else {
            s2 * (1.0 - (-2.0 * a * t).exp()) / (2.0 * a)
        }
    }
}

/// A proportional cash dividend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteDividend {
    /// Ex date.
    pub date: Date,
    /// Fraction of the stock price paid out.
    pub proportion: f64,
}

/// Underlying stock of a convertible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockParams {
    /// Spot price.
    pub spot: f64,
    /// Lognormal volatility.
    pub volatility: f64,
    /// Continuous dividend yield.
    pub dividend_yield: f64,
    /// Discrete proportional dividends.
    pub dividends: Vec<DiscreteDividend>,
    /// Correlation between stock and short rate.
    pub correlation: f64,
}

impl StockParams {
    /// Stock with no dividends and zero correlation.
    #[must_use]
    pub fn new(spot: f64, volatility: f64) -> Self {
        Self {
            spot,
            volatility,
            dividend_yield: 0.0,
            dividends: Vec::new(),
            correlation: 0.0,
        }
    }

    /// Sets the continuous dividend yield.
    #[must_use]
    pub fn with_dividend_yield(mut self, q: f64) -> Self {
        self.dividend_yield = q;
        self
    }

    /// Adds a proportional dividend.
    #[must_use]
    pub fn with_dividend(mut self, date: Date, proportion: f64) -> Self {
        self.dividends.push(DiscreteDividend { date, proportion });
        self
    }

    /// Sets the stock/rate correlation.
    #[must_use]
    pub fn with_correlation(mut self, rho: f64) -> Self {
        self.correlation = rho;
        self
    }

    /// Same stock at a different spot.
    #[must_use]
    pub fn with_spot(&self, spot: f64) -> Self {
        Self {
            spot,
            ..self.clone()
        }
    }
}

/// Everything a valuation needs besides the bond.
#[derive(Clone)]
pub struct PricingContext {
    /// Valuation date.
    pub as_of: Date,
    /// Pricing settlement date; discounting starts here.
    pub settle: Date,
    /// Trade settlement date, when different; drives accrued and entitlement.
    pub trade_settle: Option<Date>,
    /// Risk-free discount curve.
    pub discount_curve: Arc<dyn DiscountCurve>,
    /// Issuer survival curve.
    pub survival_curve: Option<Arc<dyn SurvivalCurve>>,
    /// Recovery rate used when no survival curve provides one.
    pub recovery_rate: f64,
    /// Position face amount, for market values.
    pub notional: f64,
    /// Market quote.
    pub quote: Option<MarketQuote>,
    /// Short-rate model parameters.
    pub volatility: VolatilityParams,
    /// Underlying stock of a convertible.
    pub stock: Option<StockParams>,
    /// Pricing configuration.
    pub config: PricingConfig,
}

impl fmt::Debug for PricingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingContext")
            .field("as_of", &self.as_of)
            .field("settle", &self.settle)
            .field("trade_settle", &self.trade_settle)
            .field("curve_reference", &self.discount_curve.reference_date())
            .field("has_survival_curve", &self.survival_curve.is_some())
            .field("quote", &self.quote)
            .finish_non_exhaustive()
    }
}

impl PricingContext {
    /// A context settling on `settle` against `discount_curve`.
    #[must_use]
    pub fn new(settle: Date, discount_curve: Arc<dyn DiscountCurve>) -> Self {
        Self {
            as_of: settle,
            settle,
            trade_settle: None,
            discount_curve,
            survival_curve: None,
            recovery_rate: 0.4,
            notional: 100.0,
            quote: None,
            volatility: VolatilityParams::default(),
            stock: None,
            config: PricingConfig::default(),
        }
    }

    /// Sets the valuation date.
    #[must_use]
    pub fn with_as_of(mut self, as_of: Date) -> Self {
        self.as_of = as_of;
        self
    }

    /// Sets a trade settlement date.
    #[must_use]
    pub fn with_trade_settle(mut self, date: Date) -> Self {
        self.trade_settle = Some(date);
        self
    }

    /// Sets the survival curve.
    #[must_use]
    pub fn with_survival_curve(mut self, curve: Arc<dyn SurvivalCurve>) -> Self {
        self.survival_curve = Some(curve);
        self
    }

    /// Sets the recovery rate.
    #[must_use]
    pub fn with_recovery_rate(mut self, recovery: f64) -> Self {
        self.recovery_rate = recovery;
        self
    }

    /// Sets the position face amount.
    #[must_use]
    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Sets the market quote.
    #[must_use]
    pub fn with_quote(mut self, quote: MarketQuote) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Sets the short-rate parameters.
    #[must_use]
    pub fn with_volatility(mut self, volatility: VolatilityParams) -> Self {
        self.volatility = volatility;
        self
    }

    /// Sets the underlying stock.
    #[must_use]
    pub fn with_stock(mut self, stock: StockParams) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Sets the pricing configuration.
    #[must_use]
    pub fn with_config(mut self, config: PricingConfig) -> Self {
        self.config = config;
        self
    }

    /// Same context with a different discount curve.
    #[must_use]
    pub fn with_discount_curve(&self, curve: Arc<dyn DiscountCurve>) -> Self {
        Self {
            discount_curve: curve,
            ..self.clone()
        }
    }

    /// Date that decides accrued interest and which flows the buyer receives.
    #[must_use]
    pub fn entitlement_date(&self) -> Date {
        self.trade_settle.unwrap_or(self.settle)
    }

    /// Recovery from the survival curve, else the context's recovery rate.
    #[must_use]
    pub fn recovery(&self) -> f64 {
        self.survival_curve
            .as_ref()
            .map_or(self.recovery_rate, |c| c.recovery_rate())
    }

    /// The stock parameters, required by convertible pricing.
    pub fn stock(&self) -> AnalyticsResult<&StockParams> {
        self.stock
            .as_ref()
            .ok_or_else(|| AnalyticsError::missing_market_data("stock"))
    }

    /// Checks inputs are usable.
    pub fn validate(&self) -> AnalyticsResult<()> {
        self.config.validate()?;
        if self.settle < self.as_of {
            return Err(AnalyticsError::invalid_input(format!(
                "settle {} precedes as-of {}",
                self.settle, self.as_of
            )));
        }
        if !(0.0..1.0).contains(&self.recovery()) {
            return Err(AnalyticsError::invalid_input("recovery must be in [0, 1)"));
        }
        if self.volatility.sigma < 0.0 || !self.volatility.sigma.is_finite() {
            return Err(AnalyticsError::invalid_input("volatility must be non-negative"));
        }
        if let Some(stock) = &self.stock {
            if stock.spot.is_nan() || stock.volatility.is_nan() || stock.spot < 0.0 || stock.volatility < 0.0 {
                return Err(AnalyticsError::invalid_input("stock spot and volatility must be non-negative"));
            }
            if !(-1.0..=1.0).contains(&stock.correlation) {
                return Err(AnalyticsError::invalid_input("correlation must be in [-1, 1]"));
            }
        }
        Ok(())
    }
}
