//! Pricing many independent bonds.
//!
//! Requests share nothing mutable, so the batch is split across threads
//! when the `parallel` feature is on and the batch reaches the configured
//! threshold. Results keep request order.

use tenor_bonds::Bond;

use crate::config::ParallelSettings;
use crate::context::PricingContext;
use crate::engine::{BondAnalytics, PricingResult};
use crate::error::AnalyticsResult;
use crate::parallel::maybe_parallel_map;

/// One bond with the context to price it in.
#[derive(Debug, Clone)]
pub struct PricingRequest {
    /// Instrument.
    pub bond: Bond,
    /// Market data and configuration.
    pub context: PricingContext,
}

impl PricingRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(bond: Bond, context: PricingContext) -> Self {
        Self { bond, context }
    }

    /// Prices the request.
    pub fn price(&self) -> AnalyticsResult<PricingResult> {
        BondAnalytics::new(&self.bond, &self.context)?.price()
    }
}

/// Prices every request, one result per request in input order.
///
/// A failing request does not stop the others.
pub fn price_batch(
    requests: &[PricingRequest],
    settings: &ParallelSettings,
) -> Vec<AnalyticsResult<PricingResult>> {
    let results = maybe_parallel_map(requests, settings, PricingRequest::price);
    let failures = results.iter().filter(|r| r.is_err()).count();
    if failures > 0 {
        tracing::warn!(failures, total = requests.len(), "batch pricing had failed requests");
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VolatilityParams;
    use crate::error::AnalyticsError;
    use std::sync::Arc;
    use tenor_bonds::types::BondTerms;
    use tenor_core::daycounts::DayCountConvention;
    use tenor_core::types::{Date, Frequency};
    use tenor_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn request(years: i32, sigma: f64) -> PricingRequest {
        let settle = d(2025, 1, 15);
        let terms = BondTerms::fixed(
            settle,
            d(2025 + years, 1, 15),
            0.04,
            Frequency::SemiAnnual,
            DayCountConvention::Thirty360US,
        );
        let ctx = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.04)))
            .with_volatility(VolatilityParams::new(sigma, 0.05));
        PricingRequest::new(Bond::new(terms).unwrap(), ctx)
    }

    #[test]
    fn keeps_order_and_isolates_failures() {
        let requests = vec![request(2, 0.01), request(5, -1.0), request(10, 0.01)];
        let settings = ParallelSettings { enabled: true, threshold: 1 };
        let results = price_batch(&requests, &settings);
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(AnalyticsError::InvalidInput { .. })));

        let short = results[0].as_ref().unwrap();
        let long = results[2].as_ref().unwrap();
        assert!((short.dirty_price - 100.0).abs() < 1.0);
        assert!(long.dirty_price < short.dirty_price);
        assert_eq!(*short, requests[0].price().unwrap());
    }
}
