//! # Tenor Analytics
//!
//! Valuation of bonds from their projected cashflows:
//!
//! - **Pricing**: discounting, with optional survival weighting and recovery
//! - **Yields**: yield to maturity, to call, to put and to worst under each
//!   bond type's yield convention
//! - **Spreads**: Z-spread, R-spread, CDS-implied level, asset swap spread
//!   and discount margin
//! - **Lattices**: callable and puttable bonds on a short-rate tree;
//!   convertibles on a joint stock and short-rate tree
//! - **Engine**: strategy selection and a one-call facade, plus batch pricing
//!
//! Solves never fail silently: every yield and spread is a
//! [`SolveOutcome`] that carries either a value or a reason.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tenor_analytics::prelude::*;
//! use tenor_bonds::prelude::*;
//! use tenor_core::prelude::*;
//! use tenor_curves::FlatCurve;
//!
//! let settle = Date::from_ymd(2025, 1, 15).unwrap();
//! let bond = Bond::new(BondTerms::fixed(
//!     settle,
//!     Date::from_ymd(2035, 1, 15).unwrap(),
//!     0.05,
//!     Frequency::SemiAnnual,
//!     DayCountConvention::Thirty360US,
//! ))
//! .unwrap();
//! let ctx = PricingContext::new(settle, Arc::new(FlatCurve::new(settle, 0.05)));
//!
//! let price = DiscountedFlows::new(&bond, &ctx).unwrap().price();
//! let ytm = YieldSolver::new(&bond, &ctx).unwrap().yield_to_maturity(price);
//! assert!(ytm.is_converged());
//! ```
//!
//! ## Features
//!
//! - `parallel`: evaluates lattice layers and batches with rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::float_cmp)]

pub mod batch;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod parallel;
pub mod pricing;
pub mod solve;
pub mod spreads;
pub mod yields;

pub use error::{AnalyticsError, AnalyticsResult};
pub use solve::{SolveFailure, SolveOutcome};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::batch::{price_batch, PricingRequest};
    pub use crate::config::{Bracket, CdsSettings, LatticeSettings, ParallelSettings, PricingConfig, SolverSettings};
    pub use crate::context::{DiscreteDividend, MarketQuote, PricingContext, StockParams, VolatilityParams};
    pub use crate::engine::{BondAnalytics, MarketMeasures, PricingResult, PricingStrategy};
    pub use crate::error::{AnalyticsError, AnalyticsResult};
    pub use crate::lattice::{CallableLattice, CallableResult, ConvertibleLattice, ConvertibleResult};
    pub use crate::pricing::DiscountedFlows;
    pub use crate::solve::{SolveFailure, SolveOutcome};
    pub use crate::spreads::{
        AssetSwapCalculator, CdsImpliedCalculator, CdsImpliedSpread, DiscountMarginCalculator,
        RSpreadCalculator, ZSpreadCalculator,
    };
    pub use crate::yields::{ExerciseYield, YieldSolver};
}
