//! # Tenor Curves
//!
//! The pricing engine reads market curves through two narrow traits:
//!
//! - [`DiscountCurve`]: date or time to discount factor
//! - [`SurvivalCurve`]: date or time to survival probability, plus recovery
//!
//! Curves are immutable. Sensitivity bumps produce a new value
//! ([`ShiftedCurve`]) that wraps the original snapshot behind an `Arc`,
//! so concurrent pricing calls can share the base curve safely.
//!
//! Bootstrapping is not provided; [`FlatCurve`], [`ZeroCurve`],
//! [`FlatHazardCurve`] and [`PiecewiseHazardCurve`] are built directly from
//! rates or hazards.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

pub mod discount;
pub mod error;
pub mod shifted;
pub mod survival;
pub mod traits;

pub use discount::{FlatCurve, ZeroCurve};
pub use error::{CurveError, CurveResult};
pub use shifted::{CurveShift, ShiftedCurve};
pub use survival::{FlatHazardCurve, PiecewiseHazardCurve};
pub use traits::{time_from, DiscountCurve, SurvivalCurve};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::discount::{FlatCurve, ZeroCurve};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::shifted::{CurveShift, ShiftedCurve};
    pub use crate::survival::{FlatHazardCurve, PiecewiseHazardCurve};
    pub use crate::traits::{DiscountCurve, SurvivalCurve};
}
