//! Lattice valuation of bonds with embedded options.
//!
//! - [`TimeGrid`]: settle-anchored grid that lands on every key date
//! - [`ShortRateTree`]: binomial short-rate tree fitted to the discount curve
//! - [`CallableLattice`]: calls and puts by backward induction
//! - [`ConvertibleLattice`]: conversion on a joint stock and rate tree
//!
//! Exercise is never allowed at the root node.

mod callable;
mod convertible;
mod grid;
mod short_rate;

pub use callable::{CallableLattice, CallableResult};
pub use convertible::{ConvertibleLattice, ConvertibleResult};
pub use grid::TimeGrid;
pub use short_rate::{ShortRateTree, TreeDiagnostics};
