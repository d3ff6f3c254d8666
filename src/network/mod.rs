//! Feature network -> degree -> penalty factor.
//!
//! Responsibilities:
//!
//! - build a feature network from the data (or accept a precomputed one)
//! - compute per-feature degree
//! - turn degrees into penalty factors through a `DegreeTransform`

pub mod build;
pub mod penalty;
pub mod transform;

pub use build::*;
pub use penalty::*;
pub use transform::*;
