//! GLM family evaluation and fitted path models.
//!
//! Families are implemented as small, pure functions so that the solver can
//! stay generic over the outcome type.

pub mod family;
pub mod path;

pub use family::*;
pub use path::*;
