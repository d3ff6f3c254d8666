//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - coefficient / data set CSV exports (`export`)
//! - fitted model JSON read/write (`model`)

pub mod export;
pub mod ingest;
pub mod model;

pub use export::*;
pub use ingest::*;
pub use model::*;
