//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`Family`, `NetworkMethod`, `CvMeasure`)
//! - the options records forwarded by the facades (`NetworkOptions`, `GlmParams`, `CvParams`)
//! - in-memory data (`Dataset`) and the CLI run configuration (`RunConfig`)

pub mod types;

pub use types::*;
