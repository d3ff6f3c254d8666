//! Penalized GLM fitting.
//!
//! Responsibilities:
//!
//! - generate decreasing lambda paths
//! - solve the elastic-net problem along a path (coordinate descent + IRLS)
//! - cross-validate the path over K folds (parallel)

pub mod coordinate;
pub mod cv;
pub mod elastic_net;
pub mod lambda_path;

pub use coordinate::*;
pub use cv::*;
pub use elastic_net::*;
pub use lambda_path::*;
