//! `netglm` library crate.
//!
//! Network-penalized elastic-net regression: feature networks are turned into
//! per-feature degrees, degrees into penalty factors, and penalty factors into
//! a glmnet-style regularization path (optionally cross-validated).
//!
//! The binary (`netglm`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the facades (`glm_orphan`, `cv_glm_hub`, ...) are usable as a library

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod facade;
pub mod fit;
pub mod io;
pub mod models;
pub mod network;
pub mod plot;
pub mod report;
pub mod sparsenet;

pub use facade::*;
pub use sparsenet::{CvSparseNetFit, FitDispatcher, SparseNet, SparseNetFit, cv_glm_sparse_net, glm_sparse_net};
