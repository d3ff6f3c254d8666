//! Read/write fitted model JSON files.
//!
//! A model file is the portable representation of a run:
//! - the fitted path (lambdas, intercepts, coefficients)
//! - degrees, penalty factors and the options that produced them
//! - the CV curve and selected lambdas, when cross-validated
//! - feature names and a creation timestamp

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fit::CvResult;
use crate::sparsenet::SparseNetFit;

/// On-disk model schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub response: String,
    pub feature_names: Vec<String>,
    pub fit: SparseNetFit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<CvResult>,
}

impl ModelFile {
    pub fn new(fit: SparseNetFit, cv: Option<CvResult>, feature_names: Vec<String>, response: String) -> Self {
        Self {
            tool: "netglm".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            response,
            feature_names,
            fit,
            cv,
        }
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model).map_err(|e| AppError::io(format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid model JSON: {e}")))?;
    Ok(model)
}
