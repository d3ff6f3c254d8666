//! CSV exports.
//!
//! - per-feature coefficients at a chosen lambda, with degree and penalty
//! - a data set (used by `netglm synth`)

use std::path::Path;

use serde::Serialize;

use crate::domain::Dataset;
use crate::error::AppError;
use crate::sparsenet::SparseNetFit;

/// One row of the coefficient export.
#[derive(Debug, Serialize)]
struct CoefficientRecord<'a> {
    feature: &'a str,
    degree: Option<f64>,
    penalty_factor: Option<f64>,
    coefficient: f64,
    lambda: f64,
}

/// Write `(feature, degree, penalty_factor, coefficient)` rows at `lambda`.
///
/// The first data row is the intercept (empty degree / penalty).
pub fn write_coefficients_csv(
    path: &Path,
    fit: &SparseNetFit,
    feature_names: &[String],
    lambda: f64,
) -> Result<(), AppError> {
    if feature_names.len() != fit.path.n_features() {
        return Err(AppError::invalid(format!(
            "Feature name count ({}) != fitted feature count ({}).",
            feature_names.len(),
            fit.path.n_features()
        )));
    }
    let (intercept, beta) = fit.path.coefficients_at(lambda)?;

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let intercept_row = CoefficientRecord {
        feature: "(intercept)",
        degree: None,
        penalty_factor: None,
        coefficient: intercept,
        lambda,
    };
    let feature_rows = feature_names.iter().enumerate().map(|(j, name)| CoefficientRecord {
        feature: name,
        degree: Some(fit.degrees[j]),
        penalty_factor: Some(fit.penalty_factors[j]),
        coefficient: beta[j],
        lambda,
    });

    for row in std::iter::once(intercept_row).chain(feature_rows) {
        writer
            .serialize(&row)
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write a data set as CSV: response first, then features.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create CSV '{}': {e}", path.display())))?;

    let mut header = Vec::with_capacity(dataset.n_features() + 1);
    header.push(dataset.response_name.clone());
    header.extend(dataset.feature_names.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;

    for i in 0..dataset.n_obs() {
        let mut row = Vec::with_capacity(header.len());
        row.push(format!("{}", dataset.y[i]));
        row.extend((0..dataset.n_features()).map(|j| format!("{}", dataset.x[(i, j)])));
        writer
            .write_record(&row)
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))?;
    Ok(())
}
