//! Reporting utilities: coefficient rankings and formatted terminal output.

pub mod format;

pub use format::*;

use crate::error::AppError;
use crate::sparsenet::SparseNetFit;

/// One feature's row in the coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRow {
    pub name: String,
    pub degree: f64,
    pub penalty_factor: f64,
    pub coefficient: f64,
}

/// Non-zero coefficients at `lambda`, largest magnitude first.
pub fn top_coefficients(
    fit: &SparseNetFit,
    feature_names: &[String],
    lambda: f64,
    top_n: usize,
) -> Result<Vec<CoefficientRow>, AppError> {
    let (_, beta) = fit.path.coefficients_at(lambda)?;
    let mut rows: Vec<CoefficientRow> = beta
        .iter()
        .enumerate()
        .filter(|(_, b)| **b != 0.0)
        .map(|(j, &b)| CoefficientRow {
            name: feature_names.get(j).cloned().unwrap_or_else(|| format!("x{}", j + 1)),
            degree: fit.degrees[j],
            penalty_factor: fit.penalty_factors[j],
            coefficient: b,
        })
        .collect();
    rows.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
    rows.truncate(top_n);
    Ok(rows)
}
