//! Penalty factors from network degree.
//!
//! `pf_j = transform(max(degree_j, min_degree))`
//!
//! The minimum degree acts as a floor so transforms such as `1/x` never see an
//! isolated feature unless the caller explicitly allows `min_degree = 0`.

use crate::domain::NetworkOptions;
use crate::error::AppError;

/// Degrees after thresholding, plus the resulting penalty factors.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyFactors {
    pub degrees: Vec<f64>,
    pub factors: Vec<f64>,
}

/// Build per-feature penalty factors from raw degrees.
pub fn build_penalty_factors(degrees: &[f64], opts: &NetworkOptions) -> Result<PenaltyFactors, AppError> {
    if !(opts.min_degree.is_finite() && opts.min_degree >= 0.0) {
        return Err(AppError::invalid(format!(
            "Invalid min_degree: {} (must be finite and >= 0).",
            opts.min_degree
        )));
    }

    let thresholded: Vec<f64> = degrees.iter().map(|&d| d.max(opts.min_degree)).collect();
    let factors = opts.transform.apply(&thresholded, &opts.heuristic)?;

    if let Some((j, pf)) = factors.iter().enumerate().find(|(_, pf)| **pf < 0.0) {
        return Err(AppError::numerical(format!(
            "Transform '{}' produced a negative penalty factor {pf} for feature {j}.",
            opts.transform.display_name()
        )));
    }

    tracing::debug!(
        transform = opts.transform.display_name(),
        min_degree = opts.min_degree,
        n_features = factors.len(),
        "built penalty factors"
    );

    Ok(PenaltyFactors {
        degrees: thresholded,
        factors,
    })
}
