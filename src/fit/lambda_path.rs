//! Lambda sequence generation.
//!
//! The path runs from `lambda_max` (every penalized coefficient is zero) down to
//! `lambda_max * lambda_min_ratio`, log-spaced, so warm starts move in small
//! multiplicative steps.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive), ascending.
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::invalid(format!(
            "Invalid lambda range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::invalid("Lambda steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    // Pin the endpoints exactly; exp(ln(x)) can be off by an ulp.
    out[0] = min;
    out[steps - 1] = max;
    Ok(out)
}

/// Decreasing lambda path starting at `lambda_max`.
pub fn lambda_sequence(lambda_max: f64, min_ratio: f64, n_lambda: usize) -> Result<Vec<f64>, AppError> {
    if !(min_ratio.is_finite() && min_ratio > 0.0 && min_ratio < 1.0) {
        return Err(AppError::invalid(format!(
            "Invalid lambda_min_ratio: {min_ratio} (must be in (0, 1))."
        )));
    }
    if n_lambda == 0 {
        return Err(AppError::invalid("n_lambda must be >= 1."));
    }
    if n_lambda == 1 {
        return Ok(vec![lambda_max]);
    }
    let mut seq = log_space(lambda_max * min_ratio, lambda_max, n_lambda)?;
    seq.reverse();
    Ok(seq)
}

/// Validate a user-supplied lambda sequence.
pub fn validate_lambdas(lambdas: &[f64]) -> Result<(), AppError> {
    if lambdas.is_empty() {
        return Err(AppError::invalid("Explicit lambda sequence is empty."));
    }
    if let Some(l) = lambdas.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
        return Err(AppError::invalid(format!("Invalid lambda {l} (must be finite and > 0).")));
    }
    if lambdas.windows(2).any(|w| w[1] >= w[0]) {
        return Err(AppError::invalid("Explicit lambdas must be strictly decreasing."));
    }
    Ok(())
}
