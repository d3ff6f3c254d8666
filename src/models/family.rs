//! Family evaluation for Gaussian / Binomial / Poisson.
//!
//! All three use their canonical link, which keeps the score of the
//! log-likelihood equal to `x_j' (y - μ)` for every family. The solver relies on
//! this when it computes `lambda_max`.
//!
//! The primitives here are:
//! - inverse link `μ = g⁻¹(η)`
//! - IRLS working weight `w(μ)`
//! - unit deviance `d(y, μ)`

use nalgebra::DVector;

use crate::domain::Family;
use crate::error::AppError;

/// Probabilities are kept away from 0 and 1.
pub const PROB_EPS: f64 = 1e-5;

/// Upper bound on the Poisson linear predictor before exponentiation.
const ETA_MAX: f64 = 700.0;

/// Mean response for a linear predictor value.
pub fn link_inverse(family: Family, eta: f64) -> f64 {
    match family {
        Family::Gaussian => eta,
        Family::Binomial => {
            let mu = 1.0 / (1.0 + (-eta).exp());
            mu.clamp(PROB_EPS, 1.0 - PROB_EPS)
        }
        Family::Poisson => eta.min(ETA_MAX).exp(),
    }
}

/// Link function `η = g(μ)`.
pub fn link(family: Family, mu: f64) -> f64 {
    match family {
        Family::Gaussian => mu,
        Family::Binomial => {
            let mu = mu.clamp(PROB_EPS, 1.0 - PROB_EPS);
            (mu / (1.0 - mu)).ln()
        }
        Family::Poisson => mu.max(f64::MIN_POSITIVE).ln(),
    }
}

/// IRLS working weight (variance function under the canonical link).
pub fn irls_weight(family: Family, mu: f64) -> f64 {
    match family {
        Family::Gaussian => 1.0,
        Family::Binomial => (mu * (1.0 - mu)).max(PROB_EPS),
        Family::Poisson => mu.max(PROB_EPS),
    }
}

/// Deviance contribution of a single observation.
pub fn unit_deviance(family: Family, y: f64, mu: f64) -> f64 {
    match family {
        Family::Gaussian => {
            let r = y - mu;
            r * r
        }
        Family::Binomial => {
            let mu = mu.clamp(PROB_EPS, 1.0 - PROB_EPS);
            -2.0 * (y * mu.ln() + (1.0 - y) * (1.0 - mu).ln())
        }
        Family::Poisson => {
            let ylog = if y > 0.0 { y * (y / mu).ln() } else { 0.0 };
            2.0 * (ylog - (y - mu))
        }
    }
}

/// Total deviance `Σ d(y_i, μ_i)`.
pub fn deviance(family: Family, y: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    y.iter().zip(mu.iter()).map(|(&yi, &mi)| unit_deviance(family, yi, mi)).sum()
}

/// Deviance of the intercept-only model (or `η = 0` without intercept).
pub fn null_deviance(family: Family, y: &DVector<f64>, intercept: bool) -> f64 {
    let mu0 = if intercept {
        null_mean(family, y)
    } else {
        link_inverse(family, 0.0)
    };
    let mu = DVector::from_element(y.len(), mu0);
    deviance(family, y, &mu)
}

/// Fitted mean of the intercept-only model.
pub fn null_mean(family: Family, y: &DVector<f64>) -> f64 {
    let mean = y.mean();
    match family {
        Family::Gaussian => mean,
        Family::Binomial => mean.clamp(PROB_EPS, 1.0 - PROB_EPS),
        Family::Poisson => mean.max(PROB_EPS),
    }
}

/// Check that the response is admissible for the family.
pub fn validate_response(family: Family, y: &DVector<f64>) -> Result<(), AppError> {
    if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AppError::invalid(format!("Non-finite response {v} at row {i}.")));
    }
    match family {
        Family::Gaussian => Ok(()),
        Family::Binomial => {
            if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| **v != 0.0 && **v != 1.0) {
                return Err(AppError::invalid(format!(
                    "Binomial response must be 0 or 1, got {v} at row {i}."
                )));
            }
            Ok(())
        }
        Family::Poisson => {
            if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| **v < 0.0) {
                return Err(AppError::invalid(format!(
                    "Poisson response must be non-negative, got {v} at row {i}."
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_roundtrip_for_each_family() {
        for family in [Family::Gaussian, Family::Binomial, Family::Poisson] {
            for &eta in &[-2.0, -0.3, 0.0, 0.7, 3.0] {
                let mu = link_inverse(family, eta);
                assert!((link(family, mu) - eta).abs() < 1e-9, "{family:?} at {eta}");
            }
        }
    }

    #[test]
    fn saturated_deviance_is_zero() {
        assert_eq!(unit_deviance(Family::Gaussian, 2.0, 2.0), 0.0);
        assert!(unit_deviance(Family::Poisson, 3.0, 3.0).abs() < 1e-12);
        assert_eq!(unit_deviance(Family::Poisson, 0.0, 0.0), 0.0);
        assert!(unit_deviance(Family::Binomial, 1.0, 1.0 - PROB_EPS) < 1e-4);
    }

    #[test]
    fn binomial_response_must_be_binary() {
        let y = DVector::from_row_slice(&[0.0, 1.0, 0.5]);
        assert!(validate_response(Family::Binomial, &y).is_err());
        assert!(validate_response(Family::Gaussian, &y).is_ok());
    }

    #[test]
    fn poisson_response_must_be_non_negative() {
        let y = DVector::from_row_slice(&[0.0, 2.0, -1.0]);
        assert!(validate_response(Family::Poisson, &y).is_err());
    }

    #[test]
    fn null_deviance_of_gaussian_is_total_sum_of_squares() {
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!((null_deviance(Family::Gaussian, &y, true) - 2.0).abs() < 1e-12);
        assert!((null_deviance(Family::Gaussian, &y, false) - 14.0).abs() < 1e-12);
    }
}
