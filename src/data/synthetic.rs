//! Seeded synthetic regression problems with a sparse true coefficient vector.
//!
//! Features follow an AR(1) correlation structure across columns
//! (`corr(x_j, x_k) = rho^|j-k|`), so neighbouring features form a connected
//! network and distant ones are nearly isolated.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Normal, Poisson};
use serde::{Deserialize, Serialize};

use nalgebra::{DMatrix, DVector};

use crate::domain::{Dataset, Family};
use crate::error::AppError;
use crate::models::link_inverse;

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub n_obs: usize,
    pub n_features: usize,
    /// Number of leading features with a non-zero true coefficient.
    pub n_active: usize,
    /// Lag-one correlation between adjacent features.
    pub rho: f64,
    /// Noise standard deviation (gaussian only).
    pub noise_sd: f64,
    /// Multiplier on the linear predictor.
    pub signal: f64,
    pub family: Family,
    pub seed: u64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            n_obs: 200,
            n_features: 20,
            n_active: 5,
            rho: 0.5,
            noise_sd: 1.0,
            signal: 1.0,
            family: Family::Gaussian,
            seed: 42,
        }
    }
}

/// A generated data set and the coefficients it was generated from.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub dataset: Dataset,
    pub intercept: f64,
    pub beta: Vec<f64>,
}

pub fn generate(params: &SynthParams) -> Result<SyntheticData, AppError> {
    if params.n_obs < 2 || params.n_features == 0 {
        return Err(AppError::invalid("Synthetic data needs n_obs >= 2 and n_features >= 1."));
    }
    if params.n_active > params.n_features {
        return Err(AppError::invalid(format!(
            "n_active ({}) exceeds n_features ({}).",
            params.n_active, params.n_features
        )));
    }
    if !(params.rho.is_finite() && params.rho.abs() < 1.0) {
        return Err(AppError::invalid(format!("rho must be in (-1, 1), got {}.", params.rho)));
    }
    if !(params.signal.is_finite() && params.noise_sd.is_finite() && params.noise_sd >= 0.0) {
        return Err(AppError::invalid("signal and noise_sd must be finite (noise_sd >= 0)."));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let std_normal = Normal::new(0.0, 1.0).map_err(|e| AppError::numerical(format!("Normal distribution error: {e}")))?;

    let (n, p) = (params.n_obs, params.n_features);
    let innovation = (1.0 - params.rho * params.rho).sqrt();
    let mut x = DMatrix::zeros(n, p);
    for i in 0..n {
        let mut prev = std_normal.sample(&mut rng);
        x[(i, 0)] = prev;
        for j in 1..p {
            prev = params.rho * prev + innovation * std_normal.sample(&mut rng);
            x[(i, j)] = prev;
        }
    }

    // Alternating signs, magnitudes in [0.5, 1.5).
    let beta: Vec<f64> = (0..p)
        .map(|j| {
            if j < params.n_active {
                let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                sign * rng.gen_range(0.5..1.5)
            } else {
                0.0
            }
        })
        .collect();
    let intercept = match params.family {
        Family::Gaussian => 1.0,
        Family::Binomial => 0.0,
        Family::Poisson => 0.5,
    };

    let mut y = DVector::zeros(n);
    for i in 0..n {
        let eta = intercept + params.signal * (0..p).map(|j| x[(i, j)] * beta[j]).sum::<f64>();
        y[i] = match params.family {
            Family::Gaussian => eta + params.noise_sd * std_normal.sample(&mut rng),
            Family::Binomial => {
                let prob = link_inverse(Family::Binomial, eta);
                let draw = Bernoulli::new(prob).map_err(|e| AppError::numerical(format!("Bernoulli error: {e}")))?;
                if draw.sample(&mut rng) { 1.0 } else { 0.0 }
            }
            Family::Poisson => {
                let mean = link_inverse(Family::Poisson, eta).max(1e-8);
                let draw = Poisson::new(mean).map_err(|e| AppError::numerical(format!("Poisson error: {e}")))?;
                draw.sample(&mut rng)
            }
        };
    }

    tracing::debug!(n_obs = n, n_features = p, family = params.family.display_name(), "generated synthetic data");

    Ok(SyntheticData {
        dataset: Dataset {
            x,
            y,
            feature_names: (1..=p).map(|j| format!("x{j}")).collect(),
            response_name: "y".to_string(),
        },
        intercept,
        beta,
    })
}
