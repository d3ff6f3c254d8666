//! Fitted regularization path.
//!
//! A path stores, for each lambda (in decreasing order), the intercept and the
//! coefficient vector on the original feature scale. Prediction at a lambda
//! that is not on the path interpolates linearly between its two neighbours.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::{Family, PredictKind};
use crate::error::AppError;
use crate::models::family::link_inverse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlmPath {
    pub family: Family,
    /// Strictly decreasing.
    pub lambdas: Vec<f64>,
    pub intercepts: Vec<f64>,
    /// `coefficients[k]` is the length-`p` coefficient vector at `lambdas[k]`.
    pub coefficients: Vec<Vec<f64>>,
    /// Number of non-zero coefficients per lambda.
    pub df: Vec<usize>,
    /// Fraction of null deviance explained per lambda.
    pub dev_ratio: Vec<f64>,
    pub null_deviance: f64,
    pub n_obs: usize,
    /// Coordinate descent passes used over the whole path.
    pub passes: usize,
}

impl GlmPath {
    pub fn n_lambda(&self) -> usize {
        self.lambdas.len()
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Indices of non-zero coefficients at path index `k`.
    pub fn nonzero(&self, k: usize) -> Vec<usize> {
        self.coefficients
            .get(k)
            .map(|beta| {
                beta.iter()
                    .enumerate()
                    .filter(|(_, b)| **b != 0.0)
                    .map(|(j, _)| j)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Intercept and coefficients at an arbitrary lambda.
    ///
    /// Lambdas above the first path value return the first solution; lambdas
    /// below the last return the last one.
    pub fn coefficients_at(&self, lambda: f64) -> Result<(f64, Vec<f64>), AppError> {
        if self.lambdas.is_empty() {
            return Err(AppError::invalid("Path has no fitted lambdas."));
        }
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(AppError::invalid(format!("Invalid lambda for prediction: {lambda}.")));
        }

        let last = self.lambdas.len() - 1;
        if lambda >= self.lambdas[0] {
            return Ok((self.intercepts[0], self.coefficients[0].clone()));
        }
        if lambda <= self.lambdas[last] {
            return Ok((self.intercepts[last], self.coefficients[last].clone()));
        }

        // First index whose lambda is below the target; its predecessor is above.
        let hi = self.lambdas.iter().position(|&l| l < lambda).unwrap_or(last);
        let lo = hi - 1;
        let (l_lo, l_hi) = (self.lambdas[lo], self.lambdas[hi]);
        let frac = (l_lo - lambda) / (l_lo - l_hi);

        let lerp = |a: f64, b: f64| a + frac * (b - a);
        let intercept = lerp(self.intercepts[lo], self.intercepts[hi]);
        let beta = self.coefficients[lo]
            .iter()
            .zip(self.coefficients[hi].iter())
            .map(|(&a, &b)| lerp(a, b))
            .collect();
        Ok((intercept, beta))
    }

    /// Predict at an arbitrary lambda.
    pub fn predict(&self, x: &DMatrix<f64>, lambda: f64, kind: PredictKind) -> Result<DVector<f64>, AppError> {
        self.check_width(x)?;
        let (b0, beta) = self.coefficients_at(lambda)?;
        Ok(self.linear_predict(x, b0, &beta, kind))
    }

    /// Predict at path index `k`.
    pub fn predict_at_index(&self, x: &DMatrix<f64>, k: usize, kind: PredictKind) -> Result<DVector<f64>, AppError> {
        self.check_width(x)?;
        if k >= self.n_lambda() {
            return Err(AppError::invalid(format!(
                "Path index {k} out of range (path has {} lambdas).",
                self.n_lambda()
            )));
        }
        Ok(self.linear_predict(x, self.intercepts[k], &self.coefficients[k], kind))
    }

    fn check_width(&self, x: &DMatrix<f64>) -> Result<(), AppError> {
        if x.ncols() != self.n_features() {
            return Err(AppError::invalid(format!(
                "Prediction matrix has {} columns, model has {} features.",
                x.ncols(),
                self.n_features()
            )));
        }
        Ok(())
    }

    fn linear_predict(&self, x: &DMatrix<f64>, b0: f64, beta: &[f64], kind: PredictKind) -> DVector<f64> {
        let beta = DVector::from_row_slice(beta);
        let eta = x * beta;
        eta.map(|e| {
            let e = e + b0;
            match kind {
                PredictKind::Link => e,
                PredictKind::Response => link_inverse(self.family, e),
            }
        })
    }
}
