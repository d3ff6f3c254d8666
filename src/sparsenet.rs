//! Network-penalized fit entry points.
//!
//! The pipeline is the same for both entry points:
//!
//! network -> degree -> penalty factors -> elastic-net path (-> K-fold CV)
//!
//! Degrees and penalty factors are always computed on the full data set, so
//! the cross-validated fit scores exactly the penalty the final model uses.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::{CvParams, GlmParams, NetworkOptions};
use crate::error::AppError;
use crate::fit::{CvResult, cross_validate, fit_path};
use crate::models::GlmPath;
use crate::network::{NetworkSpec, build_penalty_factors, network_degree};

/// A fitted network-penalized path plus the penalty it was fitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseNetFit {
    pub path: GlmPath,
    /// Per-feature degree after the `min_degree` floor.
    pub degrees: Vec<f64>,
    pub penalty_factors: Vec<f64>,
    /// Name of the network the degrees came from.
    pub network: String,
    pub options: NetworkOptions,
    pub params: GlmParams,
}

/// Full-data fit plus its cross-validation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSparseNetFit {
    pub fit: SparseNetFit,
    pub cv: CvResult,
}

impl CvSparseNetFit {
    /// `(intercept, coefficients)` at `lambda_min`.
    pub fn coefficients_min(&self) -> Result<(f64, Vec<f64>), AppError> {
        self.fit.path.coefficients_at(self.cv.lambda_min)
    }

    /// `(intercept, coefficients)` at `lambda_1se`.
    pub fn coefficients_1se(&self) -> Result<(f64, Vec<f64>), AppError> {
        self.fit.path.coefficients_at(self.cv.lambda_1se)
    }
}

/// Single-fit and cross-validated entry points that the facades delegate to.
pub trait FitDispatcher {
    type Model;
    type CvModel;

    fn glm(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        network: &NetworkSpec,
        options: &NetworkOptions,
        params: &GlmParams,
    ) -> Result<Self::Model, AppError>;

    fn cv_glm(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        network: &NetworkSpec,
        options: &NetworkOptions,
        params: &CvParams,
    ) -> Result<Self::CvModel, AppError>;
}

/// The production dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseNet;

impl FitDispatcher for SparseNet {
    type Model = SparseNetFit;
    type CvModel = CvSparseNetFit;

    fn glm(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        network: &NetworkSpec,
        options: &NetworkOptions,
        params: &GlmParams,
    ) -> Result<SparseNetFit, AppError> {
        glm_sparse_net(x, y, network, options, params)
    }

    fn cv_glm(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        network: &NetworkSpec,
        options: &NetworkOptions,
        params: &CvParams,
    ) -> Result<CvSparseNetFit, AppError> {
        cv_glm_sparse_net(x, y, network, options, params)
    }
}

/// Fit the elastic-net path with network-derived penalty factors.
pub fn glm_sparse_net(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<SparseNetFit, AppError> {
    if x.nrows() != y.len() {
        return Err(AppError::invalid(format!(
            "Feature rows ({}) != response length ({}).",
            x.nrows(),
            y.len()
        )));
    }

    let degrees = network_degree(x, network, options)?;
    let penalty = build_penalty_factors(&degrees, options)?;
    tracing::info!(
        network = network.display_name(),
        transform = options.transform.display_name(),
        n_obs = x.nrows(),
        n_features = x.ncols(),
        "penalty factors ready"
    );

    let path = fit_path(x, y, &penalty.factors, params)?;
    tracing::info!(
        family = params.family.display_name(),
        n_lambda = path.n_lambda(),
        passes = path.passes,
        "path fitted"
    );

    Ok(SparseNetFit {
        path,
        degrees: penalty.degrees,
        penalty_factors: penalty.factors,
        network: network.display_name().to_string(),
        options: options.clone(),
        params: params.clone(),
    })
}

/// Fit on the full data, then cross-validate on the same lambda sequence.
pub fn cv_glm_sparse_net(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<CvSparseNetFit, AppError> {
    let fit = glm_sparse_net(x, y, network, options, &params.glm)?;
    let cv = cross_validate(x, y, &fit.penalty_factors, &fit.path.lambdas, params)?;
    Ok(CvSparseNetFit { fit, cv })
}
