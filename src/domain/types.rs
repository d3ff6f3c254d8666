//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from CLI flags or a TOML options file
//! - passed unchanged through the facades to the fitting pipeline
//! - exported to JSON alongside a fitted model

use std::path::PathBuf;

use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::network::{DegreeTransform, HeuristicShape};

/// Outcome family for the penalized GLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Least squares (identity link).
    Gaussian,
    /// Logistic regression on a 0/1 response (logit link).
    Binomial,
    /// Count regression (log link).
    Poisson,
}

impl Family {
    pub fn display_name(self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian",
            Family::Binomial => "binomial",
            Family::Poisson => "poisson",
        }
    }
}

/// How the feature network is derived from the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMethod {
    /// Pearson correlation between feature columns.
    Correlation,
    /// Spearman rank correlation between feature columns.
    Spearman,
    /// Sample covariance between feature columns.
    Covariance,
}

/// Loss used to score held-out folds during cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CvMeasure {
    /// Family deviance (default).
    Deviance,
    /// Mean squared error on the response scale.
    Mse,
    /// Mean absolute error on the response scale.
    Mae,
    /// Misclassification rate (binomial only).
    Class,
}

impl CvMeasure {
    pub fn display_name(self) -> &'static str {
        match self {
            CvMeasure::Deviance => "deviance",
            CvMeasure::Mse => "mse",
            CvMeasure::Mae => "mae",
            CvMeasure::Class => "class",
        }
    }
}

/// Scale on which predictions are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictKind {
    /// Linear predictor `η = b0 + xβ`.
    Link,
    /// Mean response `μ = g⁻¹(η)`.
    Response,
}

/// Network and penalty configuration.
///
/// The facades treat this as immutable: they install a transform through
/// [`NetworkOptions::with_transform`], which returns a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    /// Maps degree to penalty factor.
    pub transform: DegreeTransform,
    /// Shape of the orphan / hub heuristics.
    pub heuristic: HeuristicShape,
    /// Count edges instead of summing absolute edge weights.
    pub unweighted: bool,
    /// Edges with `|w| <= cutoff` are dropped.
    pub cutoff: f64,
    /// Degrees below this value are raised to it before the transform.
    pub min_degree: f64,
    /// Compute network rows on the rayon pool.
    pub parallel: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            transform: DegreeTransform::Identity,
            heuristic: HeuristicShape::default(),
            unweighted: true,
            cutoff: 0.0,
            min_degree: 0.0,
            parallel: true,
        }
    }
}

impl NetworkOptions {
    /// Copy of these options with only the transform replaced.
    pub fn with_transform(&self, transform: DegreeTransform) -> Self {
        Self {
            transform,
            ..self.clone()
        }
    }
}

/// Elastic-net solver parameters (passed through the facades untouched).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlmParams {
    pub family: Family,
    /// Mixing between lasso (`1.0`) and ridge (`0.0`).
    pub alpha: f64,
    /// Number of lambdas on the generated path.
    pub n_lambda: usize,
    /// Smallest lambda as a fraction of `lambda_max`.
    ///
    /// `None` picks `1e-4` when `n > p`, otherwise `1e-2`.
    pub lambda_min_ratio: Option<f64>,
    /// Explicit decreasing lambda sequence (overrides the generated path).
    pub lambdas: Option<Vec<f64>>,
    pub standardize: bool,
    pub intercept: bool,
    /// Coordinate descent convergence threshold.
    pub tolerance: f64,
    /// Total coordinate passes allowed over the whole path.
    pub max_iterations: usize,
    /// IRLS iterations per lambda (binomial / poisson).
    pub max_irls_iterations: usize,
}

impl Default for GlmParams {
    fn default() -> Self {
        Self {
            family: Family::Gaussian,
            alpha: 1.0,
            n_lambda: 100,
            lambda_min_ratio: None,
            lambdas: None,
            standardize: true,
            intercept: true,
            tolerance: 1e-7,
            max_iterations: 100_000,
            max_irls_iterations: 25,
        }
    }
}

/// Cross-validation parameters; `glm` is forwarded to every fold fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvParams {
    pub glm: GlmParams,
    pub n_folds: usize,
    /// Seed for the fold permutation.
    pub seed: u64,
    /// Explicit fold per observation, numbered `1..=K`.
    pub fold_ids: Option<Vec<usize>>,
    pub measure: CvMeasure,
}

impl Default for CvParams {
    fn default() -> Self {
        Self {
            glm: GlmParams::default(),
            n_folds: 10,
            seed: 42,
            fold_ids: None,
            measure: CvMeasure::Deviance,
        }
    }
}

/// Feature matrix plus response, as read from disk or generated.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `n x p` features.
    pub x: DMatrix<f64>,
    /// Length-`n` response.
    pub y: DVector<f64>,
    pub feature_names: Vec<String>,
    pub response_name: String,
}

impl Dataset {
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, then optionally overlaid by a TOML file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub response: String,
    pub network: NetworkMethod,
    pub options: NetworkOptions,
    pub cv: CvParams,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_coefficients: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_transform_only_changes_transform() {
        let base = NetworkOptions {
            min_degree: 2.5,
            cutoff: 0.3,
            unweighted: false,
            ..NetworkOptions::default()
        };
        let hub = base.with_transform(DegreeTransform::Hub);

        assert_eq!(hub.transform, DegreeTransform::Hub);
        assert_eq!(base.transform, DegreeTransform::Identity);
        assert_eq!(
            NetworkOptions {
                transform: DegreeTransform::Identity,
                ..hub
            },
            base
        );
    }

    #[test]
    fn options_deserialize_with_partial_toml() {
        let opts: NetworkOptions = toml::from_str("min_degree = 0.5\ntransform = \"orphan\"").unwrap();
        assert_eq!(opts.transform, DegreeTransform::Orphan);
        assert!((opts.min_degree - 0.5).abs() < 1e-12);
        assert!(opts.unweighted);
    }
}
