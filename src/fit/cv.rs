//! K-fold cross-validation over a fixed lambda path.
//!
//! The lambda sequence comes from the full-data fit, so every fold is scored
//! on the same grid. Folds are independent and fitted in parallel.
//!
//! Selection rules:
//! 1. `lambda_min` minimizes the mean CV loss (ties -> larger lambda)
//! 2. `lambda_1se` is the largest lambda whose mean loss is within one
//!    standard error of the minimum

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{CvMeasure, CvParams, Family, GlmParams, PredictKind};
use crate::error::AppError;
use crate::fit::elastic_net::fit_path;
use crate::models::unit_deviance;

/// Minimum number of folds.
const MIN_FOLDS: usize = 3;

/// Cross-validation curve and selected lambdas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    pub lambdas: Vec<f64>,
    /// Mean held-out loss per lambda.
    pub cvm: Vec<f64>,
    /// Standard error of `cvm`.
    pub cvsd: Vec<f64>,
    pub cvup: Vec<f64>,
    pub cvlo: Vec<f64>,
    pub measure: CvMeasure,
    pub n_folds: usize,
    /// Fold of each observation, `1..=n_folds`.
    pub fold_ids: Vec<usize>,
    pub index_min: usize,
    pub index_1se: usize,
    pub lambda_min: f64,
    pub lambda_1se: f64,
}

/// Held-out losses for one fold.
struct FoldScore {
    n_test: usize,
    /// Mean loss per lambda.
    loss: Vec<f64>,
}

/// Deterministic fold assignment: shuffled indices dealt round-robin.
pub fn assign_folds(n: usize, n_folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut folds = vec![0; n];
    for (pos, &i) in order.iter().enumerate() {
        folds[i] = pos % n_folds + 1;
    }
    folds
}

/// Resolve and validate the fold assignment for `n` observations.
pub fn resolve_folds(n: usize, params: &CvParams) -> Result<(Vec<usize>, usize), AppError> {
    match &params.fold_ids {
        Some(ids) => {
            if ids.len() != n {
                return Err(AppError::invalid(format!(
                    "fold_ids length ({}) != number of observations ({n}).",
                    ids.len()
                )));
            }
            let k = ids.iter().copied().max().unwrap_or(0);
            if k < MIN_FOLDS {
                return Err(AppError::invalid(format!(
                    "Need at least {MIN_FOLDS} folds, fold_ids define {k}."
                )));
            }
            for fold in 1..=k {
                if !ids.contains(&fold) {
                    return Err(AppError::invalid(format!("Fold {fold} has no observations.")));
                }
            }
            if ids.contains(&0) {
                return Err(AppError::invalid("fold_ids are numbered from 1."));
            }
            Ok((ids.clone(), k))
        }
        None => {
            if params.n_folds < MIN_FOLDS {
                return Err(AppError::invalid(format!(
                    "n_folds must be >= {MIN_FOLDS}, got {}.",
                    params.n_folds
                )));
            }
            if params.n_folds > n {
                return Err(AppError::insufficient(format!(
                    "n_folds ({}) exceeds number of observations ({n}).",
                    params.n_folds
                )));
            }
            Ok((assign_folds(n, params.n_folds, params.seed), params.n_folds))
        }
    }
}

/// Cross-validate the elastic-net path on `lambdas`.
pub fn cross_validate(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    penalty_factors: &[f64],
    lambdas: &[f64],
    params: &CvParams,
) -> Result<CvResult, AppError> {
    let n = x.nrows();
    if y.len() != n {
        return Err(AppError::invalid(format!(
            "Response length ({}) != number of observations ({n}).",
            y.len()
        )));
    }
    if params.measure == CvMeasure::Class && params.glm.family != Family::Binomial {
        return Err(AppError::invalid("Measure 'class' is only available for the binomial family."));
    }
    let (fold_ids, n_folds) = resolve_folds(n, params)?;

    let fold_params = GlmParams {
        lambdas: Some(lambdas.to_vec()),
        ..params.glm.clone()
    };

    let scores: Vec<FoldScore> = (1..=n_folds)
        .into_par_iter()
        .map(|fold| score_fold(x, y, penalty_factors, &fold_ids, fold, &fold_params, params.measure))
        .collect::<Result<_, _>>()?;

    let n_lambda = lambdas.len();
    let mut cvm = vec![f64::NAN; n_lambda];
    let mut cvsd = vec![f64::NAN; n_lambda];
    for k in 0..n_lambda {
        // Folds whose path ended early only score the lambdas they reached.
        let reached: Vec<(f64, f64)> = scores
            .iter()
            .filter_map(|s| s.loss.get(k).map(|&l| (s.n_test as f64, l)))
            .collect();
        if reached.is_empty() {
            continue;
        }
        let total: f64 = reached.iter().map(|(w, _)| w).sum();
        let mean = reached.iter().map(|(w, l)| w * l).sum::<f64>() / total;
        let var = reached.iter().map(|(w, l)| w * (l - mean).powi(2)).sum::<f64>() / total;
        cvm[k] = mean;
        cvsd[k] = (var / (reached.len().max(2) as f64 - 1.0)).sqrt();
    }

    let (index_min, index_1se) = select_lambdas(&cvm, &cvsd)?;
    tracing::info!(
        n_folds,
        measure = params.measure.display_name(),
        lambda_min = lambdas[index_min],
        lambda_1se = lambdas[index_1se],
        "cross-validation complete"
    );

    Ok(CvResult {
        lambdas: lambdas.to_vec(),
        cvup: cvm.iter().zip(cvsd.iter()).map(|(m, s)| m + s).collect(),
        cvlo: cvm.iter().zip(cvsd.iter()).map(|(m, s)| m - s).collect(),
        cvm,
        cvsd,
        measure: params.measure,
        n_folds,
        fold_ids,
        index_min,
        index_1se,
        lambda_min: lambdas[index_min],
        lambda_1se: lambdas[index_1se],
    })
}

/// Pick `(index_min, index_1se)` from a CV curve ordered by decreasing lambda.
pub fn select_lambdas(cvm: &[f64], cvsd: &[f64]) -> Result<(usize, usize), AppError> {
    let mut best: Option<usize> = None;
    for (k, &m) in cvm.iter().enumerate() {
        if !m.is_finite() {
            continue;
        }
        match best {
            Some(b) if cvm[b] <= m => {}
            _ => best = Some(k),
        }
    }
    let Some(index_min) = best else {
        return Err(AppError::numerical("Cross-validation produced no finite losses."));
    };

    let threshold = cvm[index_min] + cvsd[index_min];
    let index_1se = cvm
        .iter()
        .position(|&m| m.is_finite() && m <= threshold)
        .unwrap_or(index_min)
        .min(index_min);
    Ok((index_min, index_1se))
}

fn score_fold(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    penalty_factors: &[f64],
    fold_ids: &[usize],
    fold: usize,
    params: &GlmParams,
    measure: CvMeasure,
) -> Result<FoldScore, AppError> {
    let train: Vec<usize> = (0..fold_ids.len()).filter(|&i| fold_ids[i] != fold).collect();
    let test: Vec<usize> = (0..fold_ids.len()).filter(|&i| fold_ids[i] == fold).collect();

    let x_train = select_rows(x, &train);
    let y_train = DVector::from_fn(train.len(), |i, _| y[train[i]]);
    let x_test = select_rows(x, &test);

    let path = fit_path(&x_train, &y_train, penalty_factors, params)?;
    tracing::debug!(fold, n_train = train.len(), n_test = test.len(), "fold fitted");

    let mut loss = Vec::with_capacity(path.n_lambda());
    for k in 0..path.n_lambda() {
        let mu = path.predict_at_index(&x_test, k, PredictKind::Response)?;
        let total: f64 = test
            .iter()
            .zip(mu.iter())
            .map(|(&i, &m)| observation_loss(measure, params.family, y[i], m))
            .sum();
        loss.push(total / test.len() as f64);
    }

    Ok(FoldScore {
        n_test: test.len(),
        loss,
    })
}

fn observation_loss(measure: CvMeasure, family: Family, y: f64, mu: f64) -> f64 {
    match measure {
        CvMeasure::Deviance => unit_deviance(family, y, mu),
        CvMeasure::Mse => (y - mu).powi(2),
        CvMeasure::Mae => (y - mu).abs(),
        CvMeasure::Class => {
            let predicted = if mu > 0.5 { 1.0 } else { 0.0 };
            if predicted == y { 0.0 } else { 1.0 }
        }
    }
}

fn select_rows(x: &DMatrix<f64>, rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), x.ncols(), |i, j| x[(rows[i], j)])
}
