//! Elastic-net GLM path fitting with per-coefficient penalty factors.
//!
//! Given:
//! - features `X` (n x p) and response `y`
//! - penalty factors `pf_j` (0 = unpenalized, ∞ = excluded)
//! - solver parameters (family, alpha, lambda path settings)
//!
//! we fit, for each lambda from largest to smallest (warm-started):
//! - Gaussian: one weighted coordinate descent solve
//! - Binomial / Poisson: an IRLS loop whose inner problem is the same
//!   weighted coordinate descent solve
//!
//! Features are centred (with an intercept) and optionally scaled to unit
//! variance before fitting; coefficients are reported on the original scale.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Family, GlmParams};
use crate::error::AppError;
use crate::fit::coordinate::CoordinateDescent;
use crate::fit::lambda_path::{lambda_sequence, validate_lambdas};
use crate::models::{GlmPath, deviance, irls_weight, link, link_inverse, null_deviance, null_mean, validate_response};

/// Floor on `alpha` when computing `lambda_max` (pure ridge has no finite one).
const ALPHA_FLOOR: f64 = 1e-3;

/// Relative inflation of `lambda_max`.
const LAMBDA_MAX_SLACK: f64 = 1e-9;

/// Path stops once this fraction of the null deviance is explained.
const DEV_RATIO_MAX: f64 = 0.999;

/// Path stops once the relative gain in deviance ratio falls below this.
const DEV_RATIO_MIN_GAIN: f64 = 1e-5;

/// Neither stopping rule applies before this many path points.
const MIN_PATH_POINTS: usize = 5;

/// Column centring / scaling applied before fitting.
#[derive(Debug, Clone)]
struct Standardized {
    xs: DMatrix<f64>,
    center: Vec<f64>,
    scale: Vec<f64>,
}

/// Mutable fit state carried along the path.
struct PathState {
    b0: f64,
    beta: DVector<f64>,
}

/// Fit the full regularization path.
pub fn fit_path(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    penalty_factors: &[f64],
    params: &GlmParams,
) -> Result<GlmPath, AppError> {
    validate_inputs(x, y, penalty_factors, params)?;

    let n = x.nrows();
    let p = x.ncols();
    let family = params.family;

    let scaled = standardize(x, params.standardize, params.intercept);
    let pf = rescale_penalty_factors(penalty_factors)?;

    let null_dev = null_deviance(family, y, params.intercept);
    if !(null_dev.is_finite() && null_dev > 1e-12) {
        return Err(AppError::invalid(
            "Response has no variation to explain (null deviance is zero).",
        ));
    }

    // Null model: intercept (and any unpenalized features) only.
    let mut state = PathState {
        b0: if params.intercept {
            link(family, null_mean(family, y))
        } else {
            0.0
        },
        beta: DVector::zeros(p),
    };
    let mut passes = 0usize;
    passes += fit_at_lambda(&scaled.xs, y, &pf, params, f64::INFINITY, &mut state, params.max_iterations)?;

    let generated = params.lambdas.is_none();
    let lambdas = match &params.lambdas {
        Some(explicit) => {
            validate_lambdas(explicit)?;
            explicit.clone()
        }
        None => {
            let lambda_max = lambda_max(&scaled.xs, y, &pf, params.alpha, family, &state);
            let ratio = params
                .lambda_min_ratio
                .unwrap_or(if n > p { 1e-4 } else { 1e-2 });
            lambda_sequence(lambda_max, ratio, params.n_lambda)?
        }
    };

    let mut path = GlmPath {
        family,
        lambdas: Vec::with_capacity(lambdas.len()),
        intercepts: Vec::with_capacity(lambdas.len()),
        coefficients: Vec::with_capacity(lambdas.len()),
        df: Vec::with_capacity(lambdas.len()),
        dev_ratio: Vec::with_capacity(lambdas.len()),
        null_deviance: null_dev,
        n_obs: n,
        passes: 0,
    };

    for (k, &lambda) in lambdas.iter().enumerate() {
        let budget = params.max_iterations.saturating_sub(passes);
        if budget == 0 {
            return Err(AppError::numerical(format!(
                "Exceeded max_iterations ({}) after {k} of {} lambdas.",
                params.max_iterations,
                lambdas.len()
            )));
        }
        passes += fit_at_lambda(&scaled.xs, y, &pf, params, lambda, &mut state, budget)?;

        let mu = fitted_mean(&scaled.xs, family, &state);
        let dev = deviance(family, y, &mu);
        let ratio = 1.0 - dev / null_dev;
        if !ratio.is_finite() {
            return Err(AppError::numerical(format!(
                "Non-finite deviance at lambda={lambda:.6e}."
            )));
        }

        let (b0, beta) = unstandardize(&scaled, &state);
        let df = beta.iter().filter(|b| **b != 0.0).count();
        tracing::debug!(k, lambda, df, dev_ratio = ratio, passes, "path point");

        let prev_ratio = path.dev_ratio.last().copied();
        path.lambdas.push(lambda);
        path.intercepts.push(b0);
        path.coefficients.push(beta);
        path.df.push(df);
        path.dev_ratio.push(ratio);

        if generated && k + 1 >= lambdas.len().min(MIN_PATH_POINTS) {
            if ratio > DEV_RATIO_MAX {
                tracing::debug!(k, "stopping path: deviance ratio saturated");
                break;
            }
            if let Some(prev) = prev_ratio {
                if ratio - prev < DEV_RATIO_MIN_GAIN * ratio {
                    tracing::debug!(k, "stopping path: deviance ratio stalled");
                    break;
                }
            }
        }
    }

    path.passes = passes;
    Ok(path)
}

fn validate_inputs(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    penalty_factors: &[f64],
    params: &GlmParams,
) -> Result<(), AppError> {
    let n = x.nrows();
    let p = x.ncols();
    if n < 2 || p == 0 {
        return Err(AppError::insufficient(format!(
            "Need at least 2 observations and 1 feature, got n={n}, p={p}."
        )));
    }
    if y.len() != n {
        return Err(AppError::invalid(format!(
            "Response length ({}) != number of observations ({n}).",
            y.len()
        )));
    }
    if penalty_factors.len() != p {
        return Err(AppError::invalid(format!(
            "Penalty factor length ({}) != number of features ({p}).",
            penalty_factors.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AppError::invalid("Feature matrix contains non-finite values."));
    }
    if !(params.alpha.is_finite() && (0.0..=1.0).contains(&params.alpha)) {
        return Err(AppError::invalid(format!(
            "Invalid alpha: {} (must be in [0, 1]).",
            params.alpha
        )));
    }
    if !(params.tolerance.is_finite() && params.tolerance > 0.0) {
        return Err(AppError::invalid("Tolerance must be finite and > 0."));
    }
    if params.max_iterations == 0 || params.max_irls_iterations == 0 {
        return Err(AppError::invalid("Iteration limits must be >= 1."));
    }
    validate_response(params.family, y)
}

/// Rescale finite penalty factors so they sum to their count.
fn rescale_penalty_factors(pf: &[f64]) -> Result<Vec<f64>, AppError> {
    if let Some((j, v)) = pf.iter().enumerate().find(|(_, v)| v.is_nan() || **v < 0.0) {
        return Err(AppError::invalid(format!(
            "Invalid penalty factor {v} for feature {j} (must be >= 0)."
        )));
    }
    let finite: Vec<f64> = pf.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(AppError::invalid("Every feature is excluded (all penalty factors are infinite)."));
    }
    let sum: f64 = finite.iter().sum();
    if sum <= 0.0 {
        return Ok(pf.to_vec());
    }
    let factor = finite.len() as f64 / sum;
    Ok(pf
        .iter()
        .map(|&v| if v.is_finite() { v * factor } else { v })
        .collect())
}

fn standardize(x: &DMatrix<f64>, scale_columns: bool, intercept: bool) -> Standardized {
    let n = x.nrows();
    let p = x.ncols();
    let mut xs = x.clone();
    let mut center = vec![0.0; p];
    let mut scale = vec![1.0; p];

    for j in 0..p {
        let mut col = xs.column_mut(j);
        if intercept {
            let mean = col.mean();
            col.add_scalar_mut(-mean);
            center[j] = mean;
        }
        if scale_columns {
            let sd = (col.iter().map(|v| v * v).sum::<f64>() / n as f64).sqrt();
            if sd > 1e-12 {
                col /= sd;
                scale[j] = sd;
            } else {
                // Constant column: drop it from the fit.
                col.fill(0.0);
            }
        }
    }

    Standardized { xs, center, scale }
}

fn unstandardize(scaled: &Standardized, state: &PathState) -> (f64, Vec<f64>) {
    let beta: Vec<f64> = state
        .beta
        .iter()
        .zip(scaled.scale.iter())
        .map(|(&b, &s)| b / s)
        .collect();
    let shift: f64 = beta.iter().zip(scaled.center.iter()).map(|(b, c)| b * c).sum();
    (state.b0 - shift, beta)
}

fn fitted_mean(xs: &DMatrix<f64>, family: Family, state: &PathState) -> DVector<f64> {
    let eta = xs * &state.beta;
    eta.map(|e| link_inverse(family, e + state.b0))
}

/// Smallest lambda at which every penalized coefficient stays at zero.
fn lambda_max(
    xs: &DMatrix<f64>,
    y: &DVector<f64>,
    pf: &[f64],
    alpha: f64,
    family: Family,
    null_state: &PathState,
) -> f64 {
    let n = xs.nrows() as f64;
    let mu = fitted_mean(xs, family, null_state);
    let resid = y - mu;
    let alpha = alpha.max(ALPHA_FLOOR);

    let mut out = 0.0_f64;
    for (j, &pfj) in pf.iter().enumerate() {
        if !(pfj.is_finite() && pfj > 0.0) {
            continue;
        }
        let score = xs.column(j).dot(&resid).abs() / n;
        out = out.max(score / (alpha * pfj));
    }

    if out > 0.0 && out.is_finite() {
        // Nudge up so rounding in the coordinate sums cannot activate a feature.
        out * (1.0 + LAMBDA_MAX_SLACK)
    } else {
        // No penalized feature carries signal; any positive path will do.
        1e-6
    }
}

/// Solve at one lambda (IRLS outer loop for non-Gaussian families).
fn fit_at_lambda(
    xs: &DMatrix<f64>,
    y: &DVector<f64>,
    pf: &[f64],
    params: &GlmParams,
    lambda: f64,
    state: &mut PathState,
    budget: usize,
) -> Result<usize, AppError> {
    let n = xs.nrows();
    let family = params.family;

    if family == Family::Gaussian {
        let v = DVector::from_element(n, 1.0 / n as f64);
        let mut cd = CoordinateDescent::new(xs, y, &v, pf, params.alpha, params.intercept, state.b0, &state.beta);
        return cd.solve(lambda, &mut state.b0, &mut state.beta, params.tolerance, budget);
    }

    let mut passes = 0usize;
    let mut dev_old = deviance(family, y, &fitted_mean(xs, family, state));
    for iter in 0..params.max_irls_iterations {
        let eta = xs * &state.beta;
        let mut v = DVector::<f64>::zeros(n);
        let mut z = DVector::<f64>::zeros(n);
        for i in 0..n {
            let e = eta[i] + state.b0;
            let mu = link_inverse(family, e);
            let w = irls_weight(family, mu);
            v[i] = w / n as f64;
            z[i] = e + (y[i] - mu) / w;
        }

        let remaining = budget.saturating_sub(passes);
        if remaining == 0 {
            return Err(AppError::numerical(format!(
                "Exceeded max_iterations during IRLS at lambda={lambda:.6e}."
            )));
        }
        let mut cd = CoordinateDescent::new(xs, &z, &v, pf, params.alpha, params.intercept, state.b0, &state.beta);
        passes += cd.solve(lambda, &mut state.b0, &mut state.beta, params.tolerance, remaining)?;

        let dev = deviance(family, y, &fitted_mean(xs, family, state));
        if !dev.is_finite() {
            return Err(AppError::numerical(format!(
                "IRLS diverged at lambda={lambda:.6e} (non-finite deviance)."
            )));
        }
        if (dev - dev_old).abs() / (dev.abs() + 0.1) < params.tolerance {
            return Ok(passes);
        }
        dev_old = dev;

        if iter + 1 == params.max_irls_iterations {
            tracing::warn!(
                lambda,
                iterations = params.max_irls_iterations,
                "IRLS did not converge; keeping last iterate"
            );
        }
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, 3, |i, j| {
            let t = i as f64;
            match j {
                0 => (t * 0.7).sin() + 0.1 * t,
                1 => (t * 1.3).cos(),
                _ => ((i * 7) % 5) as f64 - 2.0,
            }
        })
    }

    #[test]
    fn first_lambda_zeros_penalized_coefficients() {
        let x = design(30);
        let y = DVector::from_fn(30, |i, _| 1.0 + 2.0 * x[(i, 0)] - 0.5 * x[(i, 2)]);
        let path = fit_path(&x, &y, &[1.0, 1.0, 1.0], &GlmParams::default()).unwrap();

        assert!(path.coefficients[0].iter().all(|b| *b == 0.0));
        assert!(path.lambdas.windows(2).all(|w| w[1] < w[0]));
        assert!(path.df.last().copied().unwrap_or(0) >= 2);
    }

    #[test]
    fn small_lambda_approaches_least_squares() {
        let x = design(40);
        let y = DVector::from_fn(40, |i, _| 0.5 + 1.5 * x[(i, 0)] + 0.8 * x[(i, 1)] - 0.3 * x[(i, 2)]);
        let params = GlmParams {
            lambdas: Some(vec![1e-1, 1e-3, 1e-6]),
            tolerance: 1e-14,
            ..GlmParams::default()
        };
        let path = fit_path(&x, &y, &[1.0, 1.0, 1.0], &params).unwrap();

        let mut xd = DMatrix::<f64>::zeros(40, 4);
        for i in 0..40 {
            xd[(i, 0)] = 1.0;
            for j in 0..3 {
                xd[(i, j + 1)] = x[(i, j)];
            }
        }
        let ols = xd.svd(true, true).solve(&y, 1e-12).unwrap();
        let k = path.n_lambda() - 1;
        assert!((path.intercepts[k] - ols[0]).abs() < 1e-4);
        for j in 0..3 {
            assert!(
                (path.coefficients[k][j] - ols[j + 1]).abs() < 1e-4,
                "coef {j}: {} vs {}",
                path.coefficients[k][j],
                ols[j + 1]
            );
        }
    }

    #[test]
    fn excluded_feature_never_enters() {
        let x = design(30);
        let y = DVector::from_fn(30, |i, _| 3.0 * x[(i, 0)] + x[(i, 1)]);
        let path = fit_path(&x, &y, &[f64::INFINITY, 1.0, 1.0], &GlmParams::default()).unwrap();
        assert!(path.coefficients.iter().all(|beta| beta[0] == 0.0));
    }

    #[test]
    fn unpenalized_feature_is_active_from_the_start() {
        let x = design(30);
        let y = DVector::from_fn(30, |i, _| 3.0 * x[(i, 0)] + x[(i, 1)]);
        let path = fit_path(&x, &y, &[0.0, 1.0, 1.0], &GlmParams::default()).unwrap();
        assert!(path.coefficients[0][0] != 0.0);
        assert_eq!(path.coefficients[0][1], 0.0);
    }

    #[test]
    fn saturated_path_still_reaches_minimum_length() {
        // The unpenalized feature alone explains nearly all the deviance.
        let x = design(50);
        let y = DVector::from_fn(50, |i, _| 3.0 * x[(i, 0)] + 0.02 * x[(i, 1)] - 0.02 * x[(i, 2)]);
        let path = fit_path(&x, &y, &[0.0, 1.0, 1.0], &GlmParams::default()).unwrap();
        assert_eq!(path.n_lambda(), MIN_PATH_POINTS);
        assert!(path.dev_ratio.iter().all(|r| *r > DEV_RATIO_MAX));

        let short = GlmParams {
            n_lambda: 3,
            ..GlmParams::default()
        };
        assert_eq!(fit_path(&x, &y, &[0.0, 1.0, 1.0], &short).unwrap().n_lambda(), 3);
    }

    #[test]
    fn stalled_path_stops_before_the_last_lambda() {
        let x = design(40);
        let y = DVector::from_fn(40, |i, _| x[(i, 0)] + ((i * 13) % 17) as f64 / 17.0 - 0.5);
        let path = fit_path(&x, &y, &[1.0, 1.0, 1.0], &GlmParams::default()).unwrap();
        let n = path.n_lambda();
        assert!(n >= MIN_PATH_POINTS && n < 100, "n_lambda={n}");

        let last = path.dev_ratio[n - 1];
        assert!(last < DEV_RATIO_MAX);
        assert!(last - path.dev_ratio[n - 2] < DEV_RATIO_MIN_GAIN * last);
    }

    #[test]
    fn explicit_lambdas_are_never_cut_short() {
        let x = design(50);
        let y = DVector::from_fn(50, |i, _| 3.0 * x[(i, 0)] + 0.02 * x[(i, 1)]);
        let params = GlmParams {
            lambdas: Some(vec![1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01, 0.005]),
            ..GlmParams::default()
        };
        assert_eq!(fit_path(&x, &y, &[0.0, 1.0, 1.0], &params).unwrap().n_lambda(), 8);
    }

    #[test]
    fn binomial_path_increases_explained_deviance() {
        let x = design(60);
        let y = DVector::from_fn(60, |i, _| if x[(i, 0)] + 0.5 * x[(i, 1)] > 0.3 { 1.0 } else { 0.0 });
        let params = GlmParams {
            family: Family::Binomial,
            n_lambda: 20,
            ..GlmParams::default()
        };
        let path = fit_path(&x, &y, &[1.0, 1.0, 1.0], &params).unwrap();
        let first = path.dev_ratio[0];
        let last = *path.dev_ratio.last().unwrap();
        assert!(first.abs() < 1e-6, "null deviance ratio should be ~0, got {first}");
        assert!(last > 0.3, "expected a useful fit, got {last}");
    }

    #[test]
    fn poisson_path_fits_counts() {
        let x = design(50);
        let y = DVector::from_fn(50, |i, _| (0.4 + 0.6 * x[(i, 0)]).exp().round());
        let params = GlmParams {
            family: Family::Poisson,
            n_lambda: 15,
            ..GlmParams::default()
        };
        let path = fit_path(&x, &y, &[1.0, 1.0, 1.0], &params).unwrap();
        assert!(path.coefficients.last().unwrap()[0] > 0.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let x = design(10);
        let y = DVector::from_element(9, 1.0);
        assert!(fit_path(&x, &y, &[1.0; 3], &GlmParams::default()).is_err());

        let y = DVector::from_fn(10, |i, _| i as f64);
        assert!(fit_path(&x, &y, &[1.0; 2], &GlmParams::default()).is_err());

        let bad_alpha = GlmParams {
            alpha: 1.5,
            ..GlmParams::default()
        };
        assert!(fit_path(&x, &y, &[1.0; 3], &bad_alpha).is_err());
        assert!(fit_path(&x, &y, &[f64::INFINITY; 3], &GlmParams::default()).is_err());

        let constant = DVector::from_element(10, 2.0);
        assert!(fit_path(&x, &constant, &[1.0; 3], &GlmParams::default()).is_err());
    }

    #[test]
    fn penalty_factors_are_rescaled_to_their_count() {
        let pf = rescale_penalty_factors(&[2.0, 6.0, f64::INFINITY, 0.0]).unwrap();
        assert!((pf[0] - 0.75).abs() < 1e-12);
        assert!((pf[1] - 2.25).abs() < 1e-12);
        assert!(pf[2].is_infinite());
        assert_eq!(pf[3], 0.0);
    }
}
