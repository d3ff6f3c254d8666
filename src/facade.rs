//! Named entry points that pick the degree transform.
//!
//! Each facade installs one transform into a copy of the caller's options and
//! forwards everything else, unchanged, to the dispatcher:
//!
//! | facade | transform | entry point |
//! |---|---|---|
//! | `glm_orphan` / `cv_glm_orphan` | orphan heuristic | single / CV |
//! | `glm_hub` / `cv_glm_hub` | hub heuristic | single / CV |
//! | `glm_degree` / `cv_glm_degree` | `1/x` | single / CV |
//!
//! The `*_with` forms accept any [`FitDispatcher`].

use nalgebra::{DMatrix, DVector};

use crate::domain::{CvParams, GlmParams, NetworkOptions};
use crate::error::AppError;
use crate::network::{NetworkSpec, degree_transform, hub_heuristic, orphan_heuristic};
use crate::sparsenet::{CvSparseNetFit, FitDispatcher, SparseNet, SparseNetFit};

/// [`glm_orphan`] against any dispatcher.
pub fn glm_orphan_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<D::Model, AppError> {
    dispatcher.glm(x, y, network, &options.with_transform(orphan_heuristic()), params)
}

/// [`glm_hub`] against any dispatcher.
pub fn glm_hub_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<D::Model, AppError> {
    dispatcher.glm(x, y, network, &options.with_transform(hub_heuristic()), params)
}

/// [`glm_degree`] against any dispatcher.
pub fn glm_degree_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<D::Model, AppError> {
    dispatcher.glm(x, y, network, &options.with_transform(degree_transform()), params)
}

/// [`cv_glm_orphan`] against any dispatcher.
pub fn cv_glm_orphan_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<D::CvModel, AppError> {
    dispatcher.cv_glm(x, y, network, &options.with_transform(orphan_heuristic()), params)
}

/// [`cv_glm_hub`] against any dispatcher.
pub fn cv_glm_hub_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<D::CvModel, AppError> {
    dispatcher.cv_glm(x, y, network, &options.with_transform(hub_heuristic()), params)
}

/// [`cv_glm_degree`] against any dispatcher.
pub fn cv_glm_degree_with<D: FitDispatcher>(
    dispatcher: &D,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<D::CvModel, AppError> {
    dispatcher.cv_glm(x, y, network, &options.with_transform(degree_transform()), params)
}

/// Orphan-penalized single fit.
pub fn glm_orphan(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<SparseNetFit, AppError> {
    glm_orphan_with(&SparseNet, x, y, network, options, params)
}

/// Hub-penalized single fit.
pub fn glm_hub(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<SparseNetFit, AppError> {
    glm_hub_with(&SparseNet, x, y, network, options, params)
}

/// Inverse-degree penalized single fit.
pub fn glm_degree(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &GlmParams,
) -> Result<SparseNetFit, AppError> {
    glm_degree_with(&SparseNet, x, y, network, options, params)
}

/// Orphan-penalized cross-validated fit.
pub fn cv_glm_orphan(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<CvSparseNetFit, AppError> {
    cv_glm_orphan_with(&SparseNet, x, y, network, options, params)
}

/// Hub-penalized cross-validated fit.
pub fn cv_glm_hub(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<CvSparseNetFit, AppError> {
    cv_glm_hub_with(&SparseNet, x, y, network, options, params)
}

/// Inverse-degree penalized cross-validated fit.
pub fn cv_glm_degree(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    network: &NetworkSpec,
    options: &NetworkOptions,
    params: &CvParams,
) -> Result<CvSparseNetFit, AppError> {
    cv_glm_degree_with(&SparseNet, x, y, network, options, params)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    use super::*;
    use crate::network::DegreeTransform;
    use crate::sparsenet::{cv_glm_sparse_net, glm_sparse_net};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum EntryPoint {
        Single,
        Cv,
    }

    #[derive(Debug, Clone)]
    struct Call {
        entry: EntryPoint,
        options: NetworkOptions,
        network: NetworkSpec,
        n_obs: usize,
    }

    /// Records what it was called with instead of fitting.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Call>>,
        fail_with: Option<AppError>,
    }

    impl Recorder {
        fn record(&self, entry: EntryPoint, x: &DMatrix<f64>, network: &NetworkSpec, options: &NetworkOptions) -> Result<(), AppError> {
            self.calls.borrow_mut().push(Call {
                entry,
                options: options.clone(),
                network: network.clone(),
                n_obs: x.nrows(),
            });
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn last(&self) -> Call {
            self.calls.borrow().last().cloned().unwrap()
        }
    }

    impl FitDispatcher for Recorder {
        type Model = GlmParams;
        type CvModel = CvParams;

        fn glm(
            &self,
            x: &DMatrix<f64>,
            _y: &DVector<f64>,
            network: &NetworkSpec,
            options: &NetworkOptions,
            params: &GlmParams,
        ) -> Result<GlmParams, AppError> {
            self.record(EntryPoint::Single, x, network, options)?;
            Ok(params.clone())
        }

        fn cv_glm(
            &self,
            x: &DMatrix<f64>,
            _y: &DVector<f64>,
            network: &NetworkSpec,
            options: &NetworkOptions,
            params: &CvParams,
        ) -> Result<CvParams, AppError> {
            self.record(EntryPoint::Cv, x, network, options)?;
            Ok(params.clone())
        }
    }

    type SingleFacade =
        fn(&Recorder, &DMatrix<f64>, &DVector<f64>, &NetworkSpec, &NetworkOptions, &GlmParams) -> Result<GlmParams, AppError>;
    type CvFacade =
        fn(&Recorder, &DMatrix<f64>, &DVector<f64>, &NetworkSpec, &NetworkOptions, &CvParams) -> Result<CvParams, AppError>;

    fn synthetic(seed: u64) -> (DMatrix<f64>, DVector<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x = DMatrix::from_fn(20, 5, |_, _| StandardNormal.sample(&mut rng));
        let y = DVector::from_fn(20, |_, _| StandardNormal.sample(&mut rng));
        (x, y)
    }

    fn custom_options() -> NetworkOptions {
        NetworkOptions {
            min_degree: 0.2,
            cutoff: 0.1,
            unweighted: false,
            parallel: false,
            ..NetworkOptions::default()
        }
    }

    #[test]
    fn single_fit_facades_install_their_transform() {
        let (x, y) = synthetic(1);
        let rec = Recorder::default();
        let opts = custom_options();
        let params = GlmParams {
            alpha: 0.5,
            ..GlmParams::default()
        };

        let cases: [(SingleFacade, DegreeTransform); 3] = [
            (glm_orphan_with::<Recorder>, DegreeTransform::Orphan),
            (glm_hub_with::<Recorder>, DegreeTransform::Hub),
            (glm_degree_with::<Recorder>, DegreeTransform::Degree),
        ];
        for (facade, transform) in cases {
            let forwarded = facade(&rec, &x, &y, &NetworkSpec::Correlation, &opts, &params).unwrap();
            let call = rec.last();
            assert_eq!(call.entry, EntryPoint::Single);
            assert_eq!(call.options, opts.with_transform(transform));
            assert_eq!(call.network, NetworkSpec::Correlation);
            assert_eq!(call.n_obs, 20);
            assert_eq!(forwarded, params);
        }
        assert_eq!(rec.calls.borrow().len(), 3);
    }

    #[test]
    fn cv_facades_install_their_transform() {
        let (x, y) = synthetic(2);
        let rec = Recorder::default();
        let opts = custom_options();
        let params = CvParams {
            n_folds: 4,
            seed: 9,
            ..CvParams::default()
        };

        let cases: [(CvFacade, DegreeTransform); 3] = [
            (cv_glm_orphan_with::<Recorder>, DegreeTransform::Orphan),
            (cv_glm_hub_with::<Recorder>, DegreeTransform::Hub),
            (cv_glm_degree_with::<Recorder>, DegreeTransform::Degree),
        ];
        for (facade, transform) in cases {
            let forwarded = facade(&rec, &x, &y, &NetworkSpec::Covariance, &opts, &params).unwrap();
            let call = rec.last();
            assert_eq!(call.entry, EntryPoint::Cv);
            assert_eq!(call.options.transform, transform);
            assert_eq!(forwarded, params);
        }
    }

    #[test]
    fn caller_options_are_left_untouched() {
        let (x, y) = synthetic(3);
        let rec = Recorder::default();
        let opts = custom_options();
        let before = opts.clone();

        glm_degree_with(&rec, &x, &y, &NetworkSpec::Correlation, &opts, &GlmParams::default()).unwrap();
        cv_glm_hub_with(&rec, &x, &y, &NetworkSpec::Correlation, &opts, &CvParams::default()).unwrap();

        assert_eq!(opts, before);
        for call in rec.calls.borrow().iter() {
            assert_eq!(call.options.min_degree, before.min_degree);
            assert_eq!(call.options.cutoff, before.cutoff);
            assert_eq!(call.options.unweighted, before.unweighted);
            assert_eq!(call.options.heuristic, before.heuristic);
        }
    }

    #[test]
    fn dispatcher_errors_pass_through_unchanged() {
        let (x, y) = synthetic(4);
        let err = AppError::insufficient("fold count exceeds observations");
        let rec = Recorder {
            fail_with: Some(err.clone()),
            ..Recorder::default()
        };
        let opts = NetworkOptions::default();

        assert_eq!(glm_orphan_with(&rec, &x, &y, &NetworkSpec::Correlation, &opts, &GlmParams::default()).unwrap_err(), err);
        assert_eq!(cv_glm_degree_with(&rec, &x, &y, &NetworkSpec::Correlation, &opts, &CvParams::default()).unwrap_err(), err);
    }

    #[test]
    fn single_fit_facades_match_direct_calls() {
        let (x, y) = synthetic(5);
        let opts = NetworkOptions {
            unweighted: false,
            min_degree: 0.1,
            ..NetworkOptions::default()
        };
        let params = GlmParams::default();
        let net = NetworkSpec::Correlation;

        let direct = |t| glm_sparse_net(&x, &y, &net, &opts.with_transform(t), &params).unwrap();
        assert_eq!(glm_orphan(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Orphan));
        assert_eq!(glm_hub(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Hub));
        assert_eq!(glm_degree(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Degree));
    }

    #[test]
    fn cv_facades_match_direct_calls() {
        let (x, y) = synthetic(6);
        let opts = NetworkOptions::default();
        let params = CvParams {
            n_folds: 5,
            ..CvParams::default()
        };
        let net = NetworkSpec::Correlation;

        let direct = |t| cv_glm_sparse_net(&x, &y, &net, &opts.with_transform(t), &params).unwrap();
        assert_eq!(cv_glm_orphan(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Orphan));
        assert_eq!(cv_glm_hub(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Hub));
        assert_eq!(cv_glm_degree(&x, &y, &net, &opts, &params).unwrap(), direct(DegreeTransform::Degree));
    }

    #[test]
    fn all_six_facades_fit_a_small_random_problem() {
        let (x, y) = synthetic(7);
        let opts = NetworkOptions::default();
        let net = NetworkSpec::Correlation;

        for fit in [
            glm_orphan(&x, &y, &net, &opts, &GlmParams::default()).unwrap(),
            glm_hub(&x, &y, &net, &opts, &GlmParams::default()).unwrap(),
            glm_degree(&x, &y, &net, &opts, &GlmParams::default()).unwrap(),
        ] {
            assert_eq!(fit.penalty_factors.len(), 5);
            assert!(fit.path.n_lambda() >= 1);
        }
        for cv in [
            cv_glm_orphan(&x, &y, &net, &opts, &CvParams::default()).unwrap(),
            cv_glm_hub(&x, &y, &net, &opts, &CvParams::default()).unwrap(),
            cv_glm_degree(&x, &y, &net, &opts, &CvParams::default()).unwrap(),
        ] {
            assert_eq!(cv.cv.n_folds, 10);
            assert!(cv.cv.lambda_1se >= cv.cv.lambda_min);
        }
    }
}
