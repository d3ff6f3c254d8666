//! Shared "fit pipeline" logic used by the `fit` and `cv` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> network -> degree -> penalty factors -> path (-> CV)
//!
//! The command handlers can then focus on presentation.

use crate::domain::RunConfig;
use crate::error::AppError;
use crate::io::ingest::{IngestedData, load_dataset};
use crate::network::NetworkSpec;
use crate::sparsenet::{CvSparseNetFit, SparseNetFit, cv_glm_sparse_net, glm_sparse_net};

/// All computed outputs of a single `netglm fit` run.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub ingest: IngestedData,
    pub fit: SparseNetFit,
}

/// All computed outputs of a single `netglm cv` run.
#[derive(Debug, Clone)]
pub struct CvOutput {
    pub ingest: IngestedData,
    pub cv: CvSparseNetFit,
}

/// Execute the single-fit pipeline.
pub fn run_fit(config: &RunConfig) -> Result<FitOutput, AppError> {
    let ingest = load_dataset(&config.csv_path, &config.response)?;
    let ds = &ingest.dataset;
    let fit = glm_sparse_net(
        &ds.x,
        &ds.y,
        &NetworkSpec::from(config.network),
        &config.options,
        &config.cv.glm,
    )?;
    Ok(FitOutput { ingest, fit })
}

/// Execute the cross-validation pipeline.
pub fn run_cv(config: &RunConfig) -> Result<CvOutput, AppError> {
    let ingest = load_dataset(&config.csv_path, &config.response)?;
    let ds = &ingest.dataset;
    let cv = cv_glm_sparse_net(
        &ds.x,
        &ds.y,
        &NetworkSpec::from(config.network),
        &config.options,
        &config.cv,
    )?;
    Ok(CvOutput { ingest, cv })
}
