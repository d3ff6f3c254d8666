//! Optional TOML options file.
//!
//! CLI flags produce a [`RunConfig`]; an options file (`--config`, or the
//! `NETGLM_CONFIG` environment variable) then overrides any field it sets.
//!
//! ```toml
//! [network]
//! transform = "hub"
//! min_degree = 0.5
//! scale = 5.0
//!
//! [glm]
//! family = "binomial"
//! alpha = 0.9
//!
//! [cv]
//! n_folds = 5
//! measure = "class"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CvMeasure, Family, RunConfig};
use crate::error::AppError;
use crate::network::DegreeTransform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsFile {
    pub network: NetworkSection,
    pub glm: GlmSection,
    pub cv: CvSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    pub transform: Option<DegreeTransform>,
    pub scale: Option<f64>,
    pub floor: Option<f64>,
    pub unweighted: Option<bool>,
    pub cutoff: Option<f64>,
    pub min_degree: Option<f64>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlmSection {
    pub family: Option<Family>,
    pub alpha: Option<f64>,
    pub n_lambda: Option<usize>,
    pub lambda_min_ratio: Option<f64>,
    pub lambdas: Option<Vec<f64>>,
    pub standardize: Option<bool>,
    pub intercept: Option<bool>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
    pub max_irls_iterations: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CvSection {
    pub n_folds: Option<usize>,
    pub seed: Option<u64>,
    pub measure: Option<CvMeasure>,
}

/// Read and parse an options file.
pub fn load_options_file(path: &Path) -> Result<OptionsFile, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config '{}': {e}", path.display())))?;
    parse_options(&content).map_err(|e| match e {
        AppError::InvalidInput(msg) => AppError::invalid(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn parse_options(content: &str) -> Result<OptionsFile, AppError> {
    toml::from_str(content).map_err(|e| AppError::invalid(format!("Invalid config: {e}")))
}

impl OptionsFile {
    /// Overlay every field set in the file onto `config`.
    pub fn apply(&self, config: &mut RunConfig) {
        let net = &self.network;
        let opts = &mut config.options;
        set(&mut opts.transform, net.transform);
        set(&mut opts.heuristic.scale, net.scale);
        set(&mut opts.heuristic.floor, net.floor);
        set(&mut opts.unweighted, net.unweighted);
        set(&mut opts.cutoff, net.cutoff);
        set(&mut opts.min_degree, net.min_degree);
        set(&mut opts.parallel, net.parallel);

        let g = &self.glm;
        let glm = &mut config.cv.glm;
        set(&mut glm.family, g.family);
        set(&mut glm.alpha, g.alpha);
        set(&mut glm.n_lambda, g.n_lambda);
        if g.lambda_min_ratio.is_some() {
            glm.lambda_min_ratio = g.lambda_min_ratio;
        }
        if g.lambdas.is_some() {
            glm.lambdas = g.lambdas.clone();
        }
        set(&mut glm.standardize, g.standardize);
        set(&mut glm.intercept, g.intercept);
        set(&mut glm.tolerance, g.tolerance);
        set(&mut glm.max_iterations, g.max_iterations);
        set(&mut glm.max_irls_iterations, g.max_irls_iterations);

        let cv = &mut config.cv;
        set(&mut cv.n_folds, self.cv.n_folds);
        set(&mut cv.seed, self.cv.seed);
        set(&mut cv.measure, self.cv.measure);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{CvParams, NetworkMethod, NetworkOptions};

    fn base_config() -> RunConfig {
        RunConfig {
            csv_path: PathBuf::from("data.csv"),
            response: "y".into(),
            network: NetworkMethod::Correlation,
            options: NetworkOptions::default(),
            cv: CvParams::default(),
            top_n: 10,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_coefficients: None,
            export_model: None,
        }
    }

    #[test]
    fn only_listed_fields_are_overridden() {
        let file = parse_options(
            r#"
            [network]
            transform = "orphan"
            scale = 4.0

            [glm]
            family = "poisson"
            lambdas = [1.0, 0.1]

            [cv]
            measure = "mae"
            "#,
        )
        .unwrap();

        let mut config = base_config();
        file.apply(&mut config);

        assert_eq!(config.options.transform, DegreeTransform::Orphan);
        assert_eq!(config.options.heuristic.scale, 4.0);
        assert_eq!(config.options.heuristic.floor, NetworkOptions::default().heuristic.floor);
        assert_eq!(config.cv.glm.family, Family::Poisson);
        assert_eq!(config.cv.glm.lambdas, Some(vec![1.0, 0.1]));
        assert_eq!(config.cv.glm.alpha, 1.0);
        assert_eq!(config.cv.measure, CvMeasure::Mae);
        assert_eq!(config.cv.n_folds, 10);
    }

    #[test]
    fn empty_file_changes_nothing() {
        let mut config = base_config();
        parse_options("").unwrap().apply(&mut config);
        assert_eq!(config.options, NetworkOptions::default());
        assert_eq!(config.cv, CvParams::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_options("[network]\nmindegree = 1.0\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netglm.toml");
        std::fs::write(&path, "[cv]\nn_folds = 5\n").unwrap();
        assert_eq!(load_options_file(&path).unwrap().cv.n_folds, Some(5));
        assert!(load_options_file(&dir.path().join("missing.toml")).is_err());
    }
}
