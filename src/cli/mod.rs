//! Command-line parsing for the network-penalized GLM fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CvMeasure, Family, NetworkMethod};
use crate::network::DegreeTransform;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "netglm", version, about = "Network-penalized elastic-net GLM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the regularization path, print a summary, and optionally plot/export.
    Fit(FitArgs),
    /// Cross-validate the path and report lambda_min / lambda_1se.
    Cv(CvArgs),
    /// Write a synthetic data set to CSV.
    Synth(SynthArgs),
}

/// Options shared by `fit` and `cv`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input CSV (header row, numeric columns).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Name of the response column; every other column is a feature.
    #[arg(short = 'y', long, default_value = "y")]
    pub response: String,

    /// How to derive the feature network.
    #[arg(long, value_enum, default_value_t = NetworkMethod::Correlation)]
    pub network: NetworkMethod,

    /// Degree -> penalty factor transform.
    #[arg(short = 't', long, value_enum, default_value_t = DegreeTransform::Identity)]
    pub transform: DegreeTransform,

    /// Outcome family.
    #[arg(short = 'f', long, value_enum, default_value_t = Family::Gaussian)]
    pub family: Family,

    /// Elastic-net mixing (1 = lasso, 0 = ridge).
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Number of lambdas on the path.
    #[arg(long, default_value_t = 100)]
    pub n_lambda: usize,

    /// Smallest lambda as a fraction of lambda_max.
    #[arg(long)]
    pub lambda_min_ratio: Option<f64>,

    /// Degrees below this are raised to it before the transform.
    #[arg(long, default_value_t = 0.0)]
    pub min_degree: f64,

    /// Edges with |weight| <= cutoff are dropped.
    #[arg(long, default_value_t = 0.0)]
    pub cutoff: f64,

    /// Sum absolute edge weights instead of counting edges.
    #[arg(long)]
    pub weighted: bool,

    /// TOML options file overriding the flags above.
    #[arg(long, env = "NETGLM_CONFIG", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Show the top-N coefficients.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export coefficients to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

/// Options for `cv`.
#[derive(Debug, Args, Clone)]
pub struct CvArgs {
    #[command(flatten)]
    pub fit: FitArgs,

    /// Number of folds.
    #[arg(short = 'k', long, default_value_t = 10)]
    pub folds: usize,

    /// Seed for fold assignment.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Held-out loss.
    #[arg(long, value_enum, default_value_t = CvMeasure::Deviance)]
    pub measure: CvMeasure,
}

/// Options for `synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: PathBuf,

    #[arg(short = 'n', long, default_value_t = 200)]
    pub n_obs: usize,

    #[arg(short = 'p', long, default_value_t = 20)]
    pub n_features: usize,

    /// Features with a non-zero true coefficient.
    #[arg(long, default_value_t = 5)]
    pub n_active: usize,

    /// Correlation between adjacent features.
    #[arg(long, default_value_t = 0.5)]
    pub rho: f64,

    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 1.0)]
    pub signal: f64,

    #[arg(short = 'f', long, value_enum, default_value_t = Family::Gaussian)]
    pub family: Family,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
