//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the run configuration (flags + optional TOML file)
//! - runs the fit or cross-validation pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, CvArgs, FitArgs, SynthArgs};
use crate::data::SynthParams;
use crate::domain::{CvParams, GlmParams, NetworkOptions, RunConfig};
use crate::error::AppError;
use crate::io::ModelFile;

pub mod pipeline;

/// Entry point for the `netglm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Cv(args) => handle_cv(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = resolve_config(&args, None)?;
    let run = pipeline::run_fit(&config)?;
    let ds = &run.ingest.dataset;

    println!("{}", crate::report::format_fit_summary(&run.ingest, &run.fit, &config));

    // Report at the end of the path.
    let lambda = run.fit.path.lambdas.last().copied().unwrap_or(0.0);
    let rows = crate::report::top_coefficients(&run.fit, &ds.feature_names, lambda, config.top_n)?;
    println!("{}", crate::report::format_coefficients(&rows, lambda));

    if config.plot {
        println!(
            "{}",
            crate::plot::render_dev_ratio_plot(&run.fit.path, config.plot_width, config.plot_height)
        );
    }

    if let Some(path) = &config.export_coefficients {
        crate::io::write_coefficients_csv(path, &run.fit, &ds.feature_names, lambda)?;
    }
    if let Some(path) = &config.export_model {
        let model = ModelFile::new(run.fit.clone(), None, ds.feature_names.clone(), ds.response_name.clone());
        crate::io::write_model_json(path, &model)?;
    }

    Ok(())
}

fn handle_cv(args: CvArgs) -> Result<(), AppError> {
    let config = resolve_config(&args.fit, Some(&args))?;
    let run = pipeline::run_cv(&config)?;
    let ds = &run.ingest.dataset;
    let cv = &run.cv;

    println!("{}", crate::report::format_fit_summary(&run.ingest, &cv.fit, &config));
    println!("{}", crate::report::format_cv_summary(&cv.cv));

    let lambda = cv.cv.lambda_1se;
    let rows = crate::report::top_coefficients(&cv.fit, &ds.feature_names, lambda, config.top_n)?;
    println!("{}", crate::report::format_coefficients(&rows, lambda));

    if config.plot {
        println!(
            "{}",
            crate::plot::render_cv_plot(&cv.cv, config.plot_width, config.plot_height)
        );
    }

    if let Some(path) = &config.export_coefficients {
        crate::io::write_coefficients_csv(path, &cv.fit, &ds.feature_names, lambda)?;
    }
    if let Some(path) = &config.export_model {
        let model = ModelFile::new(
            cv.fit.clone(),
            Some(cv.cv.clone()),
            ds.feature_names.clone(),
            ds.response_name.clone(),
        );
        crate::io::write_model_json(path, &model)?;
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let params = SynthParams {
        n_obs: args.n_obs,
        n_features: args.n_features,
        n_active: args.n_active,
        rho: args.rho,
        noise_sd: args.noise,
        signal: args.signal,
        family: args.family,
        seed: args.seed,
    };
    let data = crate::data::generate(&params)?;
    crate::io::write_dataset_csv(&args.out, &data.dataset)?;

    println!(
        "Wrote {} rows x {} features ({}) to {}",
        params.n_obs,
        params.n_features,
        params.family.display_name(),
        args.out.display()
    );
    println!("True intercept: {:.4}", data.intercept);
    for (name, b) in data.dataset.feature_names.iter().zip(data.beta.iter()) {
        if *b != 0.0 {
            println!("  {name:<8} {b:>9.4}");
        }
    }
    Ok(())
}

/// Build a [`RunConfig`] from flags, then overlay the options file if any.
pub fn resolve_config(args: &FitArgs, cv: Option<&CvArgs>) -> Result<RunConfig, AppError> {
    let mut config = config_from_args(args, cv);
    if let Some(path) = &args.config {
        let file = crate::config::load_options_file(path)?;
        file.apply(&mut config);
        tracing::info!(path = %path.display(), "applied options file");
    }
    Ok(config)
}

pub fn config_from_args(args: &FitArgs, cv: Option<&CvArgs>) -> RunConfig {
    let options = NetworkOptions {
        transform: args.transform,
        unweighted: !args.weighted,
        cutoff: args.cutoff,
        min_degree: args.min_degree,
        ..NetworkOptions::default()
    };
    let glm = GlmParams {
        family: args.family,
        alpha: args.alpha,
        n_lambda: args.n_lambda,
        lambda_min_ratio: args.lambda_min_ratio,
        ..GlmParams::default()
    };
    let cv = match cv {
        Some(c) => CvParams {
            glm,
            n_folds: c.folds,
            seed: c.seed,
            measure: c.measure,
            ..CvParams::default()
        },
        None => CvParams {
            glm,
            ..CvParams::default()
        },
    };

    RunConfig {
        csv_path: args.csv.clone(),
        response: args.response.clone(),
        network: args.network,
        options,
        cv,
        top_n: args.top,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_coefficients: args.export.clone(),
        export_model: args.export_model.clone(),
    }
}
