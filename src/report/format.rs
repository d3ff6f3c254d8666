//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::RunConfig;
use crate::fit::CvResult;
use crate::io::ingest::IngestedData;
use crate::report::CoefficientRow;
use crate::sparsenet::SparseNetFit;

/// Format the data set and fit summary.
pub fn format_fit_summary(ingest: &IngestedData, fit: &SparseNetFit, config: &RunConfig) -> String {
    let mut out = String::new();
    let ds = &ingest.dataset;
    let path = &fit.path;

    out.push_str("=== netglm - network-penalized GLM ===\n");
    out.push_str(&format!("Data: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={} | features={} | response={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len(),
        ds.n_features(),
        ds.response_name
    ));
    for err in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - 5));
    }

    out.push_str(&format!(
        "Network: {} ({}, cutoff={}) | transform={} | min_degree={}\n",
        fit.network,
        if fit.options.unweighted { "unweighted" } else { "weighted" },
        fit.options.cutoff,
        fit.options.transform.display_name(),
        fit.options.min_degree
    ));
    out.push_str(&format!(
        "Degree: [{:.3}, {:.3}] | penalty factor: [{:.4}, {:.4}]\n",
        min(&fit.degrees),
        max(&fit.degrees),
        min(&fit.penalty_factors),
        max(&fit.penalty_factors)
    ));

    out.push_str(&format!(
        "Model: {} | alpha={} | lambdas={} | passes={}\n",
        fit.params.family.display_name(),
        fit.params.alpha,
        path.n_lambda(),
        path.passes
    ));
    if let (Some(first), Some(last)) = (path.lambdas.first(), path.lambdas.last()) {
        let k = path.n_lambda() - 1;
        out.push_str(&format!(
            "Path: lambda=[{last:.4e}, {first:.4e}] | df at end={} | dev ratio at end={:.4}\n",
            path.df[k], path.dev_ratio[k]
        ));
    }

    out
}

/// Format the cross-validation summary.
pub fn format_cv_summary(cv: &CvResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Cross-validation: {} folds | measure={}\n",
        cv.n_folds,
        cv.measure.display_name()
    ));
    out.push_str(&format!(
        "  lambda_min={:.4e}  cvm={:.5}  cvsd={:.5}\n",
        cv.lambda_min, cv.cvm[cv.index_min], cv.cvsd[cv.index_min]
    ));
    out.push_str(&format!(
        "  lambda_1se={:.4e}  cvm={:.5}  cvsd={:.5}\n",
        cv.lambda_1se, cv.cvm[cv.index_1se], cv.cvsd[cv.index_1se]
    ));
    out
}

/// Format the coefficient table.
pub fn format_coefficients(rows: &[CoefficientRow], lambda: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Top coefficients at lambda={lambda:.4e}:\n"));
    if rows.is_empty() {
        out.push_str("  (all coefficients are zero)\n");
        return out;
    }

    out.push_str(
        format!("{:<24} {:>10} {:>10} {:>14}", "feature", "degree", "penalty", "coefficient").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<10} {:-<14}", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<24} {:>10.3} {:>10.4} {:>14.6}",
                truncate(&r.name, 24),
                r.degree,
                r.penalty_factor,
                r.coefficient
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn min(v: &[f64]) -> f64 {
    v.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(v: &[f64]) -> f64 {
    v.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
