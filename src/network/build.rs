//! Feature network construction and node degree.
//!
//! A network is a symmetric `p x p` matrix of edge weights between feature
//! columns. Degree is computed as:
//!
//! ```text
//! weighted:   d_i = Σ_{j≠i, |w_ij| > cutoff} |w_ij|
//! unweighted: d_i = #{ j≠i : |w_ij| > cutoff }
//! ```
//!
//! Each network row depends only on the (standardized) columns, so rows are
//! computed independently and in parallel when enabled.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{NetworkMethod, NetworkOptions};
use crate::error::AppError;

/// How to obtain the feature network.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkSpec {
    /// Pearson correlation of the feature columns.
    Correlation,
    /// Spearman rank correlation of the feature columns.
    Spearman,
    /// Sample covariance of the feature columns.
    Covariance,
    /// A precomputed `p x p` adjacency / weight matrix.
    Adjacency(DMatrix<f64>),
    /// Precomputed per-feature degrees (length `p`).
    Degree(Vec<f64>),
}

impl From<NetworkMethod> for NetworkSpec {
    fn from(value: NetworkMethod) -> Self {
        match value {
            NetworkMethod::Correlation => NetworkSpec::Correlation,
            NetworkMethod::Spearman => NetworkSpec::Spearman,
            NetworkMethod::Covariance => NetworkSpec::Covariance,
        }
    }
}

impl NetworkSpec {
    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkSpec::Correlation => "correlation",
            NetworkSpec::Spearman => "spearman",
            NetworkSpec::Covariance => "covariance",
            NetworkSpec::Adjacency(_) => "adjacency",
            NetworkSpec::Degree(_) => "degree",
        }
    }
}

/// Compute per-feature degrees for `x` under the given network spec.
pub fn network_degree(
    x: &DMatrix<f64>,
    network: &NetworkSpec,
    opts: &NetworkOptions,
) -> Result<Vec<f64>, AppError> {
    if !(opts.cutoff.is_finite() && opts.cutoff >= 0.0) {
        return Err(AppError::invalid(format!(
            "Invalid network cutoff: {} (must be finite and >= 0).",
            opts.cutoff
        )));
    }

    let p = x.ncols();
    match network {
        NetworkSpec::Degree(degrees) => {
            if degrees.len() != p {
                return Err(AppError::invalid(format!(
                    "Degree vector length ({}) != number of features ({p}).",
                    degrees.len()
                )));
            }
            if let Some((j, d)) = degrees.iter().enumerate().find(|(_, d)| !(d.is_finite() && **d >= 0.0)) {
                return Err(AppError::invalid(format!(
                    "Invalid degree {d} for feature {j} (must be finite and >= 0)."
                )));
            }
            Ok(degrees.clone())
        }
        NetworkSpec::Adjacency(adj) => {
            if adj.nrows() != p || adj.ncols() != p {
                return Err(AppError::invalid(format!(
                    "Adjacency matrix is {}x{}, expected {p}x{p}.",
                    adj.nrows(),
                    adj.ncols()
                )));
            }
            if adj.iter().any(|v| !v.is_finite()) {
                return Err(AppError::invalid("Adjacency matrix contains non-finite values."));
            }
            Ok(degree_from_matrix(adj, opts))
        }
        NetworkSpec::Correlation | NetworkSpec::Spearman | NetworkSpec::Covariance => {
            let net = build_network(x, network, opts.parallel)?;
            Ok(degree_from_matrix(&net, opts))
        }
    }
}

/// Build the `p x p` network matrix for a data-derived spec.
pub fn build_network(
    x: &DMatrix<f64>,
    network: &NetworkSpec,
    parallel: bool,
) -> Result<DMatrix<f64>, AppError> {
    let n = x.nrows();
    let p = x.ncols();
    if n < 2 {
        return Err(AppError::insufficient(format!(
            "Need at least 2 observations to build a feature network, got {n}."
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AppError::invalid("Feature matrix contains non-finite values."));
    }

    // Column-wise preprocessing so each entry becomes a plain dot product.
    let columns: Vec<DVector<f64>> = match network {
        NetworkSpec::Correlation => (0..p).map(|j| standardize_column(&x.column(j).into_owned())).collect(),
        NetworkSpec::Spearman => (0..p)
            .map(|j| standardize_column(&average_ranks(&x.column(j).into_owned())))
            .collect(),
        NetworkSpec::Covariance => (0..p)
            .map(|j| {
                let col = x.column(j).into_owned();
                let mean = col.mean();
                col.map(|v| (v - mean) / ((n - 1) as f64).sqrt())
            })
            .collect(),
        NetworkSpec::Adjacency(adj) => return Ok(adj.clone()),
        NetworkSpec::Degree(_) => {
            return Err(AppError::invalid("A degree vector does not define a network matrix."));
        }
    };

    let row = |i: usize| -> Vec<f64> { (0..p).map(|j| columns[i].dot(&columns[j])).collect() };
    let rows: Vec<Vec<f64>> = if parallel {
        (0..p).into_par_iter().map(row).collect()
    } else {
        (0..p).map(row).collect()
    };

    let mut out = DMatrix::<f64>::zeros(p, p);
    for (i, r) in rows.into_iter().enumerate() {
        for (j, v) in r.into_iter().enumerate() {
            out[(i, j)] = v;
        }
    }
    Ok(out)
}

/// Degree of every node, ignoring the diagonal.
pub fn degree_from_matrix(net: &DMatrix<f64>, opts: &NetworkOptions) -> Vec<f64> {
    let p = net.nrows();
    (0..p)
        .map(|i| {
            let mut d = 0.0;
            for j in 0..p {
                if i == j {
                    continue;
                }
                let w = net[(i, j)].abs();
                if w > opts.cutoff {
                    d += if opts.unweighted { 1.0 } else { w };
                }
            }
            d
        })
        .collect()
}

/// Centre and scale a column so `<a, b>` is the Pearson correlation.
///
/// Constant columns map to zeros: they are uncorrelated with everything.
fn standardize_column(col: &DVector<f64>) -> DVector<f64> {
    let mean = col.mean();
    let centred = col.map(|v| v - mean);
    let norm = centred.norm();
    if norm <= 1e-12 * (1.0 + mean.abs()) * (col.len() as f64).sqrt() {
        return DVector::zeros(col.len());
    }
    centred / norm
}

/// Ranks `1..=n`, ties receiving their average rank.
fn average_ranks(col: &DVector<f64>) -> DVector<f64> {
    let n = col.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| col[a].partial_cmp(&col[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = DVector::<f64>::zeros(n);
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && col[order[end]] == col[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share rank mean((start+1)..=end).
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> DMatrix<f64> {
        // Column 1 = 2 * column 0, column 2 anti-correlated, column 3 constant.
        DMatrix::from_row_slice(
            4,
            4,
            &[
                1.0, 2.0, 4.0, 7.0, //
                2.0, 4.0, 3.0, 7.0, //
                3.0, 6.0, 2.0, 7.0, //
                4.0, 8.0, 1.0, 7.0,
            ],
        )
    }

    #[test]
    fn correlation_network_matches_known_values() {
        let net = build_network(&toy(), &NetworkSpec::Correlation, false).unwrap();
        assert!((net[(0, 1)] - 1.0).abs() < 1e-12);
        assert!((net[(0, 2)] + 1.0).abs() < 1e-12);
        assert!(net[(0, 3)].abs() < 1e-12);
        assert!((net[(2, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_isolated() {
        let opts = NetworkOptions {
            unweighted: false,
            ..NetworkOptions::default()
        };
        let degree = network_degree(&toy(), &NetworkSpec::Correlation, &opts).unwrap();
        assert!((degree[0] - 2.0).abs() < 1e-12);
        assert_eq!(degree[3], 0.0);
    }

    #[test]
    fn unweighted_degree_counts_edges_above_cutoff() {
        let adj = DMatrix::from_row_slice(3, 3, &[1.0, 0.2, -0.9, 0.2, 1.0, 0.05, -0.9, 0.05, 1.0]);
        let opts = NetworkOptions {
            cutoff: 0.1,
            ..NetworkOptions::default()
        };
        let x = DMatrix::<f64>::zeros(5, 3);
        let degree = network_degree(&x, &NetworkSpec::Adjacency(adj.clone()), &opts).unwrap();
        assert_eq!(degree, vec![2.0, 1.0, 1.0]);

        let weighted = NetworkOptions {
            unweighted: false,
            ..opts
        };
        let degree = network_degree(&x, &NetworkSpec::Adjacency(adj), &weighted).unwrap();
        assert!((degree[0] - 1.1).abs() < 1e-12);
        assert!((degree[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn parallel_and_serial_networks_agree() {
        let x = DMatrix::from_fn(12, 6, |i, j| ((i * 7 + j * 3) % 5) as f64 + (i as f64) * 0.1 * j as f64);
        let a = build_network(&x, &NetworkSpec::Spearman, true).unwrap();
        let b = build_network(&x, &NetworkSpec::Spearman, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn spearman_ranks_handle_ties() {
        let col = DVector::from_row_slice(&[10.0, 20.0, 10.0, 30.0]);
        let r = average_ranks(&col);
        assert_eq!(r.as_slice(), &[1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn covariance_uses_unbiased_denominator() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let net = build_network(&x, &NetworkSpec::Covariance, false).unwrap();
        assert!((net[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((net[(0, 1)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degree_vector_is_validated() {
        let x = DMatrix::<f64>::zeros(3, 2);
        let opts = NetworkOptions::default();
        assert!(network_degree(&x, &NetworkSpec::Degree(vec![1.0]), &opts).is_err());
        assert!(network_degree(&x, &NetworkSpec::Degree(vec![1.0, -1.0]), &opts).is_err());
        assert_eq!(
            network_degree(&x, &NetworkSpec::Degree(vec![1.0, 3.0]), &opts).unwrap(),
            vec![1.0, 3.0]
        );
    }

    #[test]
    fn single_row_is_insufficient() {
        let x = DMatrix::<f64>::zeros(1, 3);
        let err = build_network(&x, &NetworkSpec::Correlation, false).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
