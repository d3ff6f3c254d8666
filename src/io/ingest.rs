//! CSV ingest.
//!
//! Turns a header-first CSV into a feature matrix plus response:
//! - the response column is chosen by name (case-insensitive)
//! - every other column is a numeric feature
//! - rows with missing or non-numeric values are skipped and reported

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use nalgebra::{DMatrix, DVector};

use crate::domain::Dataset;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the usable data set plus what was dropped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a data set from `path`, using column `response` as the outcome.
pub fn load_dataset(path: &Path, response: &str) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let response_idx = *header_map
        .get(&normalize_header_name(response))
        .ok_or_else(|| AppError::invalid(format!("Response column '{response}' not found in CSV header.")))?;

    let feature_cols: Vec<usize> = (0..headers.len()).filter(|&i| i != response_idx).collect();
    if feature_cols.is_empty() {
        return Err(AppError::invalid("CSV has no feature columns besides the response."));
    }
    let feature_names: Vec<String> = feature_cols.iter().map(|&i| headers[i].to_string()).collect();

    let mut rows: Vec<(Vec<f64>, f64)> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &headers, &feature_cols, response_idx) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows.len() < 2 {
        return Err(AppError::insufficient(format!(
            "Need at least 2 usable rows, found {} (of {rows_read} read).",
            rows.len()
        )));
    }

    let n = rows.len();
    let p = feature_cols.len();
    let x = DMatrix::from_fn(n, p, |i, j| rows[i].0[j]);
    let y = DVector::from_fn(n, |i, _| rows[i].1);

    if !row_errors.is_empty() {
        tracing::warn!(skipped = row_errors.len(), rows_read, "skipped invalid CSV rows");
    }
    tracing::info!(path = %path.display(), n_obs = n, n_features = p, "loaded data set");

    Ok(IngestedData {
        dataset: Dataset {
            x,
            y,
            feature_names,
            response_name: headers[response_idx].to_string(),
        },
        row_errors,
        rows_read,
        rows_used: n,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header_name(h), i))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    headers: &StringRecord,
    feature_cols: &[usize],
    response_idx: usize,
) -> Result<(Vec<f64>, f64), String> {
    let y = parse_cell(record, headers, response_idx)?;
    let features = feature_cols
        .iter()
        .map(|&i| parse_cell(record, headers, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((features, y))
}

fn parse_cell(record: &StringRecord, headers: &StringRecord, idx: usize) -> Result<f64, String> {
    let name = headers.get(idx).unwrap_or("?");
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value for '{name}'."))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("Non-numeric value '{raw}' for '{name}'."))?;
    if !value.is_finite() {
        return Err(format!("Non-finite value '{raw}' for '{name}'."));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn response_is_picked_by_name() {
        let file = write_csv("a,Outcome,b\n1,10,2\n3,30,4\n5,50,6\n");
        let data = load_dataset(file.path(), "outcome").unwrap();
        assert_eq!(data.dataset.feature_names, vec!["a", "b"]);
        assert_eq!(data.dataset.response_name, "Outcome");
        assert_eq!(data.dataset.y.as_slice(), &[10.0, 30.0, 50.0]);
        assert_eq!(data.dataset.x[(2, 1)], 6.0);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let file = write_csv("y,x1,x2\n1,2,3\n2,oops,4\n3,,5\n4,5,6\n5,inf,1\n");
        let data = load_dataset(file.path(), "y").unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
    }

    #[test]
    fn missing_response_column_is_an_input_error() {
        let file = write_csv("a,b\n1,2\n3,4\n");
        let err = load_dataset(file.path(), "y").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn too_few_rows_is_insufficient_data() {
        let file = write_csv("y,x\n1,2\n");
        let err = load_dataset(file.path(), "y").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
