//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The x axis is always `log10(lambda)`, largest lambda on the right.
//!
//! Plot elements:
//! - curve: `-` line
//! - CV error band: `:` at `cvm ± cvsd`
//! - selected lambdas: `M` (lambda_min), `S` (lambda_1se)

use crate::fit::CvResult;
use crate::models::GlmPath;

/// Render the cross-validation curve with its standard-error band.
pub fn render_cv_plot(cv: &CvResult, width: usize, height: usize) -> String {
    let curve = series(&cv.lambdas, &cv.cvm);
    let band: Vec<(f64, f64)> = series(&cv.lambdas, &cv.cvup)
        .into_iter()
        .chain(series(&cv.lambdas, &cv.cvlo))
        .collect();
    let marks = [
        (cv.lambda_min.log10(), cv.cvm[cv.index_min], 'M'),
        (cv.lambda_1se.log10(), cv.cvm[cv.index_1se], 'S'),
    ];
    let title = format!("CV {} vs log10(lambda)", cv.measure.display_name());
    render(&title, &curve, &band, &marks, width, height)
}

/// Render the fraction of deviance explained along the path.
pub fn render_dev_ratio_plot(path: &GlmPath, width: usize, height: usize) -> String {
    let curve = series(&path.lambdas, &path.dev_ratio);
    render("Deviance ratio vs log10(lambda)", &curve, &[], &[], width, height)
}

fn series(lambdas: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    lambdas
        .iter()
        .zip(values.iter())
        .filter(|(l, v)| **l > 0.0 && v.is_finite())
        .map(|(l, v)| (l.log10(), *v))
        .collect()
}

fn render(
    title: &str,
    curve: &[(f64, f64)],
    band: &[(f64, f64)],
    marks: &[(f64, f64, char)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = curve.iter().chain(band.iter());
    let Some((x_min, x_max, y_min, y_max)) = bounds(all) else {
        return format!("{title}: nothing to plot\n");
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Band first so the curve and marks overlay it.
    for &(x, y) in band {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ':';
    }
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    for &(x, y, ch) in marks {
        if x.is_finite() && y.is_finite() {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ch;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.4}, {y_max:.4}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !(x_min.is_finite() && y_min.is_finite()) {
        return None;
    }
    if x_max <= x_min {
        x_min -= 0.5;
        x_max += 0.5;
    }
    Some((x_min, x_max, y_min, y_max))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish); never overwrites band or marks.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let cell = &mut grid[y0 as usize][x0 as usize];
        if *cell == ' ' || *cell == ':' {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CvMeasure, Family};

    #[test]
    fn dev_ratio_golden_snapshot_small() {
        let path = GlmPath {
            family: Family::Gaussian,
            lambdas: vec![100.0, 10.0, 1.0],
            intercepts: vec![0.0; 3],
            coefficients: vec![vec![0.0]; 3],
            df: vec![0, 1, 1],
            dev_ratio: vec![0.0, 0.5, 1.0],
            null_deviance: 1.0,
            n_obs: 3,
            passes: 3,
        };
        let txt = render_dev_ratio_plot(&path, 10, 5);
        let expected = concat!(
            "Deviance ratio vs log10(lambda): x=[0.000, 2.000] | y=[-0.0500, 1.0500]\n",
            "--\n",
            "  --\n",
            "    ---\n",
            "       --\n",
            "         -\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn cv_plot_marks_selected_lambdas() {
        let cv = CvResult {
            lambdas: vec![1.0, 0.1, 0.01, 0.001],
            cvm: vec![4.0, 2.0, 1.0, 1.5],
            cvsd: vec![0.2, 0.2, 0.6, 0.2],
            cvup: vec![4.2, 2.2, 1.6, 1.7],
            cvlo: vec![3.8, 1.8, 0.4, 1.3],
            measure: CvMeasure::Mse,
            n_folds: 3,
            fold_ids: vec![1, 2, 3],
            index_min: 2,
            index_1se: 2,
            lambda_min: 0.01,
            lambda_1se: 0.01,
        };
        let txt = render_cv_plot(&cv, 40, 12);
        assert!(txt.starts_with("CV mse vs log10(lambda)"));
        assert!(txt.contains('S'));
        assert!(txt.contains(':'));
        assert_eq!(txt.lines().count(), 13);
    }

    #[test]
    fn empty_series_says_so() {
        let path = GlmPath {
            family: Family::Gaussian,
            lambdas: vec![],
            intercepts: vec![],
            coefficients: vec![],
            df: vec![],
            dev_ratio: vec![],
            null_deviance: 1.0,
            n_obs: 0,
            passes: 0,
        };
        assert!(render_dev_ratio_plot(&path, 10, 5).contains("nothing to plot"));
    }
}
