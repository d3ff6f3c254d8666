//! Degree transforms: per-feature network degree -> penalty multiplier.
//!
//! The built-in transforms are:
//!
//! - `Identity`: `f(x) = x`
//! - `Degree`:   `f(x) = 1 / x`
//! - `Orphan`:   `f(x) = floor + (1 - floor) * exp(-x / scale)`
//! - `Hub`:      `f(x) = floor + (1 - floor) * (1 - exp(-x / scale))`
//!
//! Orphan is non-increasing and Hub non-decreasing in the degree. Both saturate
//! in `[floor, 1]`, so a penalty factor never collapses to zero.
//!
//! Numerical notes:
//! - `1 - exp(-x/s)` is computed as `-expm1(-x/s)` to keep precision for small degrees.
//! - `Degree` at `x = 0` is reported as a domain error instead of producing `inf`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Closed set of degree transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DegreeTransform {
    /// Penalty proportional to degree.
    Identity,
    /// Penalty inversely proportional to degree.
    Degree,
    /// Saturating heuristic with larger multipliers for low-degree features.
    Orphan,
    /// Saturating heuristic with larger multipliers for high-degree features.
    Hub,
}

/// Shape parameters of the orphan / hub heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicShape {
    /// Degree at which the heuristic has moved `1 - 1/e` of the way across its range.
    pub scale: f64,
    /// Lower bound of the multiplier.
    pub floor: f64,
}

impl Default for HeuristicShape {
    fn default() -> Self {
        Self {
            scale: 10.0,
            floor: 0.05,
        }
    }
}

impl HeuristicShape {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(AppError::invalid(format!(
                "Invalid heuristic scale: {} (must be finite and > 0).",
                self.scale
            )));
        }
        if !(self.floor.is_finite() && self.floor > 0.0 && self.floor <= 1.0) {
            return Err(AppError::invalid(format!(
                "Invalid heuristic floor: {} (must be in (0, 1]).",
                self.floor
            )));
        }
        Ok(())
    }
}

/// `f(x) = 1/x`.
pub fn degree_transform() -> DegreeTransform {
    DegreeTransform::Degree
}

/// Heuristic favouring low-degree (orphan) features.
pub fn orphan_heuristic() -> DegreeTransform {
    DegreeTransform::Orphan
}

/// Heuristic favouring high-degree (hub) features.
pub fn hub_heuristic() -> DegreeTransform {
    DegreeTransform::Hub
}

impl DegreeTransform {
    pub const ALL: [DegreeTransform; 4] = [
        DegreeTransform::Identity,
        DegreeTransform::Degree,
        DegreeTransform::Orphan,
        DegreeTransform::Hub,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            DegreeTransform::Identity => "identity",
            DegreeTransform::Degree => "degree",
            DegreeTransform::Orphan => "orphan",
            DegreeTransform::Hub => "hub",
        }
    }

    /// Evaluate with the default heuristic shape.
    pub fn evaluate(self, x: f64) -> Result<f64, AppError> {
        self.evaluate_with(x, &HeuristicShape::default())
    }

    /// Evaluate at a single degree value.
    pub fn evaluate_with(self, x: f64, shape: &HeuristicShape) -> Result<f64, AppError> {
        self.check_shape(shape)?;
        self.evaluate_feature(None, x, shape)
    }

    /// Map a whole degree vector, attributing domain errors to the feature index.
    pub fn apply(self, degrees: &[f64], shape: &HeuristicShape) -> Result<Vec<f64>, AppError> {
        self.check_shape(shape)?;
        degrees
            .iter()
            .enumerate()
            .map(|(j, &x)| self.evaluate_feature(Some(j), x, shape))
            .collect()
    }

    /// Only the heuristics read the shape.
    fn check_shape(self, shape: &HeuristicShape) -> Result<(), AppError> {
        match self {
            DegreeTransform::Orphan | DegreeTransform::Hub => shape.validate(),
            DegreeTransform::Identity | DegreeTransform::Degree => Ok(()),
        }
    }

    fn evaluate_feature(self, feature: Option<usize>, x: f64, shape: &HeuristicShape) -> Result<f64, AppError> {
        let domain_error = || AppError::DegreeDomain {
            transform: self.display_name(),
            feature,
            degree: x,
        };

        if !(x.is_finite() && x >= 0.0) {
            return Err(domain_error());
        }

        let value = match self {
            DegreeTransform::Identity => x,
            DegreeTransform::Degree => {
                if x == 0.0 {
                    return Err(domain_error());
                }
                1.0 / x
            }
            DegreeTransform::Orphan => {
                let decay = (-x / shape.scale).exp();
                shape.floor + (1.0 - shape.floor) * decay
            }
            DegreeTransform::Hub => {
                let rise = -(-x / shape.scale).exp_m1();
                shape.floor + (1.0 - shape.floor) * rise
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(domain_error())
        }
    }
}
