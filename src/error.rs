//! Crate-wide error type.
//!
//! Every error carries a process exit code so the binary can map failures
//! without inspecting messages:
//!
//! - `2`: invalid input, configuration or I/O
//! - `3`: not enough data to fit
//! - `4`: numerical / fitting failure

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Bad user input: shapes, settings, malformed files.
    #[error("{0}")]
    InvalidInput(String),

    /// Reading or writing a file failed.
    #[error("{0}")]
    Io(String),

    /// The data is too small for the requested fit.
    #[error("{0}")]
    InsufficientData(String),

    /// A degree transform was evaluated outside its domain.
    #[error("Degree transform '{transform}' is undefined at degree {degree}{}.", feature_suffix(.feature))]
    DegreeDomain {
        transform: &'static str,
        /// Index of the offending feature, when evaluated over a degree vector.
        feature: Option<usize>,
        degree: f64,
    },

    /// The solver produced a non-finite value or could not make progress.
    #[error("{0}")]
    Numerical(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidInput(_) | AppError::Io(_) => 2,
            AppError::InsufficientData(_) => 3,
            AppError::DegreeDomain { .. } | AppError::Numerical(_) => 4,
        }
    }
}

fn feature_suffix(feature: &Option<usize>) -> String {
    feature.map(|j| format!(" (feature {j})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(AppError::invalid("x").exit_code(), 2);
        assert_eq!(AppError::io("x").exit_code(), 2);
        assert_eq!(AppError::insufficient("x").exit_code(), 3);
        assert_eq!(AppError::numerical("x").exit_code(), 4);
        let domain = AppError::DegreeDomain {
            transform: "degree",
            feature: Some(3),
            degree: 0.0,
        };
        assert_eq!(domain.exit_code(), 4);
        assert!(domain.to_string().contains("feature 3"));

        let single = AppError::DegreeDomain {
            transform: "degree",
            feature: None,
            degree: 0.0,
        };
        assert_eq!(single.to_string(), "Degree transform 'degree' is undefined at degree 0.");
    }
}
