//! Error types shared by every contour operation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContourError>;

/// Errors raised while validating inputs or fitting contour models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContourError {
  /// A scalar option or sample value is outside its admissible domain.
  #[error("invalid parameter `{name}`: {reason}")]
  InvalidParameter { name: &'static str, reason: String },

  /// Unknown or duplicated contour method name.
  #[error("invalid contour method: {0}")]
  InvalidMethod(String),

  /// An option required by the selected method was not supplied.
  #[error("method `{method}` requires parameter `{name}`")]
  MissingParameter {
    method: &'static str,
    name: &'static str,
  },

  /// The sample is too small to form the bins a fit needs.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// Caller data could not be converted into a sample series.
  #[error("conversion error: {0}")]
  Conversion(String),

  /// A numeric routine (root finder, solver, regression) failed.
  #[error("numerical failure: {0}")]
  Numerical(String),
}

impl ContourError {
  pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidParameter {
      name,
      reason: reason.into(),
    }
  }

  pub fn numerical(reason: impl Into<String>) -> Self {
    Self::Numerical(reason.into())
  }
}
