//! # Samples
//!
//! Paired sea-state observations `(x1, x2)`.
//!
use std::cmp::Ordering;

use ndarray::Array1;

use crate::error::ContourError;
use crate::error::Result;

/// Two equal-length series of finite observations.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
  x1: Array1<f64>,
  x2: Array1<f64>,
}

impl SampleSeries {
  /// Validates and wraps the two series.
  pub fn new(x1: Array1<f64>, x2: Array1<f64>) -> Result<Self> {
    if x1.len() != x2.len() {
      return Err(ContourError::Conversion(format!(
        "x1 and x2 must have the same length, got {} and {}",
        x1.len(),
        x2.len()
      )));
    }
    if x1.is_empty() {
      return Err(ContourError::Conversion("sample series is empty".into()));
    }
    for (name, series) in [("x1", &x1), ("x2", &x2)] {
      if let Some(idx) = series.iter().position(|v| !v.is_finite()) {
        return Err(ContourError::Conversion(format!(
          "{name}[{idx}] = {} is not finite",
          series[idx]
        )));
      }
    }

    Ok(Self { x1, x2 })
  }

  pub fn from_slices(x1: &[f64], x2: &[f64]) -> Result<Self> {
    Self::new(Array1::from(x1.to_vec()), Array1::from(x2.to_vec()))
  }

  pub fn x1(&self) -> &Array1<f64> {
    &self.x1
  }

  pub fn x2(&self) -> &Array1<f64> {
    &self.x2
  }

  pub fn len(&self) -> usize {
    self.x1.len()
  }

  pub fn is_empty(&self) -> bool {
    self.x1.is_empty()
  }

  /// Both series reordered by ascending `x1`.
  pub fn sorted_by_x1(&self) -> (Array1<f64>, Array1<f64>) {
    let order = argsort(&self.x1);
    let x1 = order.iter().map(|&i| self.x1[i]).collect();
    let x2 = order.iter().map(|&i| self.x2[i]).collect();
    (x1, x2)
  }
}

impl TryFrom<(Vec<f64>, Vec<f64>)> for SampleSeries {
  type Error = ContourError;

  fn try_from((x1, x2): (Vec<f64>, Vec<f64>)) -> Result<Self> {
    Self::new(Array1::from(x1), Array1::from(x2))
  }
}

/// Fails unless every value of `values` is strictly positive.
pub(crate) fn require_positive(values: &Array1<f64>, name: &'static str, law: &str) -> Result<()> {
  if let Some(v) = values.iter().find(|&&v| v <= 0.0) {
    return Err(ContourError::invalid_parameter(
      name,
      format!("{law} requires strictly positive values, found {v}"),
    ));
  }
  Ok(())
}

/// Indices that sort `values` ascending (stable).
pub(crate) fn argsort(values: &Array1<f64>) -> Vec<usize> {
  let mut idx: Vec<usize> = (0..values.len()).collect();
  idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
  idx
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_length_mismatch() {
    let err = SampleSeries::from_slices(&[1.0, 2.0], &[1.0]).unwrap_err();
    assert!(matches!(err, ContourError::Conversion(_)));
  }

  #[test]
  fn rejects_non_finite_values() {
    let err = SampleSeries::try_from((vec![1.0, f64::NAN], vec![1.0, 2.0])).unwrap_err();
    assert!(err.to_string().contains("x1[1]"));
  }

  #[test]
  fn sorts_pairs_by_x1() {
    let samples = SampleSeries::from_slices(&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0]).unwrap();
    let (x1, x2) = samples.sorted_by_x1();
    assert_eq!(x1.to_vec(), vec![1.0, 2.0, 3.0]);
    assert_eq!(x2.to_vec(), vec![10.0, 20.0, 30.0]);
  }
}
