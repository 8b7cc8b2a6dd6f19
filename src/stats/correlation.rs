use std::cmp::Ordering;

use ndarray::Array1;

use crate::error::ContourError;
use crate::error::Result;

/// Kendall's tau-b rank correlation of two equal-length series.
pub fn kendall_tau(x: &Array1<f64>, y: &Array1<f64>) -> Result<f64> {
  if x.len() != y.len() {
    return Err(ContourError::invalid_parameter(
      "samples",
      format!("length mismatch {} vs {}", x.len(), y.len()),
    ));
  }
  if x.len() < 2 {
    return Err(ContourError::InsufficientData(
      "Kendall's tau needs at least 2 pairs".into(),
    ));
  }

  let (tau, _) = kendalls::tau_b_with_comparator(&x.to_vec(), &y.to_vec(), |a, b| {
    a.partial_cmp(b).unwrap_or(Ordering::Greater)
  })
  .map_err(|e| ContourError::numerical(format!("Kendall's tau: {e:?}")))?;

  if tau.is_nan() {
    return Err(ContourError::numerical(
      "Kendall's tau is undefined for a constant series",
    ));
  }
  Ok(tau)
}
