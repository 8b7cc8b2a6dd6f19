use std::cmp::Ordering;

use ndarray::Array1;
use tracing::warn;

use super::distr::normal::norm_pdf;
use crate::error::ContourError;
use crate::error::Result;

/// A struct representing a Gaussian Kernel Density Estimator (KDE).
///
/// # Fields
/// - `data`: 1D array of data points.
/// - `bandwidth`: The bandwidth (smoothing parameter) for the Gaussian kernel.
#[derive(Debug, Clone)]
pub struct GaussianKDE {
  data: Array1<f64>,
  bandwidth: f64,
}

impl GaussianKDE {
  /// Creates a new `GaussianKDE` with given data and bandwidth.
  ///
  /// # Arguments
  ///
  /// * `data` - 1D array of data points.
  /// * `bandwidth` - The smoothing parameter for the Gaussian kernel.
  pub fn new(data: Array1<f64>, bandwidth: f64) -> Result<Self> {
    if data.is_empty() {
      return Err(ContourError::InsufficientData(
        "kernel density of an empty sample".into(),
      ));
    }
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
      return Err(ContourError::invalid_parameter(
        "bandwidth",
        format!("must be finite and positive, got {bandwidth}"),
      ));
    }
    Ok(Self { data, bandwidth })
  }

  /// Creates a new `GaussianKDE` where the bandwidth is chosen from the
  /// median absolute deviation:
  ///
  /// `h = MAD * (4 / (3n))^(1/5)`
  pub fn with_mad_bandwidth(data: Array1<f64>) -> Result<Self> {
    let h = mad_bandwidth(&data);
    Self::new(data, h)
  }

  pub fn bandwidth(&self) -> f64 {
    self.bandwidth
  }

  fn gaussian_kernel(&self, x: f64, xi: f64) -> f64 {
    norm_pdf((x - xi) / self.bandwidth) / self.bandwidth
  }

  /// Evaluates the Gaussian KDE at a single point `x`.
  pub fn evaluate(&self, x: f64) -> f64 {
    let sum: f64 = self
      .data
      .iter()
      .map(|&xi| self.gaussian_kernel(x, xi))
      .sum();
    sum / (self.data.len() as f64)
  }

  /// Evaluates the Gaussian KDE for multiple values of `x`.
  ///
  /// Points are evaluated in parallel; each point is an independent
  /// sequential sum so the result does not depend on scheduling.
  pub fn evaluate_array(&self, x_values: &Array1<f64>) -> Array1<f64> {
    let mut out = x_values.clone();
    out.par_mapv_inplace(|x| self.evaluate(x));
    out
  }
}

/// Median absolute deviation around the median, unscaled.
pub fn median_abs_deviation(data: &Array1<f64>) -> f64 {
  let mut sorted = data.to_vec();
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
  let median = percentile(&sorted, 50.0);

  let mut deviations: Vec<f64> = sorted.iter().map(|&x| (x - median).abs()).collect();
  deviations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
  percentile(&deviations, 50.0)
}

/// Computes `MAD * (4 / (3n))^(1/5)`.
pub fn mad_bandwidth(data: &Array1<f64>) -> f64 {
  let n = data.len() as f64;
  if n < 2.0 {
    return 1e-6;
  }

  let mad = median_abs_deviation(data);
  let h = mad * (4.0 / (3.0 * n)).powf(0.2);
  if h < 1e-8 {
    warn!(
      mad,
      n = data.len(),
      "median absolute deviation is zero or negligible, KDE bandwidth floored at 1e-8"
    );
    1e-8
  } else {
    h
  }
}

/// Returns the p-th percentile of a sorted slice.
///
/// # Arguments
///
/// * `sorted_data` - A sorted slice of floating-point values.
/// * `p`           - The percentile (0..100).
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
  if sorted_data.is_empty() {
    return 0.0;
  }
  if p <= 0.0 {
    return sorted_data[0];
  }
  if p >= 100.0 {
    return sorted_data[sorted_data.len() - 1];
  }

  let rank = (p / 100.0) * (sorted_data.len() as f64 - 1.0);
  let lower_index = rank.floor() as usize;
  let upper_index = rank.ceil() as usize;

  if lower_index == upper_index {
    sorted_data[lower_index]
  } else {
    // Linear interpolation between lower and upper index
    let weight = rank - lower_index as f64;
    let lower_val = sorted_data[lower_index];
    let upper_val = sorted_data[upper_index];
    lower_val + weight * (upper_val - lower_val)
  }
}
