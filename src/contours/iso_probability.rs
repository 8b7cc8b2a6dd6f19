use std::f64::consts::PI;

use ndarray::Array1;

use crate::error::ContourError;
use crate::error::Result;
use crate::stats::distr::normal::norm_cdf;
use crate::stats::distr::normal::norm_ppf;

const SECONDS_PER_YEAR: f64 = 3600.0 * 24.0 * 365.0;

/// Discretised iso-probability circle in standard normal space.
///
/// `x_component[k] = β cos(2πk/n)`, `y_component[k] = β sin(2πk/n)` with
/// `β = Φ⁻¹(1 - p_e)`; the quantiles are `Φ` of each coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoProbability {
  pub sea_state_duration: f64,
  pub return_period: f64,
  pub exceedance_probability: f64,
  pub radius: f64,
  pub x_component: Array1<f64>,
  pub y_component: Array1<f64>,
  pub x_quantile: Array1<f64>,
  pub y_quantile: Array1<f64>,
}

impl IsoProbability {
  /// `sea_state_duration` in seconds, `return_period` in years.
  pub fn compute(sea_state_duration: f64, return_period: f64, nb_steps: usize) -> Result<Self> {
    if !(sea_state_duration.is_finite() && sea_state_duration > 0.0) {
      return Err(ContourError::invalid_parameter(
        "sea_state_duration",
        format!("must be finite and positive, got {sea_state_duration}"),
      ));
    }
    if !(return_period.is_finite() && return_period > 0.0) {
      return Err(ContourError::invalid_parameter(
        "return_period",
        format!("must be finite and positive, got {return_period}"),
      ));
    }
    if nb_steps == 0 {
      return Err(ContourError::invalid_parameter(
        "nb_steps",
        "must be at least 1",
      ));
    }

    let exceedance_probability = sea_state_duration / SECONDS_PER_YEAR / return_period;
    if exceedance_probability >= 1.0 {
      return Err(ContourError::invalid_parameter(
        "return_period",
        format!("{return_period} years does not exceed the sea-state duration"),
      ));
    }
    let radius = norm_ppf(1.0 - exceedance_probability);

    let step = 2.0 * PI / nb_steps as f64;
    let angles = Array1::from_shape_fn(nb_steps, |k| k as f64 * step);
    let x_component = angles.mapv(|a| radius * a.cos());
    let y_component = angles.mapv(|a| radius * a.sin());
    let x_quantile = x_component.mapv(norm_cdf);
    let y_quantile = y_component.mapv(norm_cdf);

    Ok(Self {
      sea_state_duration,
      return_period,
      exceedance_probability,
      radius,
      x_component,
      y_component,
      x_quantile,
      y_quantile,
    })
  }

  pub fn nb_steps(&self) -> usize {
    self.x_component.len()
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  #[test]
  fn points_lie_on_circle() {
    let iso = IsoProbability::compute(3600.0, 100.0, 37).unwrap();
    assert_eq!(iso.nb_steps(), 37);
    for (x, y) in iso.x_component.iter().zip(iso.y_component.iter()) {
      assert_relative_eq!(x.hypot(*y), iso.radius, max_relative = 1e-12);
    }
    assert!(iso
      .x_quantile
      .iter()
      .chain(iso.y_quantile.iter())
      .all(|&q| q > 0.0 && q < 1.0));
  }

  #[test]
  fn exceedance_probability_from_duration() {
    let iso = IsoProbability::compute(3600.0, 1.0, 4).unwrap();
    assert_relative_eq!(iso.exceedance_probability, 1.0 / 8760.0, max_relative = 1e-12);
    assert_relative_eq!(norm_cdf(iso.radius), 1.0 - 1.0 / 8760.0, max_relative = 1e-10);
    // First angle is zero, the circle is not closed.
    assert_eq!(iso.y_component[0], 0.0);
    assert_relative_eq!(iso.x_component[2], -iso.radius, max_relative = 1e-12);
  }

  #[test]
  fn rejects_bad_inputs() {
    assert!(IsoProbability::compute(0.0, 1.0, 10).is_err());
    assert!(IsoProbability::compute(3600.0, -1.0, 10).is_err());
    assert!(IsoProbability::compute(3600.0, 1.0, 0).is_err());
    assert!(IsoProbability::compute(SECONDS_PER_YEAR * 2.0, 1.0, 10).is_err());
  }
}
