use std::f64::consts::FRAC_PI_2;

use ndarray::Array1;
use ndarray::Zip;

use super::Bivariate;
use super::CopulaType;
use crate::contours::iso_probability::IsoProbability;
use crate::error::Result;
use crate::stats::distr::normal::norm_cdf;

/// Gaussian copula with `rho = sin(tau * pi / 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
  pub r#type: CopulaType,
  pub tau: f64,
  pub rho: f64,
}

impl Gaussian {
  pub fn from_tau(tau: f64) -> Result<Self> {
    let copula = Self {
      r#type: CopulaType::Gaussian,
      tau,
      rho: (tau * FRAC_PI_2).sin(),
    };
    copula.check_theta()?;
    Ok(copula)
  }
}

impl Bivariate for Gaussian {
  fn r#type(&self) -> CopulaType {
    self.r#type
  }

  fn tau(&self) -> f64 {
    self.tau
  }

  fn theta(&self) -> f64 {
    self.rho
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (-1.0, 1.0)
  }

  /// `z2 = Φ(y √(1 - ρ²) + ρ x)` on the circle coordinates.
  fn conditional_quantiles(&self, iso: &IsoProbability) -> Option<Array1<f64>> {
    let scale = (1.0 - self.rho * self.rho).sqrt();
    Some(
      Zip::from(&iso.x_component)
        .and(&iso.y_component)
        .map_collect(|&x, &y| norm_cdf(y * scale + self.rho * x)),
    )
  }
}
