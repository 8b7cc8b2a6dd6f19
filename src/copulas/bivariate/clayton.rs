use ndarray::Array1;
use ndarray::Zip;

use super::Bivariate;
use super::CopulaType;
use crate::contours::iso_probability::IsoProbability;
use crate::error::Result;

/// Clayton copula with `theta = 2 tau / (1 - tau)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clayton {
  pub r#type: CopulaType,
  pub tau: f64,
  pub theta: f64,
  pub theta_bounds: (f64, f64),
}

impl Clayton {
  pub fn from_tau(tau: f64) -> Result<Self> {
    let copula = Self {
      r#type: CopulaType::Clayton,
      tau,
      theta: 2.0 * tau / (1.0 - tau),
      theta_bounds: (-1.0, f64::INFINITY),
    };
    copula.check_theta()?;
    Ok(copula)
  }

  /// Conditional quantile of the second margin given `u`, at level `v`.
  pub fn inverse_conditional(&self, u: f64, v: f64) -> f64 {
    let theta = self.theta;
    if theta == 0.0 {
      // Independence limit.
      return v;
    }
    let a = u.powf(-theta);
    ((1.0 - a + a / v).powf(theta / (1.0 + theta))).powf(-1.0 / theta)
  }
}

impl Bivariate for Clayton {
  fn r#type(&self) -> CopulaType {
    self.r#type
  }

  fn tau(&self) -> f64 {
    self.tau
  }

  fn theta(&self) -> f64 {
    self.theta
  }

  fn theta_bounds(&self) -> (f64, f64) {
    self.theta_bounds
  }

  fn conditional_quantiles(&self, iso: &IsoProbability) -> Option<Array1<f64>> {
    Some(
      Zip::from(&iso.x_quantile)
        .and(&iso.y_quantile)
        .map_collect(|&u, &v| self.inverse_conditional(u, v)),
    )
  }
}
