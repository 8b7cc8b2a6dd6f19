use ndarray::Array1;

use super::invert_cdf;
use super::normal::ln_norm_sf;
use super::normal::norm_cdf;
use crate::error::ContourError;
use crate::error::Result;
use crate::samples::require_positive;

/// Inverse Gaussian law in the `invgauss(mu, loc, scale)` parameterisation.
///
/// With `loc = 0` the standardised variable `y = x / scale` has mean `mu`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseGauss {
  pub mu: f64,
  pub loc: f64,
  pub scale: f64,
}

impl InverseGauss {
  /// Closed-form maximum-likelihood fit with `loc = 0`.
  pub fn fit(data: &Array1<f64>) -> Result<Self> {
    if data.len() < 2 {
      return Err(ContourError::InsufficientData(
        "inverse Gaussian fit needs at least 2 observations".into(),
      ));
    }
    require_positive(data, "c1", "inverse Gaussian fit")?;

    let n = data.len() as f64;
    let mean = data.sum() / n;
    let spread: f64 = data.iter().map(|&x| 1.0 / x - 1.0 / mean).sum();
    if !(spread.is_finite() && spread > 0.0) {
      return Err(ContourError::invalid_parameter(
        "c1",
        "inverse Gaussian fit of a degenerate sample",
      ));
    }
    let lambda = n / spread;

    Ok(Self {
      mu: mean / lambda,
      loc: 0.0,
      scale: lambda,
    })
  }

  fn standard_cdf(&self, y: f64) -> f64 {
    if y <= 0.0 {
      return 0.0;
    }
    let sqrt_y = y.sqrt();
    let a = (y / self.mu - 1.0) / sqrt_y;
    let b = (y / self.mu + 1.0) / sqrt_y;
    // exp(2/mu) overflows for small mu; combine in log space.
    let tail = (2.0 / self.mu + ln_norm_sf(b)).exp();
    (norm_cdf(a) + tail).min(1.0)
  }

  pub fn cdf(&self, x: f64) -> f64 {
    self.standard_cdf((x - self.loc) / self.scale)
  }

  pub fn ppf(&self, p: f64) -> Result<f64> {
    let y = invert_cdf(|y| self.standard_cdf(y), p, self.mu)?;
    Ok(self.loc + self.scale * y)
  }
}
