use ndarray::Array1;
use statrs::distribution::Continuous;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::LogNormal as LogNormalLaw;

use super::normal::NormalFit;
use crate::error::Result;
use crate::samples::require_positive;

/// Log-normal law parameterised by the normal fit of `ln x`.
///
/// Equivalent to `lognorm(s = sigma, loc = 0, scale = exp(mu))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
  pub log_fit: NormalFit,
}

impl LogNormal {
  pub fn new(mu: f64, sigma: f64) -> Self {
    Self {
      log_fit: NormalFit { mu, sigma },
    }
  }

  pub fn fit(data: &Array1<f64>) -> Result<Self> {
    require_positive(data, "x2", "log-normal fit")?;
    let logs = data.mapv(f64::ln);
    Ok(Self {
      log_fit: NormalFit::fit(logs.view())?,
    })
  }

  pub fn s(&self) -> f64 {
    self.log_fit.sigma
  }

  pub fn scale(&self) -> f64 {
    self.log_fit.mu.exp()
  }

  /// `statrs` law, `None` when the shape is not positive.
  pub fn law(&self) -> Option<LogNormalLaw> {
    LogNormalLaw::new(self.log_fit.mu, self.log_fit.sigma).ok()
  }

  pub fn cdf(&self, x: f64) -> f64 {
    if x <= 0.0 {
      return 0.0;
    }
    self.law().map_or(f64::NAN, |d| d.cdf(x))
  }

  pub fn pdf(&self, x: f64) -> f64 {
    if x <= 0.0 {
      return 0.0;
    }
    self.law().map_or(f64::NAN, |d| d.pdf(x))
  }

  /// Quantile; NaN when the shape is not positive.
  pub fn ppf(&self, p: f64) -> f64 {
    lognormal_ppf(p, self.log_fit.mu, self.log_fit.sigma)
  }
}

/// `exp(mu + sigma Φ⁻¹(p))`; NaN for `sigma <= 0` or `p` outside `[0, 1]`.
pub fn lognormal_ppf(p: f64, mu: f64, sigma: f64) -> f64 {
  if !(0.0..=1.0).contains(&p) {
    return f64::NAN;
  }
  LogNormalLaw::new(mu, sigma).map_or(f64::NAN, |d| d.inverse_cdf(p))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn fit_recovers_log_moments() {
    let data = array![1.0_f64, std::f64::consts::E, std::f64::consts::E.powi(2)];
    let law = LogNormal::fit(&data).unwrap();
    assert_relative_eq!(law.log_fit.mu, 1.0, epsilon = 1e-12);
    assert_relative_eq!(law.scale(), std::f64::consts::E, epsilon = 1e-12);
  }

  #[test]
  fn ppf_inverts_cdf() {
    let law = LogNormal::new(1.2, 0.3);
    for &p in &[0.01, 0.5, 0.99] {
      assert_relative_eq!(law.cdf(law.ppf(p)), p, epsilon = 1e-10);
    }
  }

  #[test]
  fn ppf_is_nan_for_non_positive_shape() {
    assert!(lognormal_ppf(0.5, 0.0, -0.1).is_nan());
    assert!(lognormal_ppf(0.5, 0.0, f64::NAN).is_nan());
    assert!(lognormal_ppf(f64::NAN, 0.0, 1.0).is_nan());
    assert!(LogNormal::new(0.0, 0.0).pdf(1.0).is_nan());
  }

  #[test]
  fn density_matches_closed_form() {
    let law = LogNormal::new(0.4, 0.7);
    let x: f64 = 2.3;
    let z = (x.ln() - 0.4) / 0.7;
    let expected = (-0.5 * z * z).exp() / (x * 0.7 * (2.0 * std::f64::consts::PI).sqrt());
    assert_relative_eq!(law.pdf(x), expected, max_relative = 1e-12);
    assert_relative_eq!(law.ppf(0.5), 0.4_f64.exp(), max_relative = 1e-12);
  }

  #[test]
  fn rejects_non_positive_samples() {
    assert!(LogNormal::fit(&array![1.0, 0.0]).is_err());
  }
}
