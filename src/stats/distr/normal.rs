use std::f64::consts::PI;

use ndarray::ArrayView1;
use statrs::distribution::Continuous;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::error::ContourError;
use crate::error::Result;

/// Standard normal CDF `Φ(x)`.
pub fn norm_cdf(x: f64) -> f64 {
  Normal::standard().cdf(x)
}

/// Standard normal quantile `Φ⁻¹(p)`; `±∞` at the boundaries.
pub fn norm_ppf(p: f64) -> f64 {
  if p.is_nan() {
    f64::NAN
  } else if p <= 0.0 {
    f64::NEG_INFINITY
  } else if p >= 1.0 {
    f64::INFINITY
  } else {
    Normal::standard().inverse_cdf(p)
  }
}

pub fn norm_pdf(x: f64) -> f64 {
  Normal::standard().pdf(x)
}

/// `ln(1 - Φ(b))`, finite far into the upper tail.
pub(crate) fn ln_norm_sf(b: f64) -> f64 {
  if b < 37.0 {
    Normal::standard().sf(b).ln()
  } else {
    // Mills-ratio asymptote once the survival function underflows.
    -0.5 * b * b - b.ln() - 0.5 * (2.0 * PI).ln()
  }
}

/// Maximum-likelihood normal fit (`sigma` uses the `1/n` estimator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalFit {
  pub mu: f64,
  pub sigma: f64,
}

impl NormalFit {
  pub fn fit(data: ArrayView1<f64>) -> Result<Self> {
    let mu = data
      .mean()
      .ok_or_else(|| ContourError::InsufficientData("normal fit of an empty sample".into()))?;
    let sigma = data.std(0.0);
    Ok(Self { mu, sigma })
  }

  pub fn ppf(&self, p: f64) -> f64 {
    self.mu + self.sigma * norm_ppf(p)
  }
}
