use ndarray::Array1;
use ndarray::Zip;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;

use super::Bivariate;
use super::CopulaType;
use crate::contours::iso_probability::IsoProbability;
use crate::copulas::marginals::midpoint_lookup;
use crate::copulas::marginals::normalized_cumsum;
use crate::copulas::marginals::TabulatedMarginal;
use crate::error::Result;

/// Gumbel copula with `theta = 1 / (1 - tau)`.
///
/// The conditional law of x2 has no closed-form inverse: for every circle
/// point it is tabulated as `c(u, F₂(x)) f₂(x)` on the marginal grid,
/// normalised by its running sum and inverted by table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gumbel {
  pub r#type: CopulaType,
  pub tau: f64,
  pub theta: f64,
  pub theta_bounds: (f64, f64),
}

impl Gumbel {
  pub fn from_tau(tau: f64) -> Result<Self> {
    let copula = Self {
      r#type: CopulaType::Gumbel,
      tau,
      theta: 1.0 / (1.0 - tau),
      theta_bounds: (1.0, f64::INFINITY),
    };
    copula.check_theta()?;
    Ok(copula)
  }

  pub fn density(&self, u: f64, v: f64) -> f64 {
    gumbel_density(u, v, self.theta)
  }
}

/// Gumbel copula density `c(u, v)`.
///
/// Underflow and `0 * inf` at the edges of the unit square yield 0 rather
/// than NaN or infinity.
pub fn gumbel_density(u: f64, v: f64, alpha: f64) -> f64 {
  let a = -u.ln();
  let b = -v.ln();
  let (vmin, vmax) = if a <= b { (a, b) } else { (b, a) };

  let nlog_c = vmax * (1.0 + (vmin / vmax).powf(alpha)).powf(1.0 / alpha);
  let log_terms = (alpha - 1.0) * vmin.ln() + vmin + (alpha - 1.0) * vmax.ln() + vmax;
  let y = (alpha - 1.0 + nlog_c) * (-nlog_c + log_terms + (1.0 - 2.0 * alpha) * nlog_c.ln()).exp();

  if y.is_finite() {
    y
  } else {
    0.0
  }
}

impl Bivariate for Gumbel {
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

  fn component_2(&self, iso: &IsoProbability, marginal: &dyn TabulatedMarginal) -> Result<Array1<f64>> {
    let table = marginal.density_table();

    // Circle points are independent; each builds its own conditional table.
    let out: Vec<f64> = (0..iso.nb_steps())
      .into_par_iter()
      .map(|k| {
        let u = iso.x_quantile[k];
        let weights = Zip::from(&table.cdf)
          .and(&table.pdf)
          .map_collect(|&f, &p| self.density(u, f) * p);
        match normalized_cumsum(&weights) {
          Some(cdf) => midpoint_lookup(&table.values, &cdf, iso.y_quantile[k]),
          None => f64::NAN,
        }
      })
      .collect();

    Ok(Array1::from(out))
  }
}
