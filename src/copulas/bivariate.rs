use ndarray::Array1;

use super::marginals::TabulatedMarginal;
use crate::contours::iso_probability::IsoProbability;
use crate::error::ContourError;
use crate::error::Result;

pub mod clayton;
pub mod gaussian;
pub mod gumbel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopulaType {
  Gaussian,
  Clayton,
  Gumbel,
}

/// A one-parameter bivariate copula fitted from Kendall's tau.
///
/// The copula maps the iso-probability circle onto x2 given the x1
/// quantiles: methods with a closed-form conditional inverse expose it via
/// [`Bivariate::conditional_quantiles`], the others override
/// [`Bivariate::component_2`].
pub trait Bivariate {
  fn r#type(&self) -> CopulaType;

  fn tau(&self) -> f64;

  /// Dependence parameter (`rho` for the Gaussian copula, `theta` otherwise).
  fn theta(&self) -> f64;

  fn theta_bounds(&self) -> (f64, f64);

  fn check_theta(&self) -> Result<()> {
    let (lower, upper) = self.theta_bounds();
    let theta = self.theta();

    if !(theta.is_finite() && lower <= theta && theta <= upper) {
      return Err(ContourError::invalid_parameter(
        "tau",
        format!(
          "{:?} copula parameter {theta} from tau = {} is outside [{lower}, {upper}]",
          self.r#type(),
          self.tau()
        ),
      ));
    }

    Ok(())
  }

  /// x2 quantile levels `z2` along the circle, when available in closed form.
  fn conditional_quantiles(&self, _iso: &IsoProbability) -> Option<Array1<f64>> {
    None
  }

  /// x2 contour coordinates for the circle, inverted through `marginal`.
  fn component_2(&self, iso: &IsoProbability, marginal: &dyn TabulatedMarginal) -> Result<Array1<f64>> {
    let z2 = self.conditional_quantiles(iso).ok_or_else(|| {
      ContourError::numerical(format!(
        "{:?} copula has no closed-form conditional quantile",
        self.r#type()
      ))
    })?;
    marginal.ppf_array(&z2)
  }
}
