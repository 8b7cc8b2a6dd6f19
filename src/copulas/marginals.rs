use std::borrow::Cow;

use ndarray::Array1;

use crate::error::ContourError;
use crate::error::Result;
use crate::stats::distr::inverse_gauss::InverseGauss;
use crate::stats::distr::lognormal::LogNormal;
use crate::stats::distr::weibull::ExpWeibull;

/// A one-dimensional law that can be inverted at a probability level.
pub trait Marginal {
  fn ppf(&self, p: f64) -> Result<f64>;

  fn ppf_array(&self, p: &Array1<f64>) -> Result<Array1<f64>> {
    p.iter()
      .map(|&pi| self.ppf(pi))
      .collect::<Result<Vec<_>>>()
      .map(Array1::from)
  }
}

/// A marginal that can also be tabulated on a grid, as needed by copulas
/// whose conditional law has no closed-form inverse.
pub trait TabulatedMarginal: Marginal {
  fn density_table(&self) -> Cow<'_, TabulatedCurve>;
}

/// Density and distribution function tabulated on an increasing grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedCurve {
  pub values: Array1<f64>,
  pub pdf: Array1<f64>,
  pub cdf: Array1<f64>,
}

impl TabulatedCurve {
  pub fn new(values: Array1<f64>, pdf: Array1<f64>, cdf: Array1<f64>) -> Result<Self> {
    if values.is_empty() || values.len() != pdf.len() || values.len() != cdf.len() {
      return Err(ContourError::invalid_parameter(
        "table",
        format!(
          "values, pdf and cdf must be non-empty and equally long, got {}, {}, {}",
          values.len(),
          pdf.len(),
          cdf.len()
        ),
      ));
    }
    Ok(Self { values, pdf, cdf })
  }

  /// Builds the CDF as the normalised running sum of `pdf`.
  pub fn from_density(values: Array1<f64>, pdf: Array1<f64>) -> Result<Self> {
    let cdf = normalized_cumsum(&pdf).ok_or_else(|| {
      ContourError::numerical("tabulated density has no positive mass on its grid")
    })?;
    Self::new(values, pdf, cdf)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn lookup(&self, z: f64) -> f64 {
    midpoint_lookup(&self.values, &self.cdf, z)
  }
}

impl Marginal for TabulatedCurve {
  fn ppf(&self, p: f64) -> Result<f64> {
    Ok(self.lookup(p))
  }
}

impl TabulatedMarginal for TabulatedCurve {
  fn density_table(&self) -> Cow<'_, TabulatedCurve> {
    Cow::Borrowed(self)
  }
}

/// `cumsum(w) / sum(w)`; `None` when the total mass is not positive.
pub(crate) fn normalized_cumsum(weights: &Array1<f64>) -> Option<Array1<f64>> {
  let mut out = Array1::<f64>::zeros(weights.len());
  let mut total = 0.0;
  for (o, &w) in out.iter_mut().zip(weights.iter()) {
    total += w;
    *o = total;
  }
  if !(total.is_finite() && total > 0.0) {
    return None;
  }
  out.mapv_inplace(|c| c / total);
  Some(out)
}

/// Inverts a tabulated CDF at `z` without interpolation.
///
/// Below the first CDF value the smallest grid value is returned; otherwise
/// the midpoint of the first interval whose upper CDF value reaches `z`;
/// past the last value the largest grid value.
pub fn midpoint_lookup(values: &Array1<f64>, cdf: &Array1<f64>, z: f64) -> f64 {
  let n = values.len();
  if n == 0 || z.is_nan() {
    return f64::NAN;
  }
  if z <= cdf[0] {
    return values[0];
  }
  match cdf.iter().position(|&c| z <= c) {
    Some(j) => 0.5 * (values[j] + values[j - 1]),
    None => values[n - 1],
  }
}

impl Marginal for ExpWeibull {
  fn ppf(&self, p: f64) -> Result<f64> {
    Ok(ExpWeibull::ppf(self, p))
  }
}

impl Marginal for InverseGauss {
  fn ppf(&self, p: f64) -> Result<f64> {
    InverseGauss::ppf(self, p)
  }
}

impl Marginal for LogNormal {
  fn ppf(&self, p: f64) -> Result<f64> {
    Ok(LogNormal::ppf(self, p))
  }
}

/// Number of grid points used to tabulate a parametric marginal.
pub const PARAMETRIC_TABLE_POINTS: usize = 1000;

/// Log-normal x2 marginal tabulated on `[0, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedLogNormal {
  pub law: LogNormal,
  pub upper: f64,
}

impl BoundedLogNormal {
  /// Upper grid bound `ceil(2 max(x2))`.
  pub fn from_sample(law: LogNormal, x2: &Array1<f64>) -> Self {
    let max = x2.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Self {
      law,
      upper: (2.0 * max).ceil(),
    }
  }
}

impl Marginal for BoundedLogNormal {
  fn ppf(&self, p: f64) -> Result<f64> {
    Ok(self.law.ppf(p))
  }
}

impl TabulatedMarginal for BoundedLogNormal {
  fn density_table(&self) -> Cow<'_, TabulatedCurve> {
    let values = Array1::linspace(0.0, self.upper, PARAMETRIC_TABLE_POINTS);
    let pdf = values.mapv(|x| self.law.pdf(x));
    let cdf = values.mapv(|x| self.law.cdf(x));
    Cow::Owned(TabulatedCurve { values, pdf, cdf })
  }
}
