//! Marginal laws used by the contour methods.
//!
//! Parameter conventions follow the usual `(shape..., loc, scale)` layout:
//! fixed parameters are stored alongside the estimated ones so a fit can be
//! reported as a whole.
use roots::find_root_brent;
use roots::SimpleConvergency;

use crate::error::ContourError;
use crate::error::Result;

pub mod inverse_gauss;
pub mod lognormal;
pub mod normal;
pub mod weibull;

/// Inverts a monotone increasing `cdf` at `p` on `[0, ∞)`.
///
/// The upper bracket starts at `hint` and doubles until it covers `p`.
pub(crate) fn invert_cdf<F>(cdf: F, p: f64, hint: f64) -> Result<f64>
where
  F: Fn(f64) -> f64,
{
  if p.is_nan() {
    return Ok(f64::NAN);
  }
  if p <= 0.0 {
    return Ok(0.0);
  }
  if p >= 1.0 {
    return Ok(f64::INFINITY);
  }

  let mut hi = hint.max(f64::MIN_POSITIVE);
  let mut doublings = 0;
  while cdf(hi) < p {
    hi *= 2.0;
    doublings += 1;
    if doublings > 1074 {
      return Err(ContourError::numerical(format!(
        "could not bracket quantile {p}"
      )));
    }
  }

  let mut convergency = SimpleConvergency {
    eps: 1e-12,
    max_iter: 500,
  };
  find_root_brent(0.0, hi, |x| cdf(x) - p, &mut convergency)
    .map_err(|e| ContourError::numerical(format!("quantile inversion at {p}: {e:?}")))
}
