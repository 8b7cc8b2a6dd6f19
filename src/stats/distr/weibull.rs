use ndarray::Array1;
use ndarray_stats::QuantileExt;
use roots::find_root_brent;
use roots::SimpleConvergency;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Weibull;

use crate::error::ContourError;
use crate::error::Result;
use crate::samples::require_positive;

/// Exponentiated Weibull law `F(x) = (1 - exp(-((x - loc)/scale)^c))^a`.
///
/// Fitted with `a = 1` and `loc = 0` held fixed, which reduces the
/// likelihood to a two-parameter Weibull in `(c, scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpWeibull {
  pub a: f64,
  pub c: f64,
  pub loc: f64,
  pub scale: f64,
}

impl ExpWeibull {
  /// Maximum-likelihood fit with `a = 1`, `loc = 0`.
  ///
  /// The shape solves the profile score
  /// `Σ xᶜ ln x / Σ xᶜ - 1/c - mean(ln x) = 0`, and
  /// `scale = (mean xᶜ)^(1/c)`.
  pub fn fit(data: &Array1<f64>) -> Result<Self> {
    if data.len() < 2 {
      return Err(ContourError::InsufficientData(
        "Weibull fit needs at least 2 observations".into(),
      ));
    }
    require_positive(data, "x1", "Weibull fit")?;

    let max = *data
      .max()
      .map_err(|e| ContourError::numerical(format!("Weibull fit: {e}")))?;
    // Work on x / max so that xᶜ cannot overflow for large shapes.
    let y = data.mapv(|v| v / max);
    let ln_y = y.mapv(f64::ln);
    let mean_ln_y = ln_y.mean().unwrap_or(0.0);
    if ln_y.iter().all(|&v| (v - mean_ln_y).abs() < 1e-15) {
      return Err(ContourError::invalid_parameter(
        "x1",
        "Weibull fit of a constant sample",
      ));
    }

    let score = |c: f64| {
      let mut s0 = 0.0;
      let mut s1 = 0.0;
      for (&yi, &li) in y.iter().zip(ln_y.iter()) {
        let w = yi.powf(c);
        s0 += w;
        s1 += w * li;
      }
      s1 / s0 - 1.0 / c - mean_ln_y
    };

    let mut lo = 1.0;
    while score(lo) > 0.0 && lo > 1e-8 {
      lo *= 0.5;
    }
    let mut hi = 1.0;
    while score(hi) < 0.0 && hi < 1e8 {
      hi *= 2.0;
    }

    let mut convergency = SimpleConvergency {
      eps: 1e-12,
      max_iter: 500,
    };
    let c = find_root_brent(lo, hi, score, &mut convergency)
      .map_err(|e| ContourError::numerical(format!("Weibull shape: {e:?}")))?;
    let scale = max * y.mapv(|v| v.powf(c)).mean().unwrap_or(1.0).powf(1.0 / c);

    Ok(Self {
      a: 1.0,
      c,
      loc: 0.0,
      scale,
    })
  }

  /// Underlying `statrs` Weibull `(c, scale)`; `None` for non-positive
  /// parameters.
  pub fn weibull(&self) -> Option<Weibull> {
    Weibull::new(self.c, self.scale).ok()
  }

  pub fn cdf(&self, x: f64) -> f64 {
    if x <= self.loc {
      return 0.0;
    }
    self
      .weibull()
      .map_or(f64::NAN, |w| w.cdf(x - self.loc).powf(self.a))
  }

  /// Closed-form quantile; `statrs` 0.17 inverts the Weibull CDF with a
  /// 16-step bisection.
  pub fn ppf(&self, p: f64) -> f64 {
    if p.is_nan() {
      return f64::NAN;
    }
    if p <= 0.0 {
      return self.loc;
    }
    if p >= 1.0 {
      return f64::INFINITY;
    }
    let u = p.powf(1.0 / self.a);
    self.loc + self.scale * (-(-u).ln_1p()).powf(1.0 / self.c)
  }

  /// Parameters in `(a, c, loc, scale)` order.
  pub fn params(&self) -> [f64; 4] {
    [self.a, self.c, self.loc, self.scale]
  }
}
