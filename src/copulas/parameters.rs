//! Marginal and conditional fits shared by the copula methods.
//!
//! $$
//! \ln x_2\mid x_1\sim\mathcal N\big(\lambda(x_1),\sigma(x_1)\big),\quad
//! \lambda\in\mathbb P_3,\ \sigma\in\mathbb P_2
//! $$
//!
use impl_new_derive::ImplNew;
use ndarray::s;
use ndarray::Array1;
use tracing::debug;

use super::marginals::TabulatedCurve;
use crate::error::ContourError;
use crate::error::Result;
use crate::samples::require_positive;
use crate::samples::SampleSeries;
use crate::stats::distr::lognormal::LogNormal;
use crate::stats::distr::normal::NormalFit;
use crate::stats::distr::weibull::ExpWeibull;
use crate::stats::gaussian_kde::GaussianKDE;
use crate::stats::regression::polyval;
use crate::stats::regression::polynomial_least_squares;

/// Adaptive binning of x1 used for the conditional log-normal fits.
#[derive(Debug, Clone, Copy, PartialEq, ImplNew)]
pub struct CopulaBinning {
  /// Minimum population of every bin but the last.
  pub min_bin_count: usize,
  /// Upper x1 edge of the first bin before it is grown.
  pub initial_bin_max_val: f64,
  /// Width added to each subsequent edge.
  pub bin_val_size: f64,
}

impl Default for CopulaBinning {
  fn default() -> Self {
    Self {
      min_bin_count: 40,
      initial_bin_max_val: 1.0,
      bin_val_size: 0.25,
    }
  }
}

impl CopulaBinning {
  pub fn validate(&self) -> Result<()> {
    if self.min_bin_count == 0 {
      return Err(ContourError::invalid_parameter(
        "min_bin_count",
        "must be at least 1",
      ));
    }
    if !self.initial_bin_max_val.is_finite() {
      return Err(ContourError::invalid_parameter(
        "initial_bin_max_val",
        format!("must be finite, got {}", self.initial_bin_max_val),
      ));
    }
    if !(self.bin_val_size.is_finite() && self.bin_val_size > 0.0) {
      return Err(ContourError::invalid_parameter(
        "bin_val_size",
        format!("must be finite and positive, got {}", self.bin_val_size),
      ));
    }
    Ok(())
  }
}

/// Bin edges over sorted x1 with the cumulative count of points `<=` each.
///
/// Every increment `counts[i] - counts[i-1]` is at least `min_bin_count`
/// except the last one, which is the edge that stopped the growth.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveBins {
  pub edges: Vec<f64>,
  pub counts: Vec<usize>,
}

impl AdaptiveBins {
  pub fn build(sorted_x1: &[f64], binning: &CopulaBinning) -> Result<Self> {
    binning.validate()?;
    let n = sorted_x1.len();
    if n < binning.min_bin_count {
      return Err(ContourError::InsufficientData(format!(
        "{n} samples cannot fill a first bin of {} points",
        binning.min_bin_count
      )));
    }

    let count_le = |limit: f64| sorted_x1.partition_point(|&v| v <= limit);

    // Jump to the first step at or above the `min_bin_count`-th point, then
    // settle any rounding one step at a time.
    let mut first = binning.initial_bin_max_val;
    let target = sorted_x1[binning.min_bin_count - 1];
    if first < target {
      let steps = ((target - first) / binning.bin_val_size).ceil();
      first += steps * binning.bin_val_size;
    }
    let mut count = count_le(first);
    while count < binning.min_bin_count {
      let next = first + binning.bin_val_size;
      if next == first {
        break;
      }
      first = next;
      count = count_le(first);
    }
    if !first.is_finite() || count < binning.min_bin_count {
      return Err(ContourError::invalid_parameter(
        "bin_val_size",
        format!(
          "step {} cannot reach x1 = {target} from initial_bin_max_val = {}",
          binning.bin_val_size, binning.initial_bin_max_val
        ),
      ));
    }

    let mut edges = vec![first];
    let mut counts = vec![count];
    let mut i = 1;
    loop {
      let edge = first + binning.bin_val_size * i as f64;
      let count = count_le(edge);
      let increment = count - counts[i - 1];
      edges.push(edge);
      counts.push(count);
      if increment < binning.min_bin_count {
        break;
      }
      i += 1;
    }

    Ok(Self { edges, counts })
  }

  /// Index ranges of the conditional bins.
  ///
  /// The first two bins are cumulative from the start, the middle bins span
  /// two consecutive edges, and the last bin holds everything above the
  /// second-to-last edge.
  pub fn ranges(&self, n: usize) -> Vec<(usize, usize)> {
    let ind = &self.counts;
    let num = ind.len();
    let mut ranges = Vec::with_capacity(num + 1);
    ranges.push((0, ind[0]));
    ranges.push((0, ind[1]));
    for i in 2..num {
      ranges.push((ind[i - 2], ind[i]));
    }
    ranges.push((ind[num - 2], n));
    ranges
  }
}

/// Normal fit of `ln x2` within one x1 bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinFit {
  pub start: usize,
  pub end: usize,
  pub mean_x1: f64,
  pub log_fit: NormalFit,
}

/// Parametric marginals and conditional regressions of the copula methods.
#[derive(Debug, Clone, PartialEq)]
pub struct CopulaParameters {
  /// Exponentiated Weibull law of x1.
  pub dist_1: ExpWeibull,
  /// Log-normal law of x2.
  pub dist_2: LogNormal,
  /// Cubic coefficients (ascending) of the mean of `ln x2` given x1.
  pub mean_cond: [f64; 4],
  /// Quadratic coefficients (ascending) of the std of `ln x2` given x1.
  pub std_cond: [f64; 3],
  pub bins: AdaptiveBins,
  pub bin_fits: Vec<BinFit>,
}

impl CopulaParameters {
  pub fn fit(samples: &SampleSeries, binning: &CopulaBinning) -> Result<Self> {
    binning.validate()?;
    require_positive(samples.x1(), "x1", "exponentiated Weibull marginal")?;
    require_positive(samples.x2(), "x2", "log-normal marginal")?;

    let (x1, x2) = samples.sorted_by_x1();
    let bins = AdaptiveBins::build(&x1.to_vec(), binning)?;

    let dist_1 = ExpWeibull::fit(&x1)?;
    let dist_2 = LogNormal::fit(&x2)?;

    let log_x2 = x2.mapv(f64::ln);
    let mut bin_fits = Vec::new();
    for (start, end) in bins.ranges(x1.len()) {
      if end <= start {
        continue;
      }
      let mean_x1 = x1.slice(s![start..end]).mean().unwrap_or(f64::NAN);
      let log_fit = NormalFit::fit(log_x2.slice(s![start..end]))?;
      bin_fits.push(BinFit {
        start,
        end,
        mean_x1,
        log_fit,
      });
    }
    if bin_fits.len() < 2 {
      return Err(ContourError::InsufficientData(format!(
        "only {} non-empty conditional bins",
        bin_fits.len()
      )));
    }

    let hss: Vec<f64> = bin_fits.iter().map(|b| b.mean_x1).collect();
    let mus: Vec<f64> = bin_fits.iter().map(|b| b.log_fit.mu).collect();
    let sigmas: Vec<f64> = bin_fits.iter().map(|b| b.log_fit.sigma).collect();
    let mean_cond = to_array::<4>(polynomial_least_squares(&hss, &mus, 3)?)?;
    let std_cond = to_array::<3>(polynomial_least_squares(&hss, &sigmas, 2)?)?;

    debug!(
      edges = ?bins.edges,
      counts = ?bins.counts,
      ?mean_cond,
      ?std_cond,
      "fitted copula parameters"
    );

    Ok(Self {
      dist_1,
      dist_2,
      mean_cond,
      std_cond,
      bins,
      bin_fits,
    })
  }

  /// Conditional mean of `ln x2` at `x1`.
  pub fn conditional_log_mean(&self, x1: f64) -> f64 {
    polyval(&self.mean_cond, x1)
  }

  /// Conditional standard deviation of `ln x2` at `x1`.
  pub fn conditional_log_std(&self, x1: f64) -> f64 {
    polyval(&self.std_cond, x1)
  }
}

fn to_array<const N: usize>(coef: Vec<f64>) -> Result<[f64; N]> {
  let len = coef.len();
  coef
    .try_into()
    .map_err(|_| ContourError::numerical(format!("expected {N} coefficients, got {len}")))
}

/// Kernel-density marginals of the non-parametric copula methods.
#[derive(Debug, Clone, PartialEq)]
pub struct NonparametricCopulaParameters {
  /// x1 grid with its KDE density and CDF.
  pub dist_1: TabulatedCurve,
  /// x2 grid with its KDE density and CDF.
  pub dist_2: TabulatedCurve,
  pub bandwidths: [f64; 2],
}

impl NonparametricCopulaParameters {
  /// Tabulates both marginals on `nb_steps` points over `[0, max]`, where
  /// `max` defaults to twice the sample maximum.
  pub fn fit(
    samples: &SampleSeries,
    max_x1: Option<f64>,
    max_x2: Option<f64>,
    nb_steps: usize,
  ) -> Result<Self> {
    if nb_steps < 2 {
      return Err(ContourError::invalid_parameter(
        "nb_steps",
        "non-parametric marginals need at least 2 grid points",
      ));
    }
    let (x1, x2) = samples.sorted_by_x1();

    let (dist_1, bw1) = kde_marginal(x1, max_x1, "max_x1", nb_steps)?;
    let (dist_2, bw2) = kde_marginal(x2, max_x2, "max_x2", nb_steps)?;
    debug!(bw1, bw2, nb_steps, "fitted non-parametric marginals");

    Ok(Self {
      dist_1,
      dist_2,
      bandwidths: [bw1, bw2],
    })
  }
}

fn kde_marginal(
  data: Array1<f64>,
  max: Option<f64>,
  name: &'static str,
  nb_steps: usize,
) -> Result<(TabulatedCurve, f64)> {
  let upper = match max {
    Some(m) => m,
    None => 2.0 * data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
  };
  if !(upper.is_finite() && upper > 0.0) {
    return Err(ContourError::invalid_parameter(
      name,
      format!("grid upper bound must be finite and positive, got {upper}"),
    ));
  }

  let kde = GaussianKDE::with_mad_bandwidth(data)?;
  let grid = Array1::linspace(0.0, upper, nb_steps);
  let pdf = kde.evaluate_array(&grid);
  let curve = TabulatedCurve::from_density(grid, pdf)?;
  Ok((curve, kde.bandwidth()))
}
