//! # Bivariate KDE
//!
//! Contour as an iso-line of the product-kernel sum
//!
//! $$
//! S(x_1,x_2)=\sum_{k=1}^{n}
//! \phi\!\left(\frac{x_1-X_{1k}}{h_1}\right)\phi\!\left(\frac{x_2-X_{2k}}{h_2}\right)
//! $$
//!
//! taken at the level `p_e`. The sum is not divided by `n h_1 h_2`, so the
//! exceedance probability is compared against raw kernel mass.
//!
//! With the log transform both kernels act on `ln x` and each kernel is
//! multiplied by the Jacobian `1 / (x_1 x_2)`.
//!
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;
use tracing::warn;

use super::iso_probability::IsoProbability;
use super::marching_squares::level_set;
use super::marching_squares::Polyline;
use crate::error::ContourError;
use crate::error::Result;
use crate::samples::require_positive;
use crate::samples::SampleSeries;
use crate::stats::distr::normal::norm_pdf;

/// Lower bound of both evaluation axes.
pub const GRID_LOWER_BOUND: f64 = 0.01;

/// Density surface and level used to extract a KDE contour.
#[derive(Debug, Clone, PartialEq)]
pub struct BivariateKdeFit {
  pub bandwidth: [f64; 2],
  pub log_transform: bool,
  pub grid_x1: Array1<f64>,
  pub grid_x2: Array1<f64>,
  /// `density[[i, j]]` is the kernel sum at `(grid_x1[i], grid_x2[j])`.
  pub density: Array2<f64>,
  pub level: f64,
  /// Number of disjoint pieces of the level set.
  pub pieces: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BivariateKdeContour {
  pub x1: Array1<f64>,
  pub x2: Array1<f64>,
  pub fit: BivariateKdeFit,
}

/// Grid and kernel settings of [`bivariate_kde_contour`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdeGrid {
  pub bandwidth: [f64; 2],
  pub grid_size: usize,
  pub max_x1: Option<f64>,
  pub max_x2: Option<f64>,
  pub log_transform: bool,
}

impl KdeGrid {
  pub fn validate(&self) -> Result<()> {
    for (name, bw) in [("bandwidth[0]", self.bandwidth[0]), ("bandwidth[1]", self.bandwidth[1])] {
      if !(bw.is_finite() && bw > 0.0) {
        return Err(ContourError::invalid_parameter(
          name,
          format!("must be finite and positive, got {bw}"),
        ));
      }
    }
    if self.grid_size < 2 {
      return Err(ContourError::invalid_parameter(
        "kde_grid_size",
        format!("must be at least 2, got {}", self.grid_size),
      ));
    }
    for (name, max) in [("max_x1", self.max_x1), ("max_x2", self.max_x2)] {
      if let Some(m) = max {
        if !(m.is_finite() && m > GRID_LOWER_BOUND) {
          return Err(ContourError::invalid_parameter(
            name,
            format!("must be finite and above {GRID_LOWER_BOUND}, got {m}"),
          ));
        }
      }
    }
    Ok(())
  }
}

/// Iso-density contour at the exceedance probability of `iso`.
///
/// When the level set has several disjoint pieces the one with the most
/// vertices is returned.
pub fn bivariate_kde_contour(
  samples: &SampleSeries,
  iso: &IsoProbability,
  grid: &KdeGrid,
) -> Result<BivariateKdeContour> {
  grid.validate()?;
  if grid.log_transform {
    require_positive(samples.x1(), "x1", "log-transformed KDE")?;
    require_positive(samples.x2(), "x2", "log-transformed KDE")?;
  }

  let grid_x1 = axis(samples.x1(), grid.max_x1, grid.grid_size, "max_x1")?;
  let grid_x2 = axis(samples.x2(), grid.max_x2, grid.grid_size, "max_x2")?;
  let density = kde_surface(samples, &grid_x1, &grid_x2, grid.bandwidth, grid.log_transform);
  let level = iso.exceedance_probability;

  let pieces = level_set(&density, level);
  debug!(
    level,
    pieces = pieces.len(),
    log_transform = grid.log_transform,
    "extracted KDE level set"
  );
  if pieces.len() > 1 {
    warn!(
      pieces = pieces.len(),
      "KDE level set has disjoint pieces, keeping the largest"
    );
  }

  let piece_count = pieces.len();
  let largest = pieces
    .into_iter()
    .max_by_key(Polyline::len)
    .ok_or_else(|| {
      ContourError::numerical(format!(
        "KDE density never crosses level {level} on the evaluation grid"
      ))
    })?;

  let x1 = largest.points.iter().map(|p| index_to_value(&grid_x1, p.i)).collect();
  let x2 = largest.points.iter().map(|p| index_to_value(&grid_x2, p.j)).collect();

  Ok(BivariateKdeContour {
    x1,
    x2,
    fit: BivariateKdeFit {
      bandwidth: grid.bandwidth,
      log_transform: grid.log_transform,
      grid_x1,
      grid_x2,
      density,
      level,
      pieces: piece_count,
    },
  })
}

/// `grid_size` points over `[0.01, max]`, `max` defaulting to twice the
/// sample maximum.
fn axis(data: &Array1<f64>, max: Option<f64>, grid_size: usize, name: &'static str) -> Result<Array1<f64>> {
  let upper = match max {
    Some(m) => m,
    None => 2.0 * data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
  };
  if !(upper.is_finite() && upper > GRID_LOWER_BOUND) {
    return Err(ContourError::invalid_parameter(
      name,
      format!("grid upper bound {upper} must exceed {GRID_LOWER_BOUND}"),
    ));
  }
  Ok(Array1::linspace(GRID_LOWER_BOUND, upper, grid_size))
}

/// Product-kernel sum on the grid as `K1 · K2ᵀ`, where `K[i, k]` is the
/// standard normal kernel of sample `k` at grid point `i`.
fn kde_surface(
  samples: &SampleSeries,
  grid_x1: &Array1<f64>,
  grid_x2: &Array1<f64>,
  bandwidth: [f64; 2],
  log_transform: bool,
) -> Array2<f64> {
  let k1 = kernel_matrix(samples.x1(), grid_x1, bandwidth[0], log_transform);
  let k2 = kernel_matrix(samples.x2(), grid_x2, bandwidth[1], log_transform);
  k1.dot(&k2.t())
}

fn kernel_matrix(data: &Array1<f64>, grid: &Array1<f64>, bw: f64, log_transform: bool) -> Array2<f64> {
  let (data, points, jacobian) = if log_transform {
    (data.mapv(f64::ln), grid.mapv(f64::ln), grid.mapv(|x| 1.0 / x))
  } else {
    (data.clone(), grid.clone(), Array1::ones(grid.len()))
  };
  Array2::from_shape_fn((points.len(), data.len()), |(i, k)| {
    norm_pdf((points[i] - data[k]) / bw) * jacobian[i]
  })
}

/// Physical coordinate of a fractional index on a uniform axis.
fn index_to_value(axis: &Array1<f64>, index: f64) -> f64 {
  let last = axis.len() - 1;
  let step = (axis[last] - axis[0]) / last as f64;
  axis[0] + index * step
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::Array1;
  use tracing_test::traced_test;

  use super::*;
  use crate::test_utils::synthetic_sea_states;

  fn grid(bandwidth: [f64; 2], log_transform: bool) -> KdeGrid {
    KdeGrid {
      bandwidth,
      grid_size: 100,
      max_x1: None,
      max_x2: None,
      log_transform,
    }
  }

  /// Circle whose exceedance probability is `level` for a 1-hour sea state.
  fn iso_at(level: f64) -> IsoProbability {
    IsoProbability::compute(3600.0, 1.0 / (8760.0 * level), 8).unwrap()
  }

  #[test]
  fn surface_is_the_unnormalised_kernel_sum() {
    let samples = synthetic_sea_states(200, 5);
    // Wide enough to hold every kernel's mass.
    let g1 = Array1::linspace(-3.0, 12.0, 300);
    let g2 = Array1::linspace(-5.0, 35.0, 300);
    let (h1, h2) = (0.3, 0.6);
    let density = kde_surface(&samples, &g1, &g2, [h1, h2], false);
    let cell = (g1[1] - g1[0]) * (g2[1] - g2[0]);
    assert_abs_diff_eq!(density.sum() * cell / (200.0 * h1 * h2), 1.0, epsilon = 1e-2);
  }

  #[test]
  fn level_is_taken_on_the_raw_kernel_sum() {
    // One sample: S = exp(-r² / 2h²) / 2π, so S = L on r = h √(-2 ln(2πL)).
    let samples = SampleSeries::from_slices(&[2.0], &[2.0]).unwrap();
    let h = 0.5;
    let out = bivariate_kde_contour(&samples, &iso_at(0.05), &grid([h, h], false)).unwrap();

    let level = out.fit.level;
    let radius = h * (-2.0 * (2.0 * std::f64::consts::PI * level).ln()).sqrt();
    assert_eq!(out.fit.pieces, 1);
    assert!(!out.x1.is_empty());
    for (&a, &b) in out.x1.iter().zip(out.x2.iter()) {
      let r = ((a - 2.0).powi(2) + (b - 2.0).powi(2)).sqrt();
      assert_abs_diff_eq!(r, radius, epsilon = 2e-2);
    }
  }

  #[test]
  fn contour_surrounds_the_sample_bulk() {
    let samples = synthetic_sea_states(400, 9);
    let iso = IsoProbability::compute(3600.0, 1.0, 8).unwrap();
    let out = bivariate_kde_contour(&samples, &iso, &grid([0.3, 0.6], false)).unwrap();

    let mean_x1 = samples.x1().mean().unwrap();
    let mean_x2 = samples.x2().mean().unwrap();
    assert!(out.x1.iter().all(|v| v.is_finite()));
    assert!(out.x1.iter().any(|&v| v < mean_x1) && out.x1.iter().any(|&v| v > mean_x1));
    assert!(out.x2.iter().any(|&v| v < mean_x2) && out.x2.iter().any(|&v| v > mean_x2));
    assert_eq!(out.x1.len(), out.x2.len());
    assert_eq!(out.fit.density.dim(), (100, 100));
  }

  #[test]
  #[traced_test]
  fn largest_piece_is_kept() {
    let mut x1 = vec![2.0; 20];
    let mut x2 = vec![2.0; 20];
    x1.extend([6.0; 5]);
    x2.extend([6.0; 5]);
    let samples = SampleSeries::from_slices(&x1, &x2).unwrap();

    let out = bivariate_kde_contour(&samples, &iso_at(0.05), &grid([0.5, 0.5], false)).unwrap();
    assert_eq!(out.fit.pieces, 2);
    assert!(out.x1.iter().all(|&v| v < 4.0));
    assert!(out.x2.iter().all(|&v| v < 4.0));
    assert!(logs_contain("disjoint pieces"));
  }

  #[test]
  fn log_transform_stays_on_grid() {
    let samples = synthetic_sea_states(300, 3);
    let iso = IsoProbability::compute(3600.0, 1.0, 8).unwrap();
    let out = bivariate_kde_contour(&samples, &iso, &grid([0.15, 0.08], true)).unwrap();
    assert!(!out.x1.is_empty());
    for (&a, &b) in out.x1.iter().zip(out.x2.iter()) {
      assert!(a >= GRID_LOWER_BOUND - 1e-12 && b >= GRID_LOWER_BOUND - 1e-12);
      assert!(a <= out.fit.grid_x1[99] + 1e-9 && b <= out.fit.grid_x2[99] + 1e-9);
    }
  }

  #[test]
  fn log_transform_needs_positive_samples() {
    let samples = SampleSeries::from_slices(&[1.0, 0.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
    let iso = IsoProbability::compute(3600.0, 1.0, 8).unwrap();
    let err = bivariate_kde_contour(&samples, &iso, &grid([0.5, 0.5], true)).unwrap_err();
    assert!(matches!(err, ContourError::InvalidParameter { name: "x1", .. }));
  }

  #[test]
  fn level_above_the_peak_is_an_error() {
    let samples = SampleSeries::from_slices(&[2.0, 3.0], &[2.0, 3.0]).unwrap();
    let err = bivariate_kde_contour(&samples, &iso_at(0.9), &grid([1.0, 1.0], false)).unwrap_err();
    assert!(matches!(err, ContourError::Numerical(_)));
  }

  #[test]
  fn bad_bandwidth_is_rejected() {
    let samples = synthetic_sea_states(50, 1);
    let iso = IsoProbability::compute(3600.0, 1.0, 8).unwrap();
    let err = bivariate_kde_contour(&samples, &iso, &grid([0.0, 1.0], false)).unwrap_err();
    assert!(matches!(err, ContourError::InvalidParameter { name: "bandwidth[0]", .. }));
  }
}
