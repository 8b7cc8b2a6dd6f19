//! # PCA
//!
//! Principal-component I-FORM contour (Eckert-Gallup et al., 2016).
//!
//! $$
//! c = x\,P,\qquad c_1\sim\mathrm{IG}(\mu,0,s),\qquad
//! c_2\mid c_1\sim\mathcal N\big(m c_1+q,\ a c_1^2+b c_1+c\big)
//! $$
//!
use nalgebra::Matrix2;
use ndarray::s;
use ndarray::Array1;
use tracing::debug;
use tracing::warn;

use super::iso_probability::IsoProbability;
use crate::error::ContourError;
use crate::error::Result;
use crate::samples::argsort;
use crate::samples::SampleSeries;
use crate::stats::distr::inverse_gauss::InverseGauss;
use crate::stats::distr::normal::norm_ppf;
use crate::stats::regression::LinearFit;
use crate::stats::regression::QuadraticFit;

/// Per-bin statistics of the rotated sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaBins {
  /// Effective bin size after clamping.
  pub bin_size: usize,
  pub x1_means: Vec<f64>,
  pub x2_means: Vec<f64>,
  pub x2_sigmas: Vec<f64>,
}

/// Fitted principal-component model of a sample pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaFit {
  /// Sign-corrected principal axes; rows are components.
  pub principal_axes: [[f64; 2]; 2],
  /// Offset added to component 2 so that it is strictly positive.
  pub shift: f64,
  /// Inverse Gaussian law of component 1.
  pub x1_fit: InverseGauss,
  /// Conditional mean of component 2 given component 1.
  pub mu_fit: LinearFit,
  /// Conditional standard deviation of component 2 given component 1.
  pub sigma_fit: QuadraticFit,
  pub bins: PcaBins,
}

impl PcaFit {
  pub fn fit(samples: &SampleSeries, bin_size: usize) -> Result<Self> {
    if bin_size == 0 {
      return Err(ContourError::invalid_parameter(
        "pca_bin_size",
        "must be at least 1",
      ));
    }
    let n = samples.len();
    let minimum_4_bins = n / 4;
    if minimum_4_bins == 0 {
      return Err(ContourError::InsufficientData(format!(
        "PCA needs at least 4 samples to form 4 bins, got {n}"
      )));
    }

    let principal_axes = signed_principal_axes(samples.x1(), samples.x2())?;
    let (c1, c2) = rotate_arrays(&principal_axes, samples.x1(), samples.x2());
    let shift = c2.iter().copied().fold(f64::INFINITY, f64::min).abs() + 0.1;
    let c2 = c2 + shift;

    let order = argsort(&c1);
    let c1_sorted: Array1<f64> = order.iter().map(|&i| c1[i]).collect();
    let c2_sorted: Array1<f64> = order.iter().map(|&i| c2[i]).collect();

    let x1_fit = InverseGauss::fit(&c1_sorted)?;

    let bin_size = if bin_size > minimum_4_bins {
      warn!(
        requested = bin_size,
        clamped = minimum_4_bins,
        "to allow for a minimum of 4 bins the bin size has been reduced"
      );
      minimum_4_bins
    } else {
      bin_size
    };
    let bins = bin_statistics(&c1_sorted, &c2_sorted, bin_size);

    let mu_fit = LinearFit::fit(&bins.x1_means, &bins.x2_means)?;
    let sigma_fit = QuadraticFit::fit_constrained(&bins.x1_means, &bins.x2_sigmas)?;

    debug!(
      ?principal_axes,
      shift,
      bins = bins.x1_means.len(),
      ?sigma_fit,
      "fitted principal components"
    );

    Ok(Self {
      principal_axes,
      shift,
      x1_fit,
      mu_fit,
      sigma_fit,
      bins,
    })
  }

  /// Rotates `(x1, x2)` into shifted principal components.
  pub fn rotate(&self, x1: f64, x2: f64) -> (f64, f64) {
    let p = &self.principal_axes;
    (
      x1 * p[0][0] + x2 * p[1][0],
      x1 * p[0][1] + x2 * p[1][1] + self.shift,
    )
  }

  /// Inverse of [`PcaFit::rotate`].
  pub fn unrotate(&self, c1: f64, c2: f64) -> (f64, f64) {
    let p = &self.principal_axes;
    let det = p[0][0] * p[1][1] - p[0][1] * p[1][0];
    let c2 = c2 - self.shift;
    (
      (c1 * p[1][1] - c2 * p[1][0]) / det,
      (c2 * p[0][0] - c1 * p[0][1]) / det,
    )
  }

  /// I-FORM contour on the iso-probability circle.
  pub fn contour(&self, iso: &IsoProbability) -> Result<PcaContour> {
    let n = iso.nb_steps();
    let mut x1 = Array1::<f64>::zeros(n);
    let mut x2 = Array1::<f64>::zeros(n);
    let mut component_1 = Array1::<f64>::zeros(n);
    let mut component_2 = Array1::<f64>::zeros(n);
    let mut invalid = 0;

    for k in 0..n {
      let c1 = self.x1_fit.ppf(iso.x_quantile[k])?;
      let mu = self.mu_fit.predict(c1);
      let sigma = self.sigma_fit.eval(c1);
      let c2 = if sigma > 0.0 {
        mu + sigma * norm_ppf(iso.y_quantile[k])
      } else {
        invalid += 1;
        f64::NAN
      };

      let (u, v) = self.unrotate(c1, c2);
      component_1[k] = c1;
      component_2[k] = c2;
      // Negative heights are not physical; NaN is kept.
      x1[k] = if u < 0.0 { 0.0 } else { u };
      x2[k] = v;
    }

    if invalid > 0 {
      warn!(
        invalid,
        steps = n,
        "conditional component-2 std is not positive on part of the contour"
      );
    }

    Ok(PcaContour {
      x1,
      x2,
      component_1,
      component_2,
    })
  }
}

/// PCA contour in physical and principal coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaContour {
  pub x1: Array1<f64>,
  pub x2: Array1<f64>,
  pub component_1: Array1<f64>,
  pub component_2: Array1<f64>,
}

/// Eigenvectors of the sample covariance, largest variance first, with
/// absolute loadings and the `[1][1]` entry negated.
fn signed_principal_axes(x1: &Array1<f64>, x2: &Array1<f64>) -> Result<[[f64; 2]; 2]> {
  let n = x1.len();
  if n < 2 {
    return Err(ContourError::InsufficientData(
      "PCA needs at least 2 samples".into(),
    ));
  }
  let m1 = x1.mean().unwrap_or(0.0);
  let m2 = x2.mean().unwrap_or(0.0);
  let d1 = x1 - m1;
  let d2 = x2 - m2;
  let denom = (n - 1) as f64;
  let cov = Matrix2::new(
    d1.dot(&d1) / denom,
    d1.dot(&d2) / denom,
    d1.dot(&d2) / denom,
    d2.dot(&d2) / denom,
  );

  let eigen = cov.symmetric_eigen();
  let (first, second) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
    (0, 1)
  } else {
    (1, 0)
  };
  let v1 = eigen.eigenvectors.column(first);
  let v2 = eigen.eigenvectors.column(second);
  let axes = [[v1[0].abs(), v1[1].abs()], [v2[0].abs(), -v2[1].abs()]];

  if axes.iter().flatten().any(|v| !v.is_finite()) {
    return Err(ContourError::numerical("principal axes are not finite"));
  }
  Ok(axes)
}

fn rotate_arrays(
  p: &[[f64; 2]; 2],
  x1: &Array1<f64>,
  x2: &Array1<f64>,
) -> (Array1<f64>, Array1<f64>) {
  let c1 = x1 * p[0][0] + x2 * p[1][0];
  let c2 = x1 * p[0][1] + x2 * p[1][1];
  (c1, c2)
}

fn bin_statistics(c1: &Array1<f64>, c2: &Array1<f64>, bin_size: usize) -> PcaBins {
  let n = c1.len();
  let full = n / bin_size;
  let mut bounds: Vec<(usize, usize)> = (0..full).map(|b| (b * bin_size, (b + 1) * bin_size)).collect();
  if full * bin_size < n {
    bounds.push((full * bin_size, n));
  }

  let mut bins = PcaBins {
    bin_size,
    x1_means: Vec::with_capacity(bounds.len()),
    x2_means: Vec::with_capacity(bounds.len()),
    x2_sigmas: Vec::with_capacity(bounds.len()),
  };
  for (start, end) in bounds {
    let b1 = c1.slice(s![start..end]);
    let b2 = c2.slice(s![start..end]);
    bins.x1_means.push(b1.mean().unwrap_or(f64::NAN));
    bins.x2_means.push(b2.mean().unwrap_or(f64::NAN));
    bins.x2_sigmas.push(b2.std(0.0));
  }
  bins
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::test_utils::synthetic_sea_states;

  #[test]
  fn axes_follow_sign_convention() {
    let samples = synthetic_sea_states(400, 21);
    let axes = signed_principal_axes(samples.x1(), samples.x2()).unwrap();
    assert!(axes[0][0] >= 0.0 && axes[0][1] >= 0.0 && axes[1][0] >= 0.0);
    assert!(axes[1][1] <= 0.0);
    for row in axes {
      assert_abs_diff_eq!(row[0].hypot(row[1]), 1.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn rotation_round_trips() {
    let samples = synthetic_sea_states(600, 4);
    let fit = PcaFit::fit(&samples, 100).unwrap();
    for (&x1, &x2) in samples.x1().iter().zip(samples.x2().iter()) {
      let (c1, c2) = fit.rotate(x1, x2);
      assert!(c2 > 0.0);
      let (u, v) = fit.unrotate(c1, c2);
      assert_abs_diff_eq!(u, x1, epsilon = 1e-10);
      assert_abs_diff_eq!(v, x2, epsilon = 1e-10);
    }
  }

  #[test]
  fn bins_include_remainder() {
    let c = Array1::linspace(1.0, 10.0, 10);
    let bins = bin_statistics(&c, &c, 4);
    assert_eq!(bins.x1_means, vec![2.5, 6.5, 9.5]);
    assert_abs_diff_eq!(bins.x2_sigmas[2], 0.5);
  }

  #[test]
  #[traced_test]
  fn bin_size_is_clamped_to_four_bins() {
    let samples = synthetic_sea_states(20, 8);
    let fit = PcaFit::fit(&samples, 250).unwrap();
    assert_eq!(fit.bins.bin_size, 5);
    assert!(fit.bins.x1_means.len() >= 4);
    assert!(logs_contain("minimum of 4 bins"));
  }

  #[test]
  fn conditional_std_is_non_negative() {
    let samples = synthetic_sea_states(2000, 13);
    let fit = PcaFit::fit(&samples, 250).unwrap();
    let lo = fit.bins.x1_means.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = fit.bins.x1_means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for k in 0..=100 {
      let c1 = lo + (hi - lo) * k as f64 / 100.0;
      assert!(fit.sigma_fit.eval(c1) >= 0.0);
    }
  }

  #[test]
  fn contour_surrounds_sample_median() {
    let samples = synthetic_sea_states(2000, 17);
    let fit = PcaFit::fit(&samples, 250).unwrap();
    let iso = IsoProbability::compute(3600.0, 100.0, 72).unwrap();
    let contour = fit.contour(&iso).unwrap();

    assert_eq!(contour.x1.len(), 72);
    assert!(contour.x1.iter().all(|v| v.is_nan() || *v >= 0.0));
    let max_contour_hs = contour.x1.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_sample_hs = samples.x1().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(max_contour_hs > max_sample_hs);
  }

  #[test]
  fn too_few_samples() {
    let samples = SampleSeries::from_slices(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    assert!(matches!(
      PcaFit::fit(&samples, 250).unwrap_err(),
      ContourError::InsufficientData(_)
    ));
  }
}
