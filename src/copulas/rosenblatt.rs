use ndarray::Array1;
use ndarray::Zip;
use tracing::warn;

use super::parameters::CopulaParameters;
use crate::stats::distr::lognormal::lognormal_ppf;

/// x2 along the contour from the conditional log-normal regression.
#[derive(Debug, Clone, PartialEq)]
pub struct RosenblattComponent {
  pub x2: Array1<f64>,
  /// Conditional mean of `ln x2` at each contour x1.
  pub lambda_cond: Array1<f64>,
  /// Conditional standard deviation of `ln x2` at each contour x1.
  pub sigma_cond: Array1<f64>,
}

/// Evaluates the cubic log-mean and quadratic log-std at `component_1` and
/// inverts the conditional log-normal at `y_quantile`.
///
/// Steps where the standard deviation is not positive are NaN.
pub fn rosenblatt_component_2(
  component_1: &Array1<f64>,
  y_quantile: &Array1<f64>,
  params: &CopulaParameters,
) -> RosenblattComponent {
  let lambda_cond = component_1.mapv(|x| params.conditional_log_mean(x));
  let sigma_cond = component_1.mapv(|x| params.conditional_log_std(x));

  let x2 = Zip::from(y_quantile)
    .and(&lambda_cond)
    .and(&sigma_cond)
    .map_collect(|&q, &mu, &sigma| lognormal_ppf(q, mu, sigma));

  let invalid = sigma_cond.iter().filter(|s| s.is_nan() || **s <= 0.0).count();
  if invalid > 0 {
    warn!(
      invalid,
      steps = sigma_cond.len(),
      "conditional log-std is not positive on part of the contour"
    );
  }

  RosenblattComponent {
    x2,
    lambda_cond,
    sigma_cond,
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;
  use tracing_test::traced_test;

  use super::*;
  use crate::copulas::parameters::AdaptiveBins;
  use crate::stats::distr::lognormal::LogNormal;
  use crate::stats::distr::weibull::ExpWeibull;

  fn params(mean_cond: [f64; 4], std_cond: [f64; 3]) -> CopulaParameters {
    CopulaParameters {
      dist_1: ExpWeibull {
        a: 1.0,
        c: 1.5,
        loc: 0.0,
        scale: 2.0,
      },
      dist_2: LogNormal::new(1.5, 0.3),
      mean_cond,
      std_cond,
      bins: AdaptiveBins {
        edges: vec![1.0, 1.25],
        counts: vec![1, 1],
      },
      bin_fits: Vec::new(),
    }
  }

  #[test]
  fn median_follows_conditional_mean() {
    let p = params([1.0, 0.5, 0.0, 0.0], [0.2, 0.0, 0.0]);
    let out = rosenblatt_component_2(&array![1.0, 2.0], &array![0.5, 0.5], &p);
    assert_relative_eq!(out.x2[0], 1.5_f64.exp(), max_relative = 1e-10);
    assert_relative_eq!(out.x2[1], 2.0_f64.exp(), max_relative = 1e-10);
    assert_eq!(out.sigma_cond, array![0.2, 0.2]);
  }

  #[test]
  #[traced_test]
  fn negative_std_gives_nan_and_warns() {
    let p = params([1.0, 0.0, 0.0, 0.0], [0.5, -0.5, 0.0]);
    let out = rosenblatt_component_2(&array![0.5, 2.0], &array![0.9, 0.9], &p);
    assert!(out.x2[0].is_finite());
    assert!(out.x2[1].is_nan());
    assert!(logs_contain("conditional log-std is not positive"));
  }
}
