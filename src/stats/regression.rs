//! Least-squares fits used by the contour models.
//!
//! $$
//! \sigma(x)=a x^2+b x+c,\quad c\ge 0,\quad c-\frac{b^2}{4a}\ge 0
//! $$
//!
use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use linreg::linear_regression;
use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::warn;

use crate::error::ContourError;
use crate::error::Result;

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
  pub slope: f64,
  pub intercept: f64,
}

impl LinearFit {
  pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
    if x.len() != y.len() || x.len() < 2 {
      return Err(ContourError::InsufficientData(format!(
        "linear regression needs at least 2 paired points, got {} and {}",
        x.len(),
        y.len()
      )));
    }
    let (slope, intercept): (f64, f64) = linear_regression(x, y)
      .map_err(|e| ContourError::numerical(format!("linear regression: {e:?}")))?;
    Ok(Self { slope, intercept })
  }

  pub fn predict(&self, x: f64) -> f64 {
    self.slope * x + self.intercept
  }
}

/// Minimum-norm least-squares polynomial of the given degree.
///
/// Coefficients are returned in ascending order `[c0, c1, ..., c_degree]`.
pub fn polynomial_least_squares(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>> {
  if x.len() != y.len() || x.is_empty() {
    return Err(ContourError::InsufficientData(
      "polynomial least squares needs paired, non-empty data".into(),
    ));
  }

  let n = x.len();
  let k = degree + 1;
  let design = DMatrix::from_fn(n, k, |i, j| x[i].powi(j as i32));
  let rhs = DVector::from_row_slice(y);

  let coef = design
    .svd(true, true)
    .solve(&rhs, 1e-12)
    .map_err(|e| ContourError::numerical(format!("polynomial least squares: {e}")))?;
  Ok(coef.iter().copied().collect())
}

/// Evaluates ascending coefficients with Horner's scheme.
pub fn polyval(coef: &[f64], x: f64) -> f64 {
  coef.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Quadratic `a x² + b x + c` fitted under the constraints `c >= 0`
/// and `c - b²/(4a) >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFit {
  pub a: f64,
  pub b: f64,
  pub c: f64,
  /// Mean squared error of the returned coefficients.
  pub mse: f64,
  pub converged: bool,
  pub iterations: u64,
}

struct PenalizedMse<'a> {
  x: &'a [f64],
  y: &'a [f64],
  weight: f64,
}

fn quadratic_mse(p: &[f64], x: &[f64], y: &[f64]) -> f64 {
  let sse: f64 = x
    .iter()
    .zip(y)
    .map(|(&xi, &yi)| (p[0] * xi * xi + p[1] * xi + p[2] - yi).powi(2))
    .sum();
  sse / x.len() as f64
}

fn vertex_margin(p: &[f64]) -> f64 {
  p[2] - p[1] * p[1] / (4.0 * p[0])
}

impl CostFunction for PenalizedMse<'_> {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, p: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let violation = p[2].min(0.0).powi(2) + vertex_margin(p).min(0.0).powi(2);
    let value = quadratic_mse(p, self.x, self.y) + self.weight * violation;
    Ok(if value.is_finite() { value } else { f64::MAX })
  }
}

const PENALTY_WEIGHTS: [f64; 5] = [1e2, 1e4, 1e6, 1e8, 1e10];
const MAX_ITERS: u64 = 2000;

impl QuadraticFit {
  /// Exterior-penalty Nelder-Mead fit starting from `[0.1, 0.1, 0.1]`.
  ///
  /// The result is projected onto the feasible set so both constraints
  /// hold exactly.
  pub fn fit_constrained(x: &[f64], y: &[f64]) -> Result<Self> {
    Self::fit_constrained_with_max_iters(x, y, MAX_ITERS)
  }

  /// [`QuadraticFit::fit_constrained`] with `max_iters` Nelder-Mead steps
  /// per penalty weight.
  pub(crate) fn fit_constrained_with_max_iters(x: &[f64], y: &[f64], max_iters: u64) -> Result<Self> {
    if x.len() != y.len() || x.is_empty() {
      return Err(ContourError::InsufficientData(
        "quadratic fit needs paired, non-empty data".into(),
      ));
    }

    let mut params = vec![0.1; 3];
    let mut converged = false;
    let mut iterations = 0;

    for weight in PENALTY_WEIGHTS {
      let cost = PenalizedMse { x, y, weight };
      let solver = NelderMead::new(initial_simplex(&params))
        .with_sd_tolerance(1e-12)
        .map_err(|e| ContourError::numerical(format!("quadratic fit: {e}")))?;
      let res = Executor::new(cost, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| ContourError::numerical(format!("quadratic fit: {e}")))?;

      iterations += res.state.iter;
      converged = matches!(
        res.state.termination_status,
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
      );
      if let Some(best) = res.state.best_param {
        params = best;
      }
    }

    let (a, b) = (params[0], params[1]);
    let mut c = params[2].max(0.0);
    if a > 0.0 {
      c = c.max(b * b / (4.0 * a));
    }
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
      return Err(ContourError::numerical(
        "quadratic fit produced non-finite coefficients",
      ));
    }
    if !converged {
      warn!(iterations, "constrained quadratic fit did not converge");
    }

    Ok(Self {
      a,
      b,
      c,
      mse: quadratic_mse(&[a, b, c], x, y),
      converged,
      iterations,
    })
  }

  pub fn eval(&self, x: f64) -> f64 {
    (self.a * x + self.b) * x + self.c
  }

  /// Coefficients in descending order `[a, b, c]`.
  pub fn coefficients(&self) -> [f64; 3] {
    [self.a, self.b, self.c]
  }
}

fn initial_simplex(x0: &[f64]) -> Vec<Vec<f64>> {
  let mut simplex = Vec::with_capacity(x0.len() + 1);
  simplex.push(x0.to_vec());
  for i in 0..x0.len() {
    let mut point = x0.to_vec();
    point[i] += if point[i].abs() > 1.0 { 0.1 * point[i] } else { 0.1 };
    simplex.push(point);
  }
  simplex
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;

  #[test]
  fn linear_fit_recovers_line() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y = [3.0, 5.0, 7.0, 9.0];
    let fit = LinearFit::fit(&x, &y).unwrap();
    assert_abs_diff_eq!(fit.slope, 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.intercept, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.predict(10.0), 21.0, epsilon = 1e-10);
  }

  #[test]
  fn polynomial_fit_recovers_cubic() {
    let coef = [0.5, -1.0, 0.25, 0.1];
    let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.5).collect();
    let y: Vec<f64> = x.iter().map(|&v| polyval(&coef, v)).collect();
    let fit = polynomial_least_squares(&x, &y, 3).unwrap();
    for (got, want) in fit.iter().zip(coef) {
      assert_abs_diff_eq!(*got, want, epsilon = 1e-8);
    }
  }

  #[test]
  fn underdetermined_polynomial_is_minimum_norm() {
    let fit = polynomial_least_squares(&[1.0, 2.0], &[1.0, 2.0], 3).unwrap();
    assert_eq!(fit.len(), 4);
    for (xi, yi) in [(1.0, 1.0), (2.0, 2.0)] {
      assert_abs_diff_eq!(polyval(&fit, xi), yi, epsilon = 1e-8);
    }
  }

  #[test]
  fn feasible_quadratic_is_recovered() {
    let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
    let y: Vec<f64> = x.iter().map(|&v| 0.01 * v * v - 0.1 * v + 0.5).collect();
    let fit = QuadraticFit::fit_constrained(&x, &y).unwrap();
    assert_abs_diff_eq!(fit.a, 0.01, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.b, -0.1, epsilon = 1e-2);
    assert_abs_diff_eq!(fit.c, 0.5, epsilon = 1e-2);
    assert!(fit.mse < 1e-5);
  }

  #[test]
  fn infeasible_optimum_is_projected() {
    let x = [2.0, 3.0, 4.0, 5.0, 6.0];
    let y = [1.0, 2.0, 3.0, 4.0, 5.0];
    let fit = QuadraticFit::fit_constrained(&x, &y).unwrap();
    assert!(fit.c >= 0.0);
    if fit.a > 0.0 {
      assert!(fit.c - fit.b * fit.b / (4.0 * fit.a) >= 0.0);
    }
    assert!(fit.mse.is_finite());
  }

  #[test]
  #[traced_test]
  fn exhausted_iteration_budget_is_flagged_and_logged() {
    let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
    let y: Vec<f64> = x.iter().map(|&v| 0.01 * v * v - 0.1 * v + 0.5).collect();
    let fit = QuadraticFit::fit_constrained_with_max_iters(&x, &y, 1).unwrap();
    assert!(!fit.converged);
    assert!(fit.iterations <= PENALTY_WEIGHTS.len() as u64);
    assert!(fit.a.is_finite() && fit.b.is_finite() && fit.c.is_finite());
    assert!(fit.c >= 0.0);
    assert!(logs_contain("did not converge"));
  }
}
