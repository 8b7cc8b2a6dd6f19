//! # Contours
//!
//! Environmental contours for a return period $T_r$ (years) and sea-state
//! duration $T_{ss}$ (seconds):
//!
//! $$
//! p_e=\frac{T_{ss}}{3600\cdot 24\cdot 365\, T_r}
//! $$
//!
//! [`environmental_contours`] fits every model the requested methods need
//! once, builds the iso-probability circle once and evaluates each method
//! on it.
//!
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use tracing::debug;

use crate::copulas::bivariate::clayton::Clayton;
use crate::copulas::bivariate::gaussian::Gaussian;
use crate::copulas::bivariate::gumbel::Gumbel;
use crate::copulas::bivariate::Bivariate;
use crate::copulas::bivariate::CopulaType;
use crate::copulas::marginals::BoundedLogNormal;
use crate::copulas::marginals::Marginal;
use crate::copulas::parameters::CopulaBinning;
use crate::copulas::parameters::CopulaParameters;
use crate::copulas::parameters::NonparametricCopulaParameters;
use crate::copulas::rosenblatt::rosenblatt_component_2;
use crate::error::ContourError;
use crate::error::Result;
use crate::samples::SampleSeries;
use crate::stats::correlation::kendall_tau;

pub mod bivariate_kde;
pub mod iso_probability;
pub mod marching_squares;
pub mod pca;

use bivariate_kde::bivariate_kde_contour;
use bivariate_kde::BivariateKdeFit;
use bivariate_kde::KdeGrid;
use iso_probability::IsoProbability;
use pca::PcaFit;

/// Contour construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContourMethod {
  Pca,
  Gaussian,
  Gumbel,
  Clayton,
  Rosenblatt,
  NonparametricGaussian,
  NonparametricClayton,
  NonparametricGumbel,
  BivariateKde,
  BivariateKdeLog,
}

/// Which fitted model a method is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
  Parametric,
  NonParametric,
  Kde,
}

impl ContourMethod {
  pub const ALL: [ContourMethod; 10] = [
    ContourMethod::Pca,
    ContourMethod::Gaussian,
    ContourMethod::Gumbel,
    ContourMethod::Clayton,
    ContourMethod::Rosenblatt,
    ContourMethod::NonparametricGaussian,
    ContourMethod::NonparametricClayton,
    ContourMethod::NonparametricGumbel,
    ContourMethod::BivariateKde,
    ContourMethod::BivariateKdeLog,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      ContourMethod::Pca => "PCA",
      ContourMethod::Gaussian => "gaussian",
      ContourMethod::Gumbel => "gumbel",
      ContourMethod::Clayton => "clayton",
      ContourMethod::Rosenblatt => "rosenblatt",
      ContourMethod::NonparametricGaussian => "nonparametric_gaussian",
      ContourMethod::NonparametricClayton => "nonparametric_clayton",
      ContourMethod::NonparametricGumbel => "nonparametric_gumbel",
      ContourMethod::BivariateKde => "bivariate_KDE",
      ContourMethod::BivariateKdeLog => "bivariate_KDE_log",
    }
  }

  pub fn class(&self) -> MethodClass {
    match self {
      ContourMethod::Pca
      | ContourMethod::Gaussian
      | ContourMethod::Gumbel
      | ContourMethod::Clayton
      | ContourMethod::Rosenblatt => MethodClass::Parametric,
      ContourMethod::NonparametricGaussian
      | ContourMethod::NonparametricClayton
      | ContourMethod::NonparametricGumbel => MethodClass::NonParametric,
      ContourMethod::BivariateKde | ContourMethod::BivariateKdeLog => MethodClass::Kde,
    }
  }

  /// Parametric methods evaluated from [`CopulaParameters`] (all but PCA).
  fn uses_copula_parameters(&self) -> bool {
    self.class() == MethodClass::Parametric && *self != ContourMethod::Pca
  }

  fn copula_type(&self) -> Option<CopulaType> {
    match self {
      ContourMethod::Gaussian | ContourMethod::NonparametricGaussian => Some(CopulaType::Gaussian),
      ContourMethod::Clayton | ContourMethod::NonparametricClayton => Some(CopulaType::Clayton),
      ContourMethod::Gumbel | ContourMethod::NonparametricGumbel => Some(CopulaType::Gumbel),
      _ => None,
    }
  }
}

impl fmt::Display for ContourMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ContourMethod {
  type Err = ContourError;

  fn from_str(s: &str) -> Result<Self> {
    ContourMethod::ALL
      .iter()
      .copied()
      .find(|m| m.name() == s)
      .ok_or_else(|| ContourError::InvalidMethod(format!("unknown method `{s}`")))
  }
}

/// Parses method names, rejecting unknown and repeated ones.
pub fn parse_methods<S: AsRef<str>>(names: &[S]) -> Result<Vec<ContourMethod>> {
  let methods = names
    .iter()
    .map(|n| n.as_ref().parse())
    .collect::<Result<Vec<ContourMethod>>>()?;
  check_methods(&methods)?;
  Ok(methods)
}

fn check_methods(methods: &[ContourMethod]) -> Result<()> {
  if methods.is_empty() {
    return Err(ContourError::InvalidMethod("no contour method requested".into()));
  }
  let mut seen = BTreeSet::new();
  for m in methods {
    if !seen.insert(*m) {
      return Err(ContourError::InvalidMethod(format!("method `{m}` requested twice")));
    }
  }
  Ok(())
}

/// Options of [`environmental_contours`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOptions {
  /// Adaptive x1 binning of the conditional log-normal fits.
  pub binning: CopulaBinning,
  /// Points on the iso-probability circle; also the grid size of the
  /// non-parametric marginals.
  pub nb_steps: usize,
  /// KDE bandwidths `[x1, x2]`, required by the bivariate KDE methods.
  pub bandwidth: Option<[f64; 2]>,
  /// Points per axis of the bivariate KDE grid.
  pub kde_grid_size: usize,
  /// Upper bound of the x1 grids, twice the sample maximum by default.
  pub max_x1: Option<f64>,
  /// Upper bound of the x2 grids, twice the sample maximum by default.
  pub max_x2: Option<f64>,
  /// Precomputed PCA fit reused instead of fitting the sample.
  pub pca: Option<PcaFit>,
  /// Attach per-method diagnostics to the result.
  pub return_fit: bool,
  pub pca_bin_size: usize,
}

impl Default for ContourOptions {
  fn default() -> Self {
    Self {
      binning: CopulaBinning::default(),
      nb_steps: 1000,
      bandwidth: None,
      kde_grid_size: 100,
      max_x1: None,
      max_x2: None,
      pca: None,
      return_fit: false,
      pca_bin_size: 250,
    }
  }
}

impl ContourOptions {
  pub fn validate(&self) -> Result<()> {
    self.binning.validate()?;
    if self.nb_steps == 0 {
      return Err(ContourError::invalid_parameter(
        "nb_steps",
        "must be at least 1",
      ));
    }
    if self.kde_grid_size < 2 {
      return Err(ContourError::invalid_parameter(
        "kde_grid_size",
        format!("must be at least 2, got {}", self.kde_grid_size),
      ));
    }
    if self.pca_bin_size == 0 {
      return Err(ContourError::invalid_parameter(
        "pca_bin_size",
        "must be at least 1",
      ));
    }
    for (name, max) in [("max_x1", self.max_x1), ("max_x2", self.max_x2)] {
      if let Some(m) = max {
        if !(m.is_finite() && m > 0.0) {
          return Err(ContourError::invalid_parameter(
            name,
            format!("must be finite and positive, got {m}"),
          ));
        }
      }
    }
    if let Some(bw) = self.bandwidth {
      if bw.iter().any(|b| !(b.is_finite() && *b > 0.0)) {
        return Err(ContourError::invalid_parameter(
          "bandwidth",
          format!("must be finite and positive, got {bw:?}"),
        ));
      }
    }
    Ok(())
  }

  fn kde_grid(&self, method: ContourMethod) -> Result<KdeGrid> {
    let bandwidth = self.bandwidth.ok_or(ContourError::MissingParameter {
      method: method.name(),
      name: "bandwidth",
    })?;
    Ok(KdeGrid {
      bandwidth,
      grid_size: self.kde_grid_size,
      max_x1: self.max_x1,
      max_x2: self.max_x2,
      log_transform: method == ContourMethod::BivariateKdeLog,
    })
  }
}

/// Dependence fitted for one copula method.
#[derive(Debug, Clone, PartialEq)]
pub struct CopulaDiagnostics {
  pub copula: CopulaType,
  pub tau: f64,
  /// `rho` for the Gaussian copula, `theta` otherwise.
  pub theta: f64,
  /// x2 quantile levels, when the copula inverts in closed form.
  pub z2: Option<Array1<f64>>,
}

/// Per-method fit returned when [`ContourOptions::return_fit`] is set.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodFit {
  Pca {
    fit: PcaFit,
    component_1: Array1<f64>,
    component_2: Array1<f64>,
  },
  Copula {
    diagnostics: CopulaDiagnostics,
    parameters: CopulaParameters,
  },
  Rosenblatt {
    parameters: CopulaParameters,
    lambda_cond: Array1<f64>,
    sigma_cond: Array1<f64>,
  },
  Nonparametric {
    diagnostics: CopulaDiagnostics,
    parameters: NonparametricCopulaParameters,
  },
  BivariateKde(BivariateKdeFit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodContour {
  pub x1: Array1<f64>,
  pub x2: Array1<f64>,
  pub fit: Option<MethodFit>,
}

/// Contours of every requested method on one iso-probability circle.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourResult {
  pub iso: IsoProbability,
  pub contours: BTreeMap<ContourMethod, MethodContour>,
}

impl ContourResult {
  pub fn exceedance_probability(&self) -> f64 {
    self.iso.exceedance_probability
  }

  pub fn get(&self, method: ContourMethod) -> Option<&MethodContour> {
    self.contours.get(&method)
  }

  /// `"{method}_x1"` / `"{method}_x2"` view of the contours.
  pub fn named_arrays(&self) -> BTreeMap<String, Array1<f64>> {
    let mut out = BTreeMap::new();
    for (method, contour) in &self.contours {
      out.insert(format!("{method}_x1"), contour.x1.clone());
      out.insert(format!("{method}_x2"), contour.x2.clone());
    }
    out
  }
}

/// Environmental contours of `samples` for one return period.
///
/// `sea_state_duration` is in seconds and `return_period` in years.
pub fn environmental_contours(
  samples: &SampleSeries,
  sea_state_duration: f64,
  return_period: f64,
  methods: &[ContourMethod],
  options: &ContourOptions,
) -> Result<ContourResult> {
  let mut results = environmental_contours_for_return_periods(
    samples,
    sea_state_duration,
    &[return_period],
    methods,
    options,
  )?;
  results
    .pop()
    .ok_or_else(|| ContourError::numerical("no contour evaluated"))
}

/// Environmental contours for several return periods, fitting the models
/// once and evaluating them on each period's circle.
pub fn environmental_contours_for_return_periods(
  samples: &SampleSeries,
  sea_state_duration: f64,
  return_periods: &[f64],
  methods: &[ContourMethod],
  options: &ContourOptions,
) -> Result<Vec<ContourResult>> {
  check_methods(methods)?;
  options.validate()?;
  if return_periods.is_empty() {
    return Err(ContourError::invalid_parameter(
      "return_period",
      "at least one return period is required",
    ));
  }
  let kde_grids = methods
    .iter()
    .filter(|m| m.class() == MethodClass::Kde)
    .map(|&m| options.kde_grid(m).map(|g| (m, g)))
    .collect::<Result<BTreeMap<_, _>>>()?;

  let circles = return_periods
    .iter()
    .map(|&t| IsoProbability::compute(sea_state_duration, t, options.nb_steps))
    .collect::<Result<Vec<_>>>()?;

  let models = FittedModels::fit(samples, methods, options)?;

  circles
    .into_iter()
    .map(|iso| {
      let mut contours = BTreeMap::new();
      for &method in methods {
        let contour = match method.class() {
          MethodClass::Kde => {
            let grid = kde_grids
              .get(&method)
              .ok_or_else(|| ContourError::numerical(format!("no KDE grid for `{method}`")))?;
            let out = bivariate_kde_contour(samples, &iso, grid)?;
            MethodContour {
              x1: out.x1,
              x2: out.x2,
              fit: options.return_fit.then_some(MethodFit::BivariateKde(out.fit)),
            }
          }
          _ => models.evaluate(method, &iso, samples, options.return_fit)?,
        };
        contours.insert(method, contour);
      }
      Ok(ContourResult { iso, contours })
    })
    .collect()
}

/// Models shared by all methods of one request.
struct FittedModels {
  tau: Option<f64>,
  pca: Option<PcaFit>,
  parametric: Option<CopulaParameters>,
  nonparametric: Option<NonparametricCopulaParameters>,
}

impl FittedModels {
  fn fit(samples: &SampleSeries, methods: &[ContourMethod], options: &ContourOptions) -> Result<Self> {
    let pca = if methods.contains(&ContourMethod::Pca) {
      match &options.pca {
        Some(fit) => Some(fit.clone()),
        None => Some(PcaFit::fit(samples, options.pca_bin_size)?),
      }
    } else {
      None
    };

    let parametric = if methods.iter().any(ContourMethod::uses_copula_parameters) {
      Some(CopulaParameters::fit(samples, &options.binning)?)
    } else {
      None
    };

    let nonparametric = if methods.iter().any(|m| m.class() == MethodClass::NonParametric) {
      Some(NonparametricCopulaParameters::fit(
        samples,
        options.max_x1,
        options.max_x2,
        options.nb_steps,
      )?)
    } else {
      None
    };

    let tau = if methods.iter().any(|m| m.copula_type().is_some()) {
      let tau = kendall_tau(samples.x2(), samples.x1())?;
      debug!(tau, "kendall tau of the sample");
      Some(tau)
    } else {
      None
    };

    Ok(Self {
      tau,
      pca,
      parametric,
      nonparametric,
    })
  }

  fn evaluate(
    &self,
    method: ContourMethod,
    iso: &IsoProbability,
    samples: &SampleSeries,
    return_fit: bool,
  ) -> Result<MethodContour> {
    match method {
      ContourMethod::Pca => {
        let fit = self.pca.as_ref().ok_or_else(|| missing_model(method))?;
        let out = fit.contour(iso)?;
        Ok(MethodContour {
          x1: out.x1,
          x2: out.x2,
          fit: return_fit.then(|| MethodFit::Pca {
            fit: fit.clone(),
            component_1: out.component_1,
            component_2: out.component_2,
          }),
        })
      }
      ContourMethod::Rosenblatt => {
        let params = self.parametric.as_ref().ok_or_else(|| missing_model(method))?;
        let x1 = params.dist_1.ppf_array(&iso.x_quantile)?;
        let out = rosenblatt_component_2(&x1, &iso.y_quantile, params);
        Ok(MethodContour {
          x1,
          x2: out.x2,
          fit: return_fit.then(|| MethodFit::Rosenblatt {
            parameters: params.clone(),
            lambda_cond: out.lambda_cond,
            sigma_cond: out.sigma_cond,
          }),
        })
      }
      ContourMethod::Gaussian | ContourMethod::Clayton | ContourMethod::Gumbel => {
        let params = self.parametric.as_ref().ok_or_else(|| missing_model(method))?;
        let copula = self.copula(method)?;
        let x1 = params.dist_1.ppf_array(&iso.x_quantile)?;
        let marginal = BoundedLogNormal::from_sample(params.dist_2, samples.x2());
        let x2 = copula.component_2(iso, &marginal)?;
        Ok(MethodContour {
          x1,
          x2,
          fit: return_fit.then(|| MethodFit::Copula {
            diagnostics: diagnostics(copula.as_ref(), iso),
            parameters: params.clone(),
          }),
        })
      }
      ContourMethod::NonparametricGaussian
      | ContourMethod::NonparametricClayton
      | ContourMethod::NonparametricGumbel => {
        let params = self.nonparametric.as_ref().ok_or_else(|| missing_model(method))?;
        let copula = self.copula(method)?;
        let x1 = params.dist_1.ppf_array(&iso.x_quantile)?;
        let x2 = copula.component_2(iso, &params.dist_2)?;
        Ok(MethodContour {
          x1,
          x2,
          fit: return_fit.then(|| MethodFit::Nonparametric {
            diagnostics: diagnostics(copula.as_ref(), iso),
            parameters: params.clone(),
          }),
        })
      }
      ContourMethod::BivariateKde | ContourMethod::BivariateKdeLog => Err(missing_model(method)),
    }
  }

  fn copula(&self, method: ContourMethod) -> Result<Box<dyn Bivariate>> {
    let tau = self.tau.ok_or_else(|| missing_model(method))?;
    let copula: Box<dyn Bivariate> = match method.copula_type() {
      Some(CopulaType::Gaussian) => Box::new(Gaussian::from_tau(tau)?),
      Some(CopulaType::Clayton) => Box::new(Clayton::from_tau(tau)?),
      Some(CopulaType::Gumbel) => Box::new(Gumbel::from_tau(tau)?),
      None => return Err(missing_model(method)),
    };
    debug!(%method, tau, theta = copula.theta(), "copula dependence");
    Ok(copula)
  }
}

fn diagnostics(copula: &dyn Bivariate, iso: &IsoProbability) -> CopulaDiagnostics {
  CopulaDiagnostics {
    copula: copula.r#type(),
    tau: copula.tau(),
    theta: copula.theta(),
    z2: copula.conditional_quantiles(iso),
  }
}

fn missing_model(method: ContourMethod) -> ContourError {
  ContourError::numerical(format!("no fitted model available for `{method}`"))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;

  use super::*;
  use crate::test_utils::synthetic_sea_states;
  use crate::test_utils::ten_point_series;

  fn options(nb_steps: usize) -> ContourOptions {
    ContourOptions {
      nb_steps,
      ..ContourOptions::default()
    }
  }

  #[test]
  fn method_names_round_trip() {
    for m in ContourMethod::ALL {
      assert_eq!(m.name().parse::<ContourMethod>().unwrap(), m);
    }
    assert_eq!(ContourMethod::BivariateKdeLog.to_string(), "bivariate_KDE_log");
  }

  #[test]
  fn unknown_and_duplicate_methods_are_rejected() {
    assert!(matches!(
      parse_methods(&["gaussian", "frank"]).unwrap_err(),
      ContourError::InvalidMethod(_)
    ));
    assert!(matches!(
      parse_methods(&["PCA", "gaussian", "PCA"]).unwrap_err(),
      ContourError::InvalidMethod(_)
    ));
    assert_eq!(
      parse_methods(&["PCA", "bivariate_KDE"]).unwrap(),
      vec![ContourMethod::Pca, ContourMethod::BivariateKde]
    );
  }

  #[test]
  fn gaussian_on_ten_points() -> anyhow::Result<()> {
    let samples = ten_point_series();
    let opts = ContourOptions {
      nb_steps: 36,
      binning: CopulaBinning::new(2, 1.0, 0.25),
      return_fit: true,
      ..ContourOptions::default()
    };
    let result = environmental_contours(&samples, 3600.0, 1.0, &[ContourMethod::Gaussian], &opts)?;

    let names = result.named_arrays();
    assert_eq!(names["gaussian_x1"].len(), 36);
    assert_eq!(names["gaussian_x2"].len(), 36);
    assert!(names["gaussian_x1"].iter().all(|&v| v >= 0.0));

    match &result.get(ContourMethod::Gaussian).unwrap().fit {
      Some(MethodFit::Copula { diagnostics, .. }) => {
        assert_abs_diff_eq!(diagnostics.tau, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(diagnostics.theta, 1.0, epsilon = 1e-12);
      }
      other => panic!("unexpected fit {other:?}"),
    }
    Ok(())
  }

  #[test]
  fn default_binning_is_too_coarse_for_ten_points() {
    let err = environmental_contours(
      &ten_point_series(),
      3600.0,
      1.0,
      &[ContourMethod::Gaussian],
      &options(36),
    )
    .unwrap_err();
    assert!(matches!(err, ContourError::InsufficientData(_)));
  }

  #[test]
  fn methods_share_one_circle() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(1500, 21);
    let opts = ContourOptions {
      return_fit: true,
      ..options(90)
    };
    let result = environmental_contours(
      &samples,
      3600.0,
      50.0,
      &[ContourMethod::Gaussian, ContourMethod::Clayton],
      &opts,
    )?;

    assert_relative_eq!(result.exceedance_probability(), 1.0 / (8760.0 * 50.0), max_relative = 1e-12);
    let mut taus = Vec::new();
    for method in [ContourMethod::Gaussian, ContourMethod::Clayton] {
      let contour = result.get(method).unwrap();
      assert_eq!(contour.x1.len(), 90);
      assert!(contour.x2.iter().all(|v| v.is_finite() && *v > 0.0));
      match &contour.fit {
        Some(MethodFit::Copula { diagnostics, .. }) => taus.push(diagnostics.tau),
        other => panic!("unexpected fit {other:?}"),
      }
    }
    assert_eq!(taus[0], taus[1]);
    Ok(())
  }

  #[test]
  fn kde_without_bandwidth_fails_before_fitting() {
    // Non-positive samples would fail the parametric fit if it ran first.
    let samples = SampleSeries::from_slices(&[1.0, -2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let err = environmental_contours(
      &samples,
      3600.0,
      1.0,
      &[ContourMethod::Gaussian, ContourMethod::BivariateKde],
      &options(36),
    )
    .unwrap_err();
    assert_eq!(
      err,
      ContourError::MissingParameter {
        method: "bivariate_KDE",
        name: "bandwidth",
      }
    );
  }

  #[test]
  fn repeated_calls_are_identical() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(800, 4);
    let methods = [
      ContourMethod::Pca,
      ContourMethod::Gaussian,
      ContourMethod::Gumbel,
      ContourMethod::Rosenblatt,
    ];
    let a = environmental_contours(&samples, 3600.0, 100.0, &methods, &options(60))?;
    let b = environmental_contours(&samples, 3600.0, 100.0, &methods, &options(60))?;

    let (a, b) = (a.named_arrays(), b.named_arrays());
    assert_eq!(a.len(), 8);
    for (key, xs) in &a {
      let bits = |v: &Array1<f64>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
      assert_eq!(bits(xs), bits(&b[key]), "{key}");
    }
    Ok(())
  }

  #[test]
  fn nonparametric_methods_stay_on_their_grids() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(600, 8);
    let methods = [
      ContourMethod::NonparametricGaussian,
      ContourMethod::NonparametricClayton,
      ContourMethod::NonparametricGumbel,
    ];
    let result = environmental_contours(&samples, 3600.0, 10.0, &methods, &options(120))?;

    let max_x1 = 2.0 * samples.x1().iter().copied().fold(f64::MIN, f64::max);
    for method in methods {
      let contour = result.get(method).unwrap();
      assert_eq!(contour.x1.len(), 120);
      assert!(contour.x1.iter().all(|&v| (0.0..=max_x1).contains(&v)));
      assert!(contour.x2.iter().all(|v| v.is_finite()));
    }
    Ok(())
  }

  #[test]
  fn supplied_pca_fit_is_reused() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(400, 2);
    let fit = PcaFit::fit(&samples, 50)?;
    let opts = ContourOptions {
      pca: Some(fit.clone()),
      return_fit: true,
      ..options(40)
    };
    // A different sample: the supplied fit must win.
    let other = synthetic_sea_states(400, 3);
    let result = environmental_contours(&other, 3600.0, 100.0, &[ContourMethod::Pca], &opts)?;
    match &result.get(ContourMethod::Pca).unwrap().fit {
      Some(MethodFit::Pca { fit: used, .. }) => assert_eq!(used, &fit),
      other => panic!("unexpected fit {other:?}"),
    }
    Ok(())
  }

  #[test]
  fn fit_is_omitted_by_default() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(400, 6);
    let result = environmental_contours(&samples, 3600.0, 100.0, &[ContourMethod::Pca], &options(20))?;
    assert!(result.get(ContourMethod::Pca).unwrap().fit.is_none());
    Ok(())
  }

  #[test]
  fn longer_return_period_widens_the_contour() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(1500, 13);
    let results = environmental_contours_for_return_periods(
      &samples,
      3600.0,
      &[1.0, 100.0],
      &[ContourMethod::Gaussian],
      &options(72),
    )?;
    assert_eq!(results.len(), 2);
    assert!(results[1].iso.radius > results[0].iso.radius);

    let peak = |r: &ContourResult| {
      r.get(ContourMethod::Gaussian)
        .unwrap()
        .x1
        .iter()
        .copied()
        .fold(f64::MIN, f64::max)
    };
    assert!(peak(&results[1]) > peak(&results[0]));
    Ok(())
  }

  #[test]
  fn kde_methods_run_with_bandwidth() -> anyhow::Result<()> {
    let samples = synthetic_sea_states(300, 17);
    let opts = ContourOptions {
      bandwidth: Some([0.3, 0.6]),
      return_fit: true,
      ..options(16)
    };
    let result = environmental_contours(&samples, 3600.0, 1.0, &[ContourMethod::BivariateKde], &opts)?;
    let contour = result.get(ContourMethod::BivariateKde).unwrap();
    assert!(!contour.x1.is_empty());
    assert!(matches!(contour.fit, Some(MethodFit::BivariateKde(_))));
    Ok(())
  }

  #[test]
  fn invalid_options_are_rejected() {
    let samples = synthetic_sea_states(100, 1);
    let opts = ContourOptions {
      nb_steps: 0,
      ..ContourOptions::default()
    };
    let err = environmental_contours(&samples, 3600.0, 1.0, &[ContourMethod::Pca], &opts).unwrap_err();
    assert!(matches!(err, ContourError::InvalidParameter { name: "nb_steps", .. }));

    let err = environmental_contours(&samples, 3600.0, 1.0, &[], &ContourOptions::default()).unwrap_err();
    assert!(matches!(err, ContourError::InvalidMethod(_)));
  }
}
