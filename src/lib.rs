//! # Sea Contours
//!
//! Environmental contours of extreme sea states from paired observations
//! `(x1, x2)` (e.g. significant wave height and energy period).
//!
//! $$
//! p_e=\frac{T_{ss}}{T_r},\qquad \beta=\Phi^{-1}(1-p_e)
//! $$
//!
//! Every method maps the iso-probability circle of radius `β` in standard
//! normal space back into the physical `(x1, x2)` plane:
//!
//! - `PCA`: principal-component I-FORM (Eckert-Gallup et al. 2016)
//! - `gaussian`, `gumbel`, `clayton`: copulas with parametric marginals
//! - `rosenblatt`: conditional log-normal regression
//! - `nonparametric_*`: the same copulas with KDE marginals
//! - `bivariate_KDE`, `bivariate_KDE_log`: iso-density line of a 2-D KDE
//!
//! ```ignore
//! use sea_contours::contours::{environmental_contours, ContourMethod, ContourOptions};
//! use sea_contours::SampleSeries;
//!
//! let samples = SampleSeries::from_slices(&hs, &te)?;
//! let result = environmental_contours(
//!   &samples,
//!   3600.0,
//!   100.0,
//!   &[ContourMethod::Pca, ContourMethod::Gaussian],
//!   &ContourOptions::default(),
//! )?;
//! ```
pub mod contours;
pub mod copulas;
pub mod error;
pub mod samples;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ContourError;
pub use error::Result;
pub use samples::SampleSeries;
