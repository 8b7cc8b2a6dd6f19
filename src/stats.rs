//! # Stats
//!
//! $$
//! \hat\theta=\arg\max_\theta \sum_{i=1}^n \log f(x_i\mid\theta)
//! $$
//!
pub mod correlation;
pub mod distr;
pub mod gaussian_kde;
pub mod regression;
