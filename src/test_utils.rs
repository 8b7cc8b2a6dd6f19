use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;
use rand_distr::Weibull;

use crate::samples::SampleSeries;

/// Seeded synthetic sea states: Weibull wave height and a log-normal
/// energy period whose log-mean and log-std grow with the height.
pub(crate) fn synthetic_sea_states(n: usize, seed: u64) -> SampleSeries {
  let mut rng = StdRng::seed_from_u64(seed);
  let hs_law = Weibull::new(1.8, 1.5).unwrap();
  let noise = Normal::new(0.0, 1.0).unwrap();

  let mut hs = Vec::with_capacity(n);
  let mut te = Vec::with_capacity(n);
  for _ in 0..n {
    let h: f64 = hs_law.sample(&mut rng);
    let h = h.max(0.05);
    let z: f64 = noise.sample(&mut rng);
    hs.push(h);
    te.push((1.7 + 0.12 * h + (0.1 + 0.02 * h) * z).exp());
  }

  SampleSeries::new(Array1::from(hs), Array1::from(te)).unwrap()
}

/// The ten-point series used throughout the scenario tests.
pub(crate) fn ten_point_series() -> SampleSeries {
  let x1: Vec<f64> = (1..=10).map(f64::from).collect();
  let x2 = vec![0.5, 1.0, 1.2, 2.0, 2.5, 3.0, 3.2, 4.0, 4.5, 5.0];
  SampleSeries::from_slices(&x1, &x2).unwrap()
}
