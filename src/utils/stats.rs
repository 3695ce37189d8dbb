//! # Numeric Helpers
//!
//! Small statistics routines shared by the partition, chain, and clustering
//! stages. Distribution math is delegated to `statrs`; the wrappers here only
//! pin down the boundary behavior the callers rely on.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{ChiSquared, ContinuousCDF, Discrete, Normal, Poisson};

/// Arithmetic mean. An empty slice yields NaN, which ranking treats as an
/// automatic zero-probability statistic.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. NaN for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Upper-tail probability of a chi-squared distribution.
///
/// Zero or negative degrees of freedom yield NaN so that callers can skip
/// single-entry profiles; a non-positive statistic yields 1.0.
pub fn chi_squared_tail(x: f64, df: f64) -> f64 {
    if !(df > 0.0) {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(df) {
        Ok(dist) => dist.sf(x),
        Err(_) => f64::NAN,
    }
}

/// Natural log of the Poisson pmf at `k`.
///
/// A non-positive rate degenerates to a point mass at zero: ln 1 for k = 0,
/// negative infinity otherwise.
pub fn poisson_ln_pmf(lambda: f64, k: u64) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    match Poisson::new(lambda) {
        Ok(dist) => dist.ln_pmf(k),
        Err(_) => f64::NEG_INFINITY,
    }
}

/// Draw from a normal distribution, falling back to the mean when the
/// standard deviation is not a valid (positive, finite) value.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mean,
    }
}
