//! Statistics accumulators.
//!
//! [`Statistics`] accumulates weighted scalar samples; Monte Carlo models
//! read the mean and the error estimate `σ/√N` from it.
//! [`SequenceStatistics`] does the same for vectors of values and also
//! tracks their covariance, as needed when one simulation prices several
//! products at once.

use crate::matrix::Matrix;
use qn_core::{Real, Size};

/// Weighted statistics of scalar samples.
#[derive(Debug, Clone)]
pub struct Statistics {
    count: Size,
    sum_w: Real,
    sum_wx: Real,
    sum_wx2: Real,
    min: Real,
    max: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
            min: Real::INFINITY,
            max: Real::NEG_INFINITY,
        }
    }

    /// Add a sample with weight 1.
    pub fn add(&mut self, x: Real) {
        self.add_weighted(x, 1.0);
    }

    /// Add a weighted sample.
    pub fn add_weighted(&mut self, x: Real, weight: Real) {
        debug_assert!(weight >= 0.0, "negative weight {weight}");
        self.count += 1;
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Number of samples.
    pub fn samples(&self) -> Size {
        self.count
    }

    /// Sum of weights.
    pub fn weight_sum(&self) -> Real {
        self.sum_w
    }

    /// Weighted mean, or `None` without samples.
    pub fn mean(&self) -> Option<Real> {
        (self.sum_w > 0.0).then(|| self.sum_wx / self.sum_w)
    }

    /// Unbiased weighted variance, or `None` with fewer than two samples.
    pub fn variance(&self) -> Option<Real> {
        if self.sum_w == 0.0 || self.count < 2 {
            return None;
        }
        let m = self.sum_wx / self.sum_w;
        let s2 = (self.sum_wx2 / self.sum_w - m * m).max(0.0);
        let n = self.count as Real;
        Some(s2 * n / (n - 1.0))
    }

    /// Standard deviation.
    pub fn standard_deviation(&self) -> Option<Real> {
        self.variance().map(Real::sqrt)
    }

    /// Error estimate of the mean, `σ / √N`.
    pub fn error_estimate(&self) -> Option<Real> {
        self.variance()
            .map(|v| (v / self.count as Real).sqrt())
    }

    /// Smallest sample.
    pub fn min(&self) -> Option<Real> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest sample.
    pub fn max(&self) -> Option<Real> {
        (self.count > 0).then_some(self.max)
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Statistics of vector-valued samples.
#[derive(Debug, Clone)]
pub struct SequenceStatistics {
    stats: Vec<Statistics>,
    sum_w: Real,
    cross: Matrix,
}

impl SequenceStatistics {
    /// Accumulator for samples of length `dimension`.
    pub fn new(dimension: Size) -> Self {
        Self {
            stats: vec![Statistics::new(); dimension],
            sum_w: 0.0,
            cross: Matrix::zeros(dimension, dimension),
        }
    }

    /// Length of each sample.
    pub fn dimension(&self) -> Size {
        self.stats.len()
    }

    /// Number of samples.
    pub fn samples(&self) -> Size {
        self.stats.first().map_or(0, Statistics::samples)
    }

    /// Add a sample vector with weight `weight`.
    pub fn add(&mut self, sample: &[Real], weight: Real) {
        debug_assert_eq!(sample.len(), self.stats.len());
        for (s, &x) in self.stats.iter_mut().zip(sample) {
            s.add_weighted(x, weight);
        }
        self.sum_w += weight;
        let n = sample.len();
        for i in 0..n {
            for j in 0..=i {
                self.cross[(i, j)] += weight * sample[i] * sample[j];
            }
        }
    }

    /// Per-component statistics.
    pub fn component(&self, i: Size) -> &Statistics {
        &self.stats[i]
    }

    /// Per-component means.
    pub fn mean(&self) -> Vec<Real> {
        self.stats.iter().map(|s| s.mean().unwrap_or(0.0)).collect()
    }

    /// Per-component error estimates.
    pub fn error_estimate(&self) -> Vec<Real> {
        self.stats
            .iter()
            .map(|s| s.error_estimate().unwrap_or(0.0))
            .collect()
    }

    /// Unbiased sample covariance matrix.
    pub fn covariance(&self) -> Matrix {
        let n = self.dimension();
        let samples = self.samples() as Real;
        if self.sum_w == 0.0 || samples < 2.0 {
            return Matrix::zeros(n, n);
        }
        let mean = self.mean();
        let correction = samples / (samples - 1.0);
        Matrix::from_fn(n, n, |i, j| {
            let (a, b) = if j <= i { (i, j) } else { (j, i) };
            (self.cross[(a, b)] / self.sum_w - mean[a] * mean[b]) * correction
        })
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        *self = Self::new(self.dimension());
    }
}
