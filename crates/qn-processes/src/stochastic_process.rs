//! `StochasticProcess`, base traits for stochastic processes.
//!
//! A process `dX = μ(t, X) dt + σ(t, X) dW` is described by its drift `μ`,
//! its diffusion matrix `σ` (size × factors) and a discretization giving the
//! conditional expectation and standard deviation over a step `dt`. The
//! default discretization is Euler; processes with a known transition
//! override it.

use qn_core::{Real, Time};
use qn_math::{Array, Matrix};

/// A multi-dimensional stochastic process.
pub trait StochasticProcess: std::fmt::Debug + Send + Sync {
    /// Number of state variables.
    fn size(&self) -> usize;

    /// Number of independent Brownian motions driving the process.
    fn factors(&self) -> usize {
        self.size()
    }

    /// State at `t = 0`.
    fn initial_values(&self) -> Array;

    /// Drift vector `μ(t, x)`.
    fn drift(&self, t: Time, x: &Array) -> Array;

    /// Diffusion matrix `σ(t, x)`, `size × factors`.
    fn diffusion(&self, t: Time, x: &Array) -> Matrix;

    /// `E[X(t + dt) | X(t) = x]`. Euler: `x + μ dt`.
    fn expectation(&self, t: Time, x: &Array, dt: Time) -> Array {
        let mu = self.drift(t, x);
        let mut result = x.clone();
        result.axpy(dt, &mu);
        result
    }

    /// Standard-deviation matrix over `dt`. Euler: `σ √dt`.
    fn std_deviation(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        self.diffusion(t, x).scale(dt.sqrt())
    }

    /// Covariance matrix over `dt`, `S Sᵀ` with `S` the standard deviation.
    fn covariance(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        let s = self.std_deviation(t, x, dt);
        &s * &s.transpose()
    }

    /// Advance the state by `dt` given independent standard normal draws
    /// `dw` (one per factor).
    fn evolve(&self, t: Time, x: &Array, dt: Time, dw: &Array) -> Array {
        debug_assert_eq!(dw.len(), self.factors());
        let s = self.std_deviation(t, x, dt);
        let mut result = self.expectation(t, x, dt);
        result += &s.mul_vec(dw);
        result
    }
}

/// A scalar stochastic process.
///
/// Every implementor gets [`StochasticProcess`] through the blanket impl
/// below, with `size() == factors() == 1`.
pub trait StochasticProcess1D: StochasticProcess {
    /// Initial value.
    fn x0(&self) -> Real;

    /// Drift `μ(t, x)`.
    fn drift_1d(&self, t: Time, x: Real) -> Real;

    /// Diffusion `σ(t, x)`.
    fn diffusion_1d(&self, t: Time, x: Real) -> Real;

    /// `E[X(t + dt) | X(t) = x]`.
    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        x + self.drift_1d(t, x) * dt
    }

    /// Standard deviation of `X(t + dt)` given `X(t) = x`.
    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.diffusion_1d(t, x) * dt.sqrt()
    }

    /// Variance of `X(t + dt)` given `X(t) = x`.
    fn variance_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        let s = self.std_deviation_1d(t, x, dt);
        s * s
    }

    /// Advance `x` by `dt` with the standard normal draw `dw`.
    fn evolve_1d(&self, t: Time, x: Real, dt: Time, dw: Real) -> Real {
        self.expectation_1d(t, x, dt) + self.std_deviation_1d(t, x, dt) * dw
    }
}

impl<T: StochasticProcess1D> StochasticProcess for T {
    fn size(&self) -> usize {
        1
    }

    fn factors(&self) -> usize {
        1
    }

    fn initial_values(&self) -> Array {
        Array::from_vec(vec![self.x0()])
    }

    fn drift(&self, t: Time, x: &Array) -> Array {
        Array::from_vec(vec![self.drift_1d(t, x[0])])
    }

    fn diffusion(&self, t: Time, x: &Array) -> Matrix {
        Matrix::from_element(1, 1, self.diffusion_1d(t, x[0]))
    }

    fn expectation(&self, t: Time, x: &Array, dt: Time) -> Array {
        Array::from_vec(vec![self.expectation_1d(t, x[0], dt)])
    }

    fn std_deviation(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        Matrix::from_element(1, 1, self.std_deviation_1d(t, x[0], dt))
    }

    fn covariance(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        Matrix::from_element(1, 1, self.variance_1d(t, x[0], dt))
    }

    fn evolve(&self, t: Time, x: &Array, dt: Time, dw: &Array) -> Array {
        Array::from_vec(vec![self.evolve_1d(t, x[0], dt, dw[0])])
    }
}
