//! Heston stochastic-volatility process
//!
//! ```text
//! dS = (r − q) S dt + √v S dW₁
//! dv = κ (θ − v) dt + σ √v dW₂,   dW₁ dW₂ = ρ dt
//! ```
//!
//! The state is `(S, v)`. Correlation enters through the lower-triangular
//! root of the 2×2 correlation matrix, so the two factors handed to
//! `evolve` are independent.

use crate::stochastic_process::StochasticProcess;
use qn_core::{ensure, errors::Result, Real, Time};
use qn_math::{Array, Matrix};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// The Heston process.
#[derive(Debug, Clone)]
pub struct HestonProcess {
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    s0: Real,
    v0: Real,
    kappa: Real,
    theta: Real,
    sigma: Real,
    rho: Real,
}

impl HestonProcess {
    /// Build the process. Requires `s0 > 0`, `v0 ≥ 0`, `σ ≥ 0` and
    /// `|ρ| ≤ 1`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        s0: Real,
        v0: Real,
        kappa: Real,
        theta: Real,
        sigma: Real,
        rho: Real,
    ) -> Result<Self> {
        ensure!(s0 > 0.0, "spot must be positive, got {s0}");
        ensure!(v0 >= 0.0, "initial variance must be non-negative, got {v0}");
        ensure!(sigma >= 0.0, "vol of vol must be non-negative, got {sigma}");
        ensure!(rho.abs() <= 1.0, "correlation {rho} outside [-1, 1]");
        Ok(Self {
            risk_free_rate,
            dividend_yield,
            s0,
            v0,
            kappa,
            theta,
            sigma,
            rho,
        })
    }

    /// Initial spot.
    pub fn s0(&self) -> Real {
        self.s0
    }

    /// Initial variance.
    pub fn v0(&self) -> Real {
        self.v0
    }

    /// Mean-reversion speed of the variance.
    pub fn kappa(&self) -> Real {
        self.kappa
    }

    /// Long-run variance.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Volatility of variance.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Spot/variance correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// Risk-free curve.
    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// Dividend-yield curve.
    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// Lower-triangular root of the correlation matrix `[[1, ρ], [ρ, 1]]`.
    pub fn correlation_root(&self) -> Matrix {
        Matrix::from_row_slice(
            2,
            2,
            &[1.0, 0.0, self.rho, (1.0 - self.rho * self.rho).max(0.0).sqrt()],
        )
    }

    fn carry(&self, t1: Time, t2: Time) -> Real {
        self.risk_free_rate.forward_rate(t1, t2) - self.dividend_yield.forward_rate(t1, t2)
    }
}

impl StochasticProcess for HestonProcess {
    fn size(&self) -> usize {
        2
    }

    fn initial_values(&self) -> Array {
        Array::from_vec(vec![self.s0, self.v0])
    }

    fn drift(&self, t: Time, x: &Array) -> Array {
        let v = x[1].max(0.0);
        Array::from_vec(vec![
            self.carry(t, t) * x[0],
            self.kappa * (self.theta - v),
        ])
    }

    fn diffusion(&self, _t: Time, x: &Array) -> Matrix {
        let vol = x[1].max(0.0).sqrt();
        let root = self.correlation_root();
        let scale = [vol * x[0], self.sigma * vol];
        Matrix::from_fn(2, 2, |i, j| scale[i] * root[(i, j)])
    }

    /// Full-truncation Euler step: the spot moves log-normally with the
    /// truncated variance, the variance itself may go negative but only
    /// `max(v, 0)` feeds drift and diffusion.
    fn evolve(&self, t: Time, x: &Array, dt: Time, dw: &Array) -> Array {
        debug_assert_eq!(dw.len(), 2);
        let v = x[1].max(0.0);
        let sqrt_vdt = (v * dt).sqrt();
        let root = self.correlation_root();
        let z1 = dw[0];
        let z2 = root[(1, 0)] * dw[0] + root[(1, 1)] * dw[1];
        let s = x[0] * ((self.carry(t, t + dt) - 0.5 * v) * dt + sqrt_vdt * z1).exp();
        let v_new = x[1] + self.kappa * (self.theta - v) * dt + self.sigma * sqrt_vdt * z2;
        Array::from_vec(vec![s, v_new])
    }
}
