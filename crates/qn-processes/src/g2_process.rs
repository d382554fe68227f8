//! G2++ two-factor Gaussian process.
//!
//! ```text
//! dx = −a x dt + σ dW₁
//! dy = −b y dt + η dW₂,   dW₁ dW₂ = ρ dt
//! r(t) = x(t) + y(t) + φ(t)
//! ```
//!
//! Both factors start at zero; `φ` is fitted to the yield curve in closed
//! form.

use crate::ornstein_uhlenbeck_process::OrnsteinUhlenbeckProcess;
use crate::stochastic_process::StochasticProcess;
use qn_core::{ensure, errors::Result, Rate, Real, Time};
use qn_math::{Array, Matrix};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// The G2++ state process `(x, y)`.
#[derive(Debug, Clone)]
pub struct G2Process {
    term_structure: Arc<dyn YieldTermStructure>,
    a: Real,
    sigma: Real,
    b: Real,
    eta: Real,
    rho: Real,
}

impl G2Process {
    /// Build the process; speeds and volatilities must be positive and
    /// `|ρ| ≤ 1`.
    pub fn new(
        term_structure: Arc<dyn YieldTermStructure>,
        a: Real,
        sigma: Real,
        b: Real,
        eta: Real,
        rho: Real,
    ) -> Result<Self> {
        ensure!(a > 0.0 && b > 0.0, "mean-reversion speeds must be positive");
        ensure!(sigma > 0.0 && eta > 0.0, "volatilities must be positive");
        ensure!(rho.abs() <= 1.0, "correlation {rho} outside [-1, 1]");
        Ok(Self {
            term_structure,
            a,
            sigma,
            b,
            eta,
            rho,
        })
    }

    /// Speed of the first factor.
    pub fn a(&self) -> Real {
        self.a
    }

    /// Volatility of the first factor.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Speed of the second factor.
    pub fn b(&self) -> Real {
        self.b
    }

    /// Volatility of the second factor.
    pub fn eta(&self) -> Real {
        self.eta
    }

    /// Factor correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// The fitted curve.
    pub fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.term_structure
    }

    /// Marginal process of `x`.
    pub fn x_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess::new(self.a, self.sigma, 0.0, 0.0)
    }

    /// Marginal process of `y`.
    pub fn y_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess::new(self.b, self.eta, 0.0, 0.0)
    }

    /// Deterministic shift `φ(t)` reproducing the initial curve.
    pub fn phi(&self, t: Time) -> Rate {
        let f = self.term_structure.instantaneous_forward(t);
        let ea = -(-self.a * t).exp_m1();
        let eb = -(-self.b * t).exp_m1();
        let tx = self.sigma * ea / self.a;
        let ty = self.eta * eb / self.b;
        f + 0.5 * tx * tx + 0.5 * ty * ty + self.rho * tx * ty
    }

    /// Short rate at `(t, x, y)`.
    pub fn short_rate(&self, t: Time, x: Real, y: Real) -> Rate {
        self.phi(t) + x + y
    }
}

impl StochasticProcess for G2Process {
    fn size(&self) -> usize {
        2
    }

    fn initial_values(&self) -> Array {
        Array::zeros(2)
    }

    fn drift(&self, _t: Time, x: &Array) -> Array {
        Array::from_vec(vec![-self.a * x[0], -self.b * x[1]])
    }

    fn diffusion(&self, _t: Time, _x: &Array) -> Matrix {
        let sqrho = (1.0 - self.rho * self.rho).max(0.0).sqrt();
        Matrix::from_row_slice(2, 2, &[self.sigma, 0.0, self.rho * self.eta, sqrho * self.eta])
    }

    fn expectation(&self, _t: Time, x: &Array, dt: Time) -> Array {
        Array::from_vec(vec![
            x[0] * (-self.a * dt).exp(),
            x[1] * (-self.b * dt).exp(),
        ])
    }

    fn covariance(&self, _t: Time, _x: &Array, dt: Time) -> Matrix {
        let sxx = self.sigma * self.sigma * (-(-2.0 * self.a * dt).exp_m1()) / (2.0 * self.a);
        let syy = self.eta * self.eta * (-(-2.0 * self.b * dt).exp_m1()) / (2.0 * self.b);
        let sxy = self.rho * self.sigma * self.eta * (-(-(self.a + self.b) * dt).exp_m1())
            / (self.a + self.b);
        Matrix::from_row_slice(2, 2, &[sxx, sxy, sxy, syy])
    }

    fn std_deviation(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        // 2×2 Cholesky root of the exact covariance
        let c = self.covariance(t, x, dt);
        let l00 = c[(0, 0)].max(0.0).sqrt();
        let l10 = if l00 > 0.0 { c[(1, 0)] / l00 } else { 0.0 };
        let l11 = (c[(1, 1)] - l10 * l10).max(0.0).sqrt();
        Matrix::from_row_slice(2, 2, &[l00, 0.0, l10, l11])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_termstructures::FlatForward;

    fn process() -> G2Process {
        G2Process::new(Arc::new(FlatForward::new(0.04)), 0.1, 0.01, 0.3, 0.008, -0.6).unwrap()
    }

    #[test]
    fn phi_starts_on_the_short_forward() {
        let p = process();
        assert_abs_diff_eq!(p.phi(0.0), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(p.short_rate(0.0, 0.01, -0.005), 0.045, epsilon = 1e-12);
    }

    #[test]
    fn std_deviation_reproduces_covariance() {
        let p = process();
        let x = p.initial_values();
        let s = p.std_deviation(0.0, &x, 0.5);
        let c = p.covariance(0.0, &x, 0.5);
        let ss = &s * &s.transpose();
        assert!(ss.max_abs_diff(&c) < 1e-16);
        assert!(c[(0, 1)] < 0.0);
    }

    #[test]
    fn marginals_match_factors() {
        let p = process();
        assert_eq!(p.x_process().speed(), 0.1);
        assert_eq!(p.y_process().volatility(), 0.008);
        let curve = Arc::new(FlatForward::new(0.0));
        assert!(G2Process::new(curve, 0.1, 0.01, 0.3, 0.008, 2.0).is_err());
    }
}
