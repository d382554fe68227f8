//! Hull-White short-rate process
//!
//! `dr = (θ(t) − a r) dt + σ dW`
//!
//! with `θ` chosen so that the model reprices the given yield curve. The
//! short rate is `r(t) = x(t) + α(t)` where `x` is an Ornstein-Uhlenbeck
//! process with zero level and
//! `α(t) = f(0, t) + ½ (σ (1 − e^{−a t}) / a)²`, which gives an exact
//! Gaussian transition.

use crate::ornstein_uhlenbeck_process::OrnsteinUhlenbeckProcess;
use crate::stochastic_process::StochasticProcess1D;
use qn_core::{Real, Time, Volatility};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

const FORWARD_SHIFT: Time = 1.0e-4;

/// Hull-White process fitted to a yield curve.
#[derive(Debug, Clone)]
pub struct HullWhiteProcess {
    term_structure: Arc<dyn YieldTermStructure>,
    a: Real,
    sigma: Volatility,
    ou: OrnsteinUhlenbeckProcess,
}

impl HullWhiteProcess {
    /// Process with mean reversion `a` and volatility `sigma` fitted to
    /// `term_structure`.
    pub fn new(term_structure: Arc<dyn YieldTermStructure>, a: Real, sigma: Volatility) -> Self {
        let x0 = term_structure.instantaneous_forward(0.0);
        Self {
            term_structure,
            a,
            sigma,
            ou: OrnsteinUhlenbeckProcess::new(a, sigma, x0, 0.0),
        }
    }

    /// Mean-reversion speed.
    pub fn a(&self) -> Real {
        self.a
    }

    /// Volatility.
    pub fn sigma(&self) -> Volatility {
        self.sigma
    }

    /// The fitted curve.
    pub fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.term_structure
    }

    /// Deterministic shift `α(t)`.
    pub fn alpha(&self, t: Time) -> Real {
        let f = self.term_structure.instantaneous_forward(t);
        let s = if self.a.abs() > f64::EPSILON.sqrt() {
            self.sigma * (-(-self.a * t).exp_m1()) / self.a
        } else {
            self.sigma * t
        };
        f + 0.5 * s * s
    }
}

impl StochasticProcess1D for HullWhiteProcess {
    fn x0(&self) -> Real {
        self.ou.x0()
    }

    fn drift_1d(&self, t: Time, x: Real) -> Real {
        let mut alpha_drift = if self.a.abs() > f64::EPSILON.sqrt() {
            self.sigma * self.sigma / (2.0 * self.a) * (-(-2.0 * self.a * t).exp_m1())
        } else {
            self.sigma * self.sigma * t
        };
        let f = self.term_structure.instantaneous_forward(t);
        let f_up = self.term_structure.instantaneous_forward(t + FORWARD_SHIFT);
        alpha_drift += self.a * f + (f_up - f) / FORWARD_SHIFT;
        self.ou.drift_1d(t, x) + alpha_drift
    }

    fn diffusion_1d(&self, t: Time, x: Real) -> Real {
        self.ou.diffusion_1d(t, x)
    }

    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.ou.expectation_1d(t, x, dt) + self.alpha(t + dt)
            - self.alpha(t) * (-self.a * dt).exp()
    }

    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.ou.std_deviation_1d(t, x, dt)
    }

    fn variance_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.ou.variance_1d(t, x, dt)
    }
}
