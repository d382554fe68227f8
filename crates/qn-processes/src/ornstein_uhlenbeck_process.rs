//! Ornstein-Uhlenbeck process `dx = a (θ − x) dt + σ dW`.

use crate::stochastic_process::StochasticProcess1D;
use qn_core::{Real, Time, Volatility};

/// Mean-reverting Gaussian process with exact transition moments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnsteinUhlenbeckProcess {
    speed: Real,
    volatility: Volatility,
    x0: Real,
    level: Real,
}

impl OrnsteinUhlenbeckProcess {
    /// Process with reversion `speed`, `volatility`, initial value `x0` and
    /// long-run `level`.
    pub fn new(speed: Real, volatility: Volatility, x0: Real, level: Real) -> Self {
        Self {
            speed,
            volatility,
            x0,
            level,
        }
    }

    /// Mean-reversion speed `a`.
    pub fn speed(&self) -> Real {
        self.speed
    }

    /// Volatility `σ`.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }

    /// Long-run level `θ`.
    pub fn level(&self) -> Real {
        self.level
    }
}

impl StochasticProcess1D for OrnsteinUhlenbeckProcess {
    fn x0(&self) -> Real {
        self.x0
    }

    fn drift_1d(&self, _t: Time, x: Real) -> Real {
        self.speed * (self.level - x)
    }

    fn diffusion_1d(&self, _t: Time, _x: Real) -> Real {
        self.volatility
    }

    fn expectation_1d(&self, _t: Time, x: Real, dt: Time) -> Real {
        self.level + (x - self.level) * (-self.speed * dt).exp()
    }

    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.variance_1d(t, x, dt).sqrt()
    }

    fn variance_1d(&self, _t: Time, _x: Real, dt: Time) -> Real {
        let a = self.speed;
        let s2 = self.volatility * self.volatility;
        if a.abs() < f64::EPSILON.sqrt() {
            // second-order expansion around a = 0
            s2 * dt * (1.0 - a * dt)
        } else {
            0.5 * s2 / a * (-(-2.0 * a * dt).exp_m1())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_moments() {
        let p = OrnsteinUhlenbeckProcess::new(0.5, 0.1, 0.03, 0.05);
        let e = p.expectation_1d(0.0, 0.03, 2.0);
        assert_abs_diff_eq!(e, 0.05 - 0.02 * (-1.0_f64).exp(), epsilon = 1e-15);
        let v = p.variance_1d(0.0, 0.03, 2.0);
        assert_abs_diff_eq!(v, 0.01 / 1.0 * (1.0 - (-2.0_f64).exp()), epsilon = 1e-15);
    }

    #[test]
    fn zero_speed_is_brownian() {
        let p = OrnsteinUhlenbeckProcess::new(0.0, 0.2, 1.0, 0.0);
        assert_abs_diff_eq!(p.variance_1d(0.0, 1.0, 3.0), 0.12, epsilon = 1e-15);
        assert_abs_diff_eq!(p.expectation_1d(0.0, 1.0, 3.0), 1.0, epsilon = 1e-15);
    }
}
