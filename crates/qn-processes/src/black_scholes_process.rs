//! Generalized Black-Scholes process.
//!
//! `dS = (r(t) − q(t)) S dt + σ(t, S) S dW`
//!
//! where `r` is the risk-free rate, `q` the continuous dividend yield and
//! `σ` either the local volatility (when one is attached) or the forward
//! Black volatility. The state is the spot level; `evolve` is exact in log
//! space for deterministic rates and volatility.

use crate::stochastic_process::StochasticProcess1D;
use qn_core::{Rate, Real, Time, Volatility};
use qn_termstructures::{BlackVolTermStructure, LocalVolTermStructure, YieldTermStructure};
use std::sync::Arc;

/// Step used to turn Black variances into an instantaneous volatility.
const LOCAL_DT: Time = 1.0e-4;

/// A generalized Black-Scholes stochastic process.
#[derive(Debug, Clone)]
pub struct GeneralizedBlackScholesProcess {
    x0: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    black_vol: Arc<dyn BlackVolTermStructure>,
    local_vol: Option<Arc<dyn LocalVolTermStructure>>,
}

impl GeneralizedBlackScholesProcess {
    /// Process started at spot `x0`.
    pub fn new(
        x0: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        black_vol: Arc<dyn BlackVolTermStructure>,
    ) -> Self {
        Self {
            x0,
            risk_free_rate,
            dividend_yield,
            black_vol,
            local_vol: None,
        }
    }

    /// Attach a local volatility surface, used by `diffusion` and by the
    /// finite-difference operator when local volatility is requested.
    pub fn with_local_vol(mut self, local_vol: Arc<dyn LocalVolTermStructure>) -> Self {
        self.local_vol = Some(local_vol);
        self
    }

    /// The spot price.
    pub fn spot(&self) -> Real {
        self.x0
    }

    /// Risk-free curve.
    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// Dividend-yield curve.
    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// Black volatility surface.
    pub fn black_volatility(&self) -> &Arc<dyn BlackVolTermStructure> {
        &self.black_vol
    }

    /// The attached local volatility surface, if any.
    pub fn local_volatility(&self) -> Option<&Arc<dyn LocalVolTermStructure>> {
        self.local_vol.as_ref()
    }

    /// Instantaneous volatility at `(t, s)`: the local volatility if one is
    /// attached, the forward Black volatility at strike `s` otherwise.
    pub fn local_vol(&self, t: Time, s: Real) -> Volatility {
        match &self.local_vol {
            Some(lv) => lv.local_vol(t, s),
            None => self.black_vol.black_forward_vol(t, t + LOCAL_DT, s),
        }
    }

    /// Forward price `S₀ e^{−q T} / e^{−r T}` for maturity `t`.
    pub fn forward(&self, t: Time) -> Real {
        self.x0 * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t)
    }

    /// Forward drift `r − q` over `[t1, t2]`, continuously compounded.
    pub fn carry(&self, t1: Time, t2: Time) -> Rate {
        self.risk_free_rate.forward_rate(t1, t2) - self.dividend_yield.forward_rate(t1, t2)
    }

    fn step_variance(&self, t: Time, x: Real, dt: Time) -> Real {
        match &self.local_vol {
            Some(lv) => {
                let v = lv.local_vol(t, x);
                v * v * dt
            }
            None => self.black_vol.black_forward_variance(t, t + dt, x).max(0.0),
        }
    }
}

impl StochasticProcess1D for GeneralizedBlackScholesProcess {
    fn x0(&self) -> Real {
        self.x0
    }

    fn drift_1d(&self, t: Time, x: Real) -> Real {
        let r = self.risk_free_rate.instantaneous_forward(t);
        let q = self.dividend_yield.instantaneous_forward(t);
        (r - q) * x
    }

    fn diffusion_1d(&self, t: Time, x: Real) -> Real {
        self.local_vol(t, x) * x
    }

    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        x * (self.carry(t, t + dt) * dt).exp()
    }

    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        // lognormal: Var = E² (e^{v} − 1)
        let var = self.step_variance(t, x, dt);
        self.expectation_1d(t, x, dt) * var.exp_m1().sqrt()
    }

    fn evolve_1d(&self, t: Time, x: Real, dt: Time, dw: Real) -> Real {
        let var = self.step_variance(t, x, dt);
        x * (self.carry(t, t + dt) * dt - 0.5 * var + var.sqrt() * dw).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_termstructures::{BlackConstantVol, FlatForward, LocalConstantVol};

    fn process(vol: Volatility) -> GeneralizedBlackScholesProcess {
        GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            Arc::new(BlackConstantVol::new(vol)),
        )
    }

    #[test]
    fn drift_and_diffusion_on_spot_level() {
        let p = process(0.2);
        assert_abs_diff_eq!(p.drift_1d(0.5, 100.0), 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(p.diffusion_1d(0.5, 100.0), 20.0, epsilon = 1e-8);
        assert_abs_diff_eq!(p.forward(1.0), 100.0 * (0.03_f64).exp(), epsilon = 1e-10);
    }

    #[test]
    fn log_euler_step_is_exact() {
        let p = process(0.2);
        let s = p.evolve_1d(0.0, 100.0, 1.0, 1.0);
        let expected = 100.0 * (0.03 - 0.02 + 0.2_f64).exp();
        assert_abs_diff_eq!(s, expected, epsilon = 1e-10);
        assert_abs_diff_eq!(
            p.expectation_1d(0.0, 100.0, 2.0),
            100.0 * (0.06_f64).exp(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn local_vol_takes_precedence() {
        let p = process(0.2).with_local_vol(Arc::new(LocalConstantVol::new(0.3)));
        assert_abs_diff_eq!(p.local_vol(1.0, 80.0), 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(p.diffusion_1d(1.0, 50.0), 15.0, epsilon = 1e-12);
        assert!(p.local_volatility().is_some());
    }
}
