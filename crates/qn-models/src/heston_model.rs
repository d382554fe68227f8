//! Heston stochastic-volatility model.
//!
//! ```text
//! dS = (r − q) S dt + √v S dW₁
//! dv = κ (θ − v) dt + σ √v dW₂,   dW₁ dW₂ = ρ dt
//! ```
//!
//! A parameter container: the process is rebuilt from the current
//! parameters on demand, so calibration only touches `[κ, θ, σ, ρ, v0]`.

use crate::calibrated_model::{
    assign_flat, BoundaryConstraint, CalibratedModel, NoConstraint, Parameter, PositiveConstraint,
};
use qn_core::{ensure, errors::Result, Real};
use qn_processes::HestonProcess;
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Heston model with parameters `[κ, θ, σ, ρ, v0]`.
#[derive(Debug, Clone)]
pub struct HestonModel {
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    s0: Real,
    params: Vec<Parameter>,
}

impl HestonModel {
    /// Model with the parameters of `process`.
    pub fn new(process: &HestonProcess) -> Self {
        Self {
            risk_free_rate: Arc::clone(process.risk_free_rate()),
            dividend_yield: Arc::clone(process.dividend_yield()),
            s0: process.s0(),
            params: vec![
                Parameter::new(vec![process.kappa()], NoConstraint),
                Parameter::new(vec![process.theta()], PositiveConstraint),
                Parameter::new(vec![process.sigma()], PositiveConstraint),
                Parameter::new(vec![process.rho()], BoundaryConstraint::new(-1.0, 1.0)),
                Parameter::new(vec![process.v0()], PositiveConstraint),
            ],
        }
    }

    /// The process under the current parameters.
    pub fn process(&self) -> Result<HestonProcess> {
        HestonProcess::new(
            Arc::clone(&self.risk_free_rate),
            Arc::clone(&self.dividend_yield),
            self.s0,
            self.v0(),
            self.kappa(),
            self.theta(),
            self.sigma(),
            self.rho(),
        )
    }

    /// Initial spot.
    pub fn s0(&self) -> Real {
        self.s0
    }

    /// Variance mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.params[0].value()
    }

    /// Long-run variance.
    pub fn theta(&self) -> Real {
        self.params[1].value()
    }

    /// Volatility of variance.
    pub fn sigma(&self) -> Real {
        self.params[2].value()
    }

    /// Spot-variance correlation.
    pub fn rho(&self) -> Real {
        self.params[3].value()
    }

    /// Initial variance.
    pub fn v0(&self) -> Real {
        self.params[4].value()
    }

    /// Feller condition `2κθ > σ²`: the variance stays strictly positive.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa() * self.theta() > self.sigma() * self.sigma()
    }
}

impl CalibratedModel for HestonModel {
    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        ensure!(values.len() == 5, "Heston takes [κ, θ, σ, ρ, v0], got {} values", values.len());
        assign_flat(&mut self.params, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_termstructures::FlatForward;

    fn model() -> HestonModel {
        let process = HestonProcess::new(
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            100.0,
            0.04,
            1.5,
            0.04,
            0.3,
            -0.7,
        )
        .unwrap();
        HestonModel::new(&process)
    }

    #[test]
    fn parameters_mirror_the_process() {
        let m = model();
        assert_eq!(m.flat_params(), vec![1.5, 0.04, 0.3, -0.7, 0.04]);
        assert_eq!(m.s0(), 100.0);
        // 2 · 1.5 · 0.04 = 0.12 > 0.09
        assert!(m.feller_satisfied());
    }

    #[test]
    fn recalibrated_parameters_flow_into_the_process() {
        let mut m = model();
        m.set_params(&[0.5, 0.05, 0.4, -0.8, 0.06]).unwrap();
        assert!(!m.feller_satisfied());
        let p = m.process().unwrap();
        assert_abs_diff_eq!(p.kappa(), 0.5);
        assert_abs_diff_eq!(p.v0(), 0.06);
        assert_abs_diff_eq!(p.rho(), -0.8);

        assert!(m.set_params(&[0.5, 0.05, 0.4, -1.2, 0.06]).is_err());
        assert_abs_diff_eq!(m.rho(), -0.8);
    }
}
