//! Two-additive-factor Gaussian model G2++.
//!
//! ```text
//! r(t) = x(t) + y(t) + φ(t)
//! dx = −a x dt + σ dW₁,   dy = −b y dt + η dW₂,   dW₁ dW₂ = ρ dt
//! ```
//!
//! `φ` fits the initial curve exactly. Zero bonds and zero-bond options have
//! closed forms; the state `(x, y)` is shared by the lattice and the
//! finite-difference engines.

use crate::calibrated_model::{
    assign_flat, BoundaryConstraint, CalibratedModel, Parameter, PositiveConstraint,
};
use crate::short_rate_model::{b_factor, ShortRateModel, TwoFactorModel};
use qn_core::{ensure, errors::Result, DiscountFactor, OptionType, Rate, Real, Time};
use qn_math::black_formula;
use qn_methods::finite_differences::AffineStateModel;
use qn_processes::{G2Process, OrnsteinUhlenbeckProcess};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// G2++ model with parameters `[a, σ, b, η, ρ]`.
#[derive(Debug, Clone)]
pub struct G2 {
    params: Vec<Parameter>,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl G2 {
    /// Model fitted to `term_structure`.
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
            params: vec![
                Parameter::new(vec![a], PositiveConstraint),
                Parameter::new(vec![sigma], PositiveConstraint),
                Parameter::new(vec![b], PositiveConstraint),
                Parameter::new(vec![eta], PositiveConstraint),
                Parameter::new(vec![rho], BoundaryConstraint::new(-1.0, 1.0)),
            ],
            term_structure,
        })
    }

    /// Speed of `x`.
    pub fn a(&self) -> Real {
        self.params[0].value()
    }

    /// Volatility of `x`.
    pub fn sigma(&self) -> Real {
        self.params[1].value()
    }

    /// Speed of `y`.
    pub fn b(&self) -> Real {
        self.params[2].value()
    }

    /// Volatility of `y`.
    pub fn eta(&self) -> Real {
        self.params[3].value()
    }

    /// Factor correlation.
    pub fn rho(&self) -> Real {
        self.params[4].value()
    }

    /// The state process under the current parameters.
    pub fn process(&self) -> Result<G2Process> {
        G2Process::new(
            Arc::clone(&self.term_structure),
            self.a(),
            self.sigma(),
            self.b(),
            self.eta(),
            self.rho(),
        )
    }

    /// Variance of `∫₀ᵗ (x + y) du`.
    fn v(&self, t: Time) -> Real {
        let (a, b, sigma, eta, rho) = (self.a(), self.b(), self.sigma(), self.eta(), self.rho());
        let expa = (-a * t).exp();
        let expb = (-b * t).exp();
        let expab = (-(a + b) * t).exp();
        let vx = sigma * sigma / (a * a) * (t + 2.0 / a * expa - 0.5 / a * expa * expa - 1.5 / a);
        let vy = eta * eta / (b * b) * (t + 2.0 / b * expb - 0.5 / b * expb * expb - 1.5 / b);
        let cross = 2.0 * rho * sigma * eta / (a * b)
            * (t + (expa - 1.0) / a + (expb - 1.0) / b - (expab - 1.0) / (a + b));
        vx + vy + cross
    }

    /// Volatility of the forward bond price `P(t, s) / P(t, t)` up to `t`.
    fn sigma_p(&self, t: Time, s: Time) -> Real {
        let (a, b, sigma, eta, rho) = (self.a(), self.b(), self.sigma(), self.eta(), self.rho());
        let temp = -(-(a + b) * t).exp_m1();
        let temp1 = -(-a * (s - t)).exp_m1();
        let temp2 = -(-b * (s - t)).exp_m1();
        let value = 0.5 * sigma * sigma * temp1 * temp1 * (-(-2.0 * a * t).exp_m1()) / (a * a * a)
            + 0.5 * eta * eta * temp2 * temp2 * (-(-2.0 * b * t).exp_m1()) / (b * b * b)
            + 2.0 * rho * sigma * eta / (a * b * (a + b)) * temp1 * temp2 * temp;
        value.sqrt()
    }

    /// Zero bond at `t` given the factors.
    pub fn discount_bond_at(&self, t: Time, maturity: Time, x: Real, y: Real) -> DiscountFactor {
        let tau = maturity - t;
        let ts = &self.term_structure;
        let convexity = 0.5 * (self.v(tau) - self.v(maturity) + self.v(t));
        ts.discount(maturity) / ts.discount(t)
            * (convexity - b_factor(self.a(), tau) * x - b_factor(self.b(), tau) * y).exp()
    }

    /// Value today of an option expiring at `maturity` on the zero bond
    /// maturing at `bond_maturity`.
    pub fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Real {
        let v = self.sigma_p(maturity, bond_maturity);
        let f = self.term_structure.discount(bond_maturity);
        let k = self.term_structure.discount(maturity) * strike;
        black_formula(option_type, k, f, v, 1.0)
    }
}

impl CalibratedModel for G2 {
    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        assign_flat(&mut self.params, values)
    }
}

impl ShortRateModel for G2 {
    fn term_structure(&self) -> Option<&Arc<dyn YieldTermStructure>> {
        Some(&self.term_structure)
    }

    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Result<DiscountFactor> {
        ensure!(state.len() == 2, "G2 state is (x, y), got {} values", state.len());
        Ok(self.discount_bond_at(t, maturity, state[0], state[1]))
    }
}

impl TwoFactorModel for G2 {
    fn x_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess::new(self.a(), self.sigma(), 0.0, 0.0)
    }

    fn y_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess::new(self.b(), self.eta(), 0.0, 0.0)
    }

    fn correlation(&self) -> Real {
        self.rho()
    }

    fn short_rate(&self, t: Time, x: Real, y: Real) -> Rate {
        let (a, b, sigma, eta) = (self.a(), self.b(), self.sigma(), self.eta());
        let tx = sigma * b_factor(a, t);
        let ty = eta * b_factor(b, t);
        let phi = self.term_structure.instantaneous_forward(t)
            + 0.5 * tx * tx
            + 0.5 * ty * ty
            + self.rho() * tx * ty;
        phi + x + y
    }
}

impl AffineStateModel for G2 {
    fn state_dimension(&self) -> usize {
        2
    }

    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Real {
        self.discount_bond_at(t, maturity, state[0], state[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull_white_model::HullWhite;
    use crate::short_rate_model::OneFactorAffineModel;
    use approx::assert_abs_diff_eq;
    use qn_methods::lattice::{DiscretizedAsset, DiscretizedDiscountBond, TimeGrid};
    use qn_termstructures::FlatForward;

    fn curve() -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::new(0.04))
    }

    fn model() -> G2 {
        G2::new(curve(), 0.1, 0.01, 0.3, 0.008, -0.5).unwrap()
    }

    #[test]
    fn origin_reprices_the_curve() {
        let m = model();
        for maturity in [1.0, 5.0, 20.0] {
            let p = ShortRateModel::discount_bond(&m, 0.0, maturity, &[0.0, 0.0]).unwrap();
            assert_abs_diff_eq!(p, (-0.04 * maturity).exp(), epsilon = 1e-12);
        }
        assert!(ShortRateModel::discount_bond(&m, 0.0, 1.0, &[0.0]).is_err());
    }

    #[test]
    fn short_rate_matches_the_process_shift() {
        let m = model();
        let process = m.process().unwrap();
        assert_abs_diff_eq!(
            m.short_rate(3.0, 0.01, -0.002),
            process.short_rate(3.0, 0.01, -0.002),
            epsilon = 1e-12
        );
    }

    #[test]
    fn degenerate_second_factor_reduces_to_hull_white() {
        let g2 = G2::new(curve(), 0.1, 0.01, 0.5, 1e-8, 0.0).unwrap();
        let hw = HullWhite::new(curve(), 0.1, 0.01).unwrap();
        let g2_call = g2.discount_bond_option(OptionType::Call, 0.88, 1.0, 4.0);
        let hw_call = hw.discount_bond_option(OptionType::Call, 0.88, 1.0, 4.0);
        assert_abs_diff_eq!(g2_call, hw_call, epsilon = 1e-9);
    }

    #[test]
    fn lattice_prices_bonds() {
        let m = model();
        let grid = TimeGrid::new(5.0, 50).unwrap();
        let lattice = m.tree(&grid).unwrap();
        let mut bond = DiscretizedDiscountBond::default();
        bond.initialize(&lattice, 5.0).unwrap();
        bond.rollback(&lattice, 0.0).unwrap();
        let value = bond.present_value(&lattice).unwrap();
        assert_abs_diff_eq!(value, (-0.2_f64).exp(), epsilon = 5e-4);
    }
}
