//! Vasicek model.
//!
//! ```text
//! dr = a (b − r) dt + σ dW
//! ```
//!
//! Not fitted to any curve: bond prices follow from the four parameters.

use crate::calibrated_model::{
    assign_flat, CalibratedModel, NoConstraint, Parameter, PositiveConstraint,
};
use crate::short_rate_model::{b_factor, OneFactorAffineModel, OneFactorModel, ShortRateModel};
use qn_core::{ensure, errors::Result, DiscountFactor, OptionType, Rate, Real, Time};
use qn_math::black_formula;
use qn_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Vasicek short-rate model with parameters `[a, b, σ, r0]`.
#[derive(Debug, Clone)]
pub struct Vasicek {
    params: Vec<Parameter>,
}

impl Vasicek {
    /// Model with reversion `a`, level `b`, volatility `sigma` and current
    /// short rate `r0`.
    pub fn new(r0: Rate, a: Real, b: Real, sigma: Real) -> Result<Self> {
        ensure!(a > 0.0, "mean reversion must be positive, got {a}");
        ensure!(sigma > 0.0, "volatility must be positive, got {sigma}");
        Ok(Self {
            params: vec![
                Parameter::new(vec![a], PositiveConstraint),
                Parameter::new(vec![b], NoConstraint),
                Parameter::new(vec![sigma], PositiveConstraint),
                Parameter::new(vec![r0], NoConstraint),
            ],
        })
    }

    /// Mean-reversion speed `a`.
    pub fn mean_reversion(&self) -> Real {
        self.params[0].value()
    }

    /// Long-run level `b`.
    pub fn level(&self) -> Real {
        self.params[1].value()
    }

    /// Volatility `σ`.
    pub fn sigma(&self) -> Real {
        self.params[2].value()
    }

    /// Current short rate.
    pub fn r0(&self) -> Rate {
        self.params[3].value()
    }
}

impl CalibratedModel for Vasicek {
    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        assign_flat(&mut self.params, values)
    }
}

impl ShortRateModel for Vasicek {
    fn term_structure(&self) -> Option<&Arc<dyn YieldTermStructure>> {
        None
    }

    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Result<DiscountFactor> {
        ensure!(state.len() == 1, "Vasicek state is the short rate alone");
        Ok(self.discount_bond_at_rate(t, maturity, state[0]))
    }
}

impl OneFactorModel for Vasicek {
    /// `x = r − b`, an Ornstein-Uhlenbeck process reverting to zero.
    fn short_rate_process(&self) -> Arc<dyn StochasticProcess1D> {
        Arc::new(OrnsteinUhlenbeckProcess::new(
            self.mean_reversion(),
            self.sigma(),
            self.r0() - self.level(),
            0.0,
        ))
    }

    fn short_rate(&self, _t: Time, x: Real) -> Rate {
        x + self.level()
    }
}

impl OneFactorAffineModel for Vasicek {
    fn a(&self, t: Time, maturity: Time) -> Real {
        let (a, b, sigma) = (self.mean_reversion(), self.level(), self.sigma());
        let bt = self.b(t, maturity);
        let s2 = sigma * sigma;
        ((b - 0.5 * s2 / (a * a)) * (bt - (maturity - t)) - 0.25 * bt * bt * s2 / a).exp()
    }

    fn b(&self, t: Time, maturity: Time) -> Real {
        b_factor(self.mean_reversion(), maturity - t)
    }

    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Real {
        let a = self.mean_reversion();
        let v = if a < f64::EPSILON.sqrt() {
            self.sigma() * self.b(maturity, bond_maturity) * maturity.sqrt()
        } else {
            let variance = 0.5 * (-(-2.0 * a * maturity).exp_m1()) / a;
            self.sigma() * self.b(maturity, bond_maturity) * variance.sqrt()
        };
        let f = self.discount_bond_at_rate(0.0, bond_maturity, self.r0());
        let k = self.discount_bond_at_rate(0.0, maturity, self.r0()) * strike;
        black_formula(option_type, k, f, v, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_methods::lattice::{DiscretizedAsset, DiscretizedDiscountBond, TimeGrid};

    fn model() -> Vasicek {
        Vasicek::new(0.03, 0.3, 0.05, 0.01).unwrap()
    }

    #[test]
    fn bond_tends_to_one_and_long_yield_to_its_limit() {
        let m = model();
        assert_abs_diff_eq!(m.discount_bond(1.0, 1.0, &[0.03]).unwrap(), 1.0, epsilon = 1e-14);
        // r∞ = b − σ²/(2a²)
        let long = -m.discount_bond_at_rate(0.0, 2000.0, 0.03).ln() / 2000.0;
        assert_abs_diff_eq!(long, 0.05 - 0.0001 / (2.0 * 0.09), epsilon = 1e-4);
    }

    #[test]
    fn bond_option_parity() {
        let m = model();
        let (t, s, k) = (1.0, 3.0, 0.95);
        let call = m.discount_bond_option(OptionType::Call, k, t, s);
        let put = m.discount_bond_option(OptionType::Put, k, t, s);
        let p_t = m.discount_bond_at_rate(0.0, t, m.r0());
        let p_s = m.discount_bond_at_rate(0.0, s, m.r0());
        assert_abs_diff_eq!(call - put, p_s - k * p_t, epsilon = 1e-12);
    }

    #[test]
    fn tree_prices_bonds_close_to_closed_form() {
        let m = model();
        let grid = TimeGrid::new(5.0, 100).unwrap();
        let lattice = m.tree(&grid).unwrap();
        let mut bond = DiscretizedDiscountBond::default();
        bond.initialize(&lattice, 5.0).unwrap();
        bond.rollback(&lattice, 0.0).unwrap();
        let tree_value = bond.present_value(&lattice).unwrap();
        assert_abs_diff_eq!(tree_value, m.discount_bond_at_rate(0.0, 5.0, 0.03), epsilon = 1e-3);
    }

    #[test]
    fn parameters_update_through_the_flat_vector() {
        let mut m = model();
        m.set_params(&[0.5, 0.04, 0.02, 0.01]).unwrap();
        assert_eq!(m.mean_reversion(), 0.5);
        assert_eq!(m.r0(), 0.01);
        assert!(m.set_params(&[-0.5, 0.04, 0.02, 0.01]).is_err());
        assert_eq!(m.flat_params(), vec![0.5, 0.04, 0.02, 0.01]);
    }
}
