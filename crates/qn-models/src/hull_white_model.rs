//! Hull-White model fitted to a yield curve.
//!
//! ```text
//! dr = (θ(t) − a r) dt + σ dW
//! ```
//!
//! `θ` reproduces the initial curve, so only `a` and `σ` are calibrated.
//! Trees fit one additive shift per step; finite-difference engines work on
//! `x = r − α(t)` through the [`AffineStateModel`] implementation.

use crate::calibrated_model::{
    assign_flat, CalibratedModel, NoConstraint, Parameter, PositiveConstraint,
};
use crate::short_rate_model::{
    b_factor, OneFactorAffineModel, OneFactorModel, ShortRateFitting, ShortRateModel, ShortRateTree,
};
use qn_core::{ensure, errors::Result, DiscountFactor, OptionType, Rate, Real, Time};
use qn_math::black_formula;
use qn_methods::finite_differences::AffineStateModel;
use qn_methods::lattice::{TimeGrid, TreeLattice, TrinomialTree};
use qn_processes::{HullWhiteProcess, OrnsteinUhlenbeckProcess, StochasticProcess1D};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Hull-White model with parameters `[a, σ]`.
#[derive(Debug, Clone)]
pub struct HullWhite {
    params: Vec<Parameter>,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl HullWhite {
    /// Model with mean reversion `a` and volatility `sigma` fitted to
    /// `term_structure`.
    pub fn new(term_structure: Arc<dyn YieldTermStructure>, a: Real, sigma: Real) -> Result<Self> {
        ensure!(a >= 0.0, "mean reversion must be non-negative, got {a}");
        ensure!(sigma > 0.0, "volatility must be positive, got {sigma}");
        Ok(Self {
            params: vec![
                Parameter::new(vec![a], NoConstraint),
                Parameter::new(vec![sigma], PositiveConstraint),
            ],
            term_structure,
        })
    }

    /// Mean-reversion speed `a`.
    pub fn mean_reversion(&self) -> Real {
        self.params[0].value()
    }

    /// Volatility `σ`.
    pub fn sigma(&self) -> Real {
        self.params[1].value()
    }

    /// The short-rate process under the current parameters.
    pub fn process(&self) -> HullWhiteProcess {
        HullWhiteProcess::new(Arc::clone(&self.term_structure), self.mean_reversion(), self.sigma())
    }
}

impl CalibratedModel for HullWhite {
    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        assign_flat(&mut self.params, values)
    }
}

impl ShortRateModel for HullWhite {
    fn term_structure(&self) -> Option<&Arc<dyn YieldTermStructure>> {
        Some(&self.term_structure)
    }

    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Result<DiscountFactor> {
        ensure!(state.len() == 1, "Hull-White state is the short rate alone");
        Ok(self.discount_bond_at_rate(t, maturity, state[0]))
    }
}

impl OneFactorModel for HullWhite {
    fn short_rate_process(&self) -> Arc<dyn StochasticProcess1D> {
        Arc::new(self.process())
    }

    fn short_rate(&self, t: Time, x: Real) -> Rate {
        x + self.process().alpha(t)
    }

    /// Tree on `x` with shifts fitted to the curve.
    fn tree(&self, grid: &TimeGrid) -> Result<TreeLattice<ShortRateTree>> {
        let x = OrnsteinUhlenbeckProcess::new(self.mean_reversion(), self.sigma(), 0.0, 0.0);
        let trinomial = TrinomialTree::new(&x, grid, false)?;
        let curve = self.term_structure.as_ref();
        let tree = ShortRateTree::fitted(trinomial, curve, ShortRateFitting::Additive)?;
        Ok(TreeLattice::new(tree, grid.clone()))
    }
}

impl OneFactorAffineModel for HullWhite {
    fn a(&self, t: Time, maturity: Time) -> Real {
        let ts = &self.term_structure;
        let (a, sigma) = (self.mean_reversion(), self.sigma());
        let bt = self.b(t, maturity);
        let forward = ts.instantaneous_forward(t);
        let convexity = if a < f64::EPSILON.sqrt() {
            sigma * sigma * t * bt * bt * 0.5
        } else {
            sigma * sigma / (4.0 * a) * (-(-2.0 * a * t).exp_m1()) * bt * bt
        };
        ts.discount(maturity) / ts.discount(t) * (bt * forward - convexity).exp()
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
        let b = self.b(maturity, bond_maturity);
        let v = if a < f64::EPSILON.sqrt() {
            self.sigma() * b * maturity.sqrt()
        } else {
            self.sigma() * b * (0.5 * (-(-2.0 * a * maturity).exp_m1()) / a).sqrt()
        };
        let f = self.term_structure.discount(bond_maturity);
        let k = self.term_structure.discount(maturity) * strike;
        black_formula(option_type, k, f, v, 1.0)
    }
}

impl AffineStateModel for HullWhite {
    fn state_dimension(&self) -> usize {
        1
    }

    /// Bond price given `x = r − α(t)`.
    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Real {
        self.discount_bond_at_rate(t, maturity, state[0] + self.process().alpha(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_methods::lattice::{DiscretizedAsset, DiscretizedDiscountBond};
    use qn_termstructures::FlatForward;

    fn model() -> HullWhite {
        HullWhite::new(Arc::new(FlatForward::new(0.04)), 0.1, 0.01).unwrap()
    }

    #[test]
    fn reprices_the_curve_today() {
        let m = model();
        let r0 = m.short_rate_process().x0();
        for maturity in [0.5, 2.0, 10.0] {
            let p = ShortRateModel::discount_bond(&m, 0.0, maturity, &[r0]).unwrap();
            assert_abs_diff_eq!(p, (-0.04 * maturity).exp(), epsilon = 1e-10);
        }
    }

    #[test]
    fn state_and_rate_views_agree() {
        let m = model();
        let (t, maturity, x) = (2.0, 5.0, 0.003);
        let alpha = m.process().alpha(t);
        let from_rate = ShortRateModel::discount_bond(&m, t, maturity, &[x + alpha]).unwrap();
        let from_state = AffineStateModel::discount_bond(&m, t, maturity, &[x]);
        assert_abs_diff_eq!(from_rate, from_state, epsilon = 1e-14);
    }

    #[test]
    fn bond_option_parity_and_monotonicity() {
        let m = model();
        let (t, s) = (1.0, 4.0);
        let k = 0.9;
        let call = m.discount_bond_option(OptionType::Call, k, t, s);
        let put = m.discount_bond_option(OptionType::Put, k, t, s);
        assert_abs_diff_eq!(call - put, (-0.04 * s).exp() - k * (-0.04 * t).exp(), epsilon = 1e-12);

        let mut wider = model();
        wider.set_params(&[0.1, 0.02]).unwrap();
        assert!(wider.discount_bond_option(OptionType::Call, k, t, s) > call);
    }

    #[test]
    fn fitted_tree_reprices_bonds() {
        let m = model();
        let grid = TimeGrid::new(5.0, 60).unwrap();
        let lattice = m.tree(&grid).unwrap();
        let mut bond = DiscretizedDiscountBond::default();
        bond.initialize(&lattice, 5.0).unwrap();
        bond.rollback(&lattice, 0.0).unwrap();
        let value = bond.present_value(&lattice).unwrap();
        assert_abs_diff_eq!(value, (-0.2_f64).exp(), epsilon = 1e-9);
    }
}
