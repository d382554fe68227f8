//! Black-Karasinski model: the log of the short rate is Ornstein-Uhlenbeck,
//!
//! ```text
//! d ln r = (θ(t) − a ln r) dt + σ dW
//! ```
//!
//! with `θ` fitted numerically on the tree. Rates stay positive; there are
//! no closed-form bond prices.

use crate::calibrated_model::{assign_flat, CalibratedModel, Parameter, PositiveConstraint};
use crate::short_rate_model::{OneFactorModel, ShortRateFitting, ShortRateModel, ShortRateTree};
use qn_core::{ensure, errors::Result, DiscountFactor, Error, Rate, Real, Time};
use qn_methods::lattice::{TimeGrid, TreeLattice, TrinomialTree};
use qn_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Black-Karasinski model with parameters `[a, σ]`.
#[derive(Debug, Clone)]
pub struct BlackKarasinski {
    params: Vec<Parameter>,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl BlackKarasinski {
    /// Model fitted to `term_structure`.
    pub fn new(term_structure: Arc<dyn YieldTermStructure>, a: Real, sigma: Real) -> Result<Self> {
        ensure!(a > 0.0, "mean reversion must be positive, got {a}");
        ensure!(sigma > 0.0, "volatility must be positive, got {sigma}");
        Ok(Self {
            params: vec![
                Parameter::new(vec![a], PositiveConstraint),
                Parameter::new(vec![sigma], PositiveConstraint),
            ],
            term_structure,
        })
    }

    /// Mean-reversion speed of `ln r`.
    pub fn mean_reversion(&self) -> Real {
        self.params[0].value()
    }

    /// Volatility of `ln r`.
    pub fn sigma(&self) -> Real {
        self.params[1].value()
    }

    fn state_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess::new(self.mean_reversion(), self.sigma(), 0.0, 0.0)
    }
}

impl CalibratedModel for BlackKarasinski {
    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        assign_flat(&mut self.params, values)
    }
}

impl ShortRateModel for BlackKarasinski {
    fn term_structure(&self) -> Option<&Arc<dyn YieldTermStructure>> {
        Some(&self.term_structure)
    }

    fn discount_bond(&self, _t: Time, _maturity: Time, _state: &[Real]) -> Result<DiscountFactor> {
        Err(Error::NotImplemented(
            "Black-Karasinski has no closed-form bond prices; use a tree".to_string(),
        ))
    }
}

impl OneFactorModel for BlackKarasinski {
    fn short_rate_process(&self) -> Arc<dyn StochasticProcess1D> {
        Arc::new(self.state_process())
    }

    /// `exp(x)` before fitting.
    fn short_rate(&self, _t: Time, x: Real) -> Rate {
        x.exp()
    }

    fn tree(&self, grid: &TimeGrid) -> Result<TreeLattice<ShortRateTree>> {
        let trinomial = TrinomialTree::new(&self.state_process(), grid, false)?;
        let curve = self.term_structure.as_ref();
        let tree = ShortRateTree::fitted(trinomial, curve, ShortRateFitting::Exponential)?;
        Ok(TreeLattice::new(tree, grid.clone()))
    }
}
