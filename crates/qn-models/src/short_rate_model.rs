//! Short-rate model hierarchy and the trees built from it.
//!
//! ```text
//! CalibratedModel
//! └── ShortRateModel
//!     ├── OneFactorModel ── OneFactorAffineModel   Vasicek, HullWhite
//!     │                 └─                         BlackKarasinski
//!     └── TwoFactorModel                           G2
//! ```
//!
//! One-factor models describe the short rate as `r = g(x + θ(t))` for a
//! state variable `x` following a trinomial-friendly process. Their trees
//! ([`ShortRateTree`]) either use the model's own `short_rate(t, x)` or fit
//! one shift `θ_i` per step so that the lattice reprices the initial curve.

use crate::calibrated_model::CalibratedModel;
use qn_core::{errors::Result, DiscountFactor, OptionType, Rate, Real, Time};
use qn_math::{solvers1d::brent, Array};
use qn_methods::lattice::{Lattice2D, LatticeImpl, TimeGrid, Tree, TreeLattice, TrinomialTree};
use qn_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;
use tracing::debug;

// ── Traits ───────────────────────────────────────────────────────────────────

/// A model of the instantaneous short rate.
pub trait ShortRateModel: CalibratedModel {
    /// The curve the model is fitted to, if it is fitted to one.
    fn term_structure(&self) -> Option<&Arc<dyn YieldTermStructure>>;

    /// Price at `t` of the zero bond maturing at `maturity` given the model
    /// state at `t`. One-factor models take the short rate as state.
    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Result<DiscountFactor>;
}

/// A short-rate model driven by one state variable.
pub trait OneFactorModel: ShortRateModel {
    /// The process followed by the state variable `x`.
    fn short_rate_process(&self) -> Arc<dyn StochasticProcess1D>;

    /// Short rate at `t` for state `x`.
    fn short_rate(&self, t: Time, x: Real) -> Rate;

    /// Trinomial short-rate lattice on `grid`.
    fn tree(&self, grid: &TimeGrid) -> Result<TreeLattice<ShortRateTree>> {
        let process = self.short_rate_process();
        let trinomial = TrinomialTree::new(process.as_ref(), grid, false)?;
        let tree = ShortRateTree::new(trinomial, |t, x| self.short_rate(t, x));
        Ok(TreeLattice::new(tree, grid.clone()))
    }
}

/// One-factor model with bond prices `P(t, T) = A(t, T) e^{−B(t, T) r}`.
pub trait OneFactorAffineModel: OneFactorModel {
    /// `A(t, T)`.
    fn a(&self, t: Time, maturity: Time) -> Real;

    /// `B(t, T)`.
    fn b(&self, t: Time, maturity: Time) -> Real;

    /// Zero bond at short rate `rate`.
    fn discount_bond_at_rate(&self, t: Time, maturity: Time, rate: Rate) -> DiscountFactor {
        self.a(t, maturity) * (-self.b(t, maturity) * rate).exp()
    }

    /// Value today of an option expiring at `maturity` on the zero bond
    /// maturing at `bond_maturity`.
    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Real;
}

/// A short-rate model driven by two correlated Gaussian factors.
pub trait TwoFactorModel: ShortRateModel {
    /// Process of the first factor.
    fn x_process(&self) -> OrnsteinUhlenbeckProcess;

    /// Process of the second factor.
    fn y_process(&self) -> OrnsteinUhlenbeckProcess;

    /// Correlation of the factor increments.
    fn correlation(&self) -> Real;

    /// Short rate at `t` for factors `(x, y)`.
    fn short_rate(&self, t: Time, x: Real, y: Real) -> Rate;

    /// Nine-branch lattice on `grid`.
    fn tree(&self, grid: &TimeGrid) -> Result<TreeLattice<G2Lattice>> {
        let tree1 = TrinomialTree::new(&self.x_process(), grid, false)?;
        let tree2 = TrinomialTree::new(&self.y_process(), grid, false)?;
        let lattice = Lattice2D::new(tree1, tree2, self.correlation())?;
        let imp = G2Lattice::new(lattice, |t, x, y| self.short_rate(t, x, y));
        Ok(TreeLattice::new(imp, grid.clone()))
    }
}

/// `(1 − e^{−a τ}) / a`, continuous at `a = 0`.
pub(crate) fn b_factor(a: Real, tau: Time) -> Real {
    if a.abs() < f64::EPSILON.sqrt() {
        tau
    } else {
        -(-a * tau).exp_m1() / a
    }
}

// ── ShortRateTree ────────────────────────────────────────────────────────────

/// How the fitted shift enters the short rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortRateFitting {
    /// `r = x + θ`; the shift has a closed form.
    Additive,
    /// `r = exp(x + θ)`; the shift is found by root-finding.
    Exponential,
}

impl ShortRateFitting {
    fn rate(self, x: Real, theta: Real) -> Rate {
        match self {
            Self::Additive => x + theta,
            Self::Exponential => (x + theta).exp(),
        }
    }
}

/// One-factor short-rate lattice over a trinomial tree of the state
/// variable, with per-node one-step discount factors.
#[derive(Debug, Clone)]
pub struct ShortRateTree {
    tree: TrinomialTree,
    discounts: Vec<Array>,
    shifts: Vec<Real>,
}

impl ShortRateTree {
    /// Tree whose node rates are `rate(t_i, x)`.
    pub fn new(tree: TrinomialTree, rate: impl Fn(Time, Real) -> Rate) -> Self {
        let grid = tree.time_grid().clone();
        let discounts = (0..grid.steps())
            .map(|i| {
                let (t, dt) = (grid.time(i), grid.dt(i));
                Array::from_fn(tree.size(i), |j| (-rate(t, tree.underlying(i, j)) * dt).exp())
            })
            .collect();
        Self {
            tree,
            discounts,
            shifts: Vec::new(),
        }
    }

    /// Tree with one shift per step chosen so that the Arrow-Debreu prices
    /// of each column reproduce the discount factors of `curve`.
    pub fn fitted(
        tree: TrinomialTree,
        curve: &dyn YieldTermStructure,
        fitting: ShortRateFitting,
    ) -> Result<Self> {
        let grid = tree.time_grid().clone();
        let steps = grid.steps();
        let mut discounts = Vec::with_capacity(steps);
        let mut shifts = Vec::with_capacity(steps);
        let mut prices = Array::from_element(1, 1.0);

        for i in 0..steps {
            let dt = grid.dt(i);
            let target = curve.discount(grid.time(i + 1));
            let xs: Vec<Real> = (0..tree.size(i)).map(|j| tree.underlying(i, j)).collect();
            let column_value = |theta: Real| -> Real {
                xs.iter()
                    .zip(prices.iter())
                    .map(|(&x, q)| q * (-fitting.rate(x, theta) * dt).exp())
                    .sum()
            };
            let theta = match fitting {
                ShortRateFitting::Additive => (column_value(0.0) / target).ln() / dt,
                ShortRateFitting::Exponential => {
                    brent(|theta| target - column_value(theta), -50.0, 50.0, 1e-10)?
                }
            };

            let column = Array::from_fn(xs.len(), |j| (-fitting.rate(xs[j], theta) * dt).exp());
            let mut next = Array::zeros(tree.size(i + 1));
            for j in 0..xs.len() {
                let weighted = prices[j] * column[j];
                for branch in 0..3 {
                    let p = tree.probability(i, j, branch);
                    next[tree.descendant(i, j, branch)] += weighted * p;
                }
            }
            prices = next;
            discounts.push(column);
            shifts.push(theta);
        }
        debug!(steps, ?fitting, "fitted short-rate tree to the curve");
        Ok(Self {
            tree,
            discounts,
            shifts,
        })
    }

    /// The state-variable tree.
    pub fn tree(&self) -> &TrinomialTree {
        &self.tree
    }

    /// Fitted shift of step `i`, if the tree was fitted.
    pub fn shift(&self, i: usize) -> Option<Real> {
        self.shifts.get(i).copied()
    }

    /// Continuously-compounded one-step rate at node `(i, index)`.
    pub fn short_rate(&self, i: usize, index: usize) -> Rate {
        -self.discounts[i][index].ln() / self.tree.time_grid().dt(i)
    }
}

impl LatticeImpl for ShortRateTree {
    fn size(&self, i: usize) -> usize {
        self.tree.size(i)
    }

    fn discount(&self, i: usize, index: usize) -> DiscountFactor {
        self.discounts[i][index]
    }

    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        self.tree.descendant(i, index, branch)
    }

    fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        self.tree.probability(i, index, branch)
    }

    fn branches(&self) -> usize {
        3
    }

    fn underlying(&self, i: usize, index: usize) -> Option<Real> {
        Some(self.tree.underlying(i, index))
    }
}

// ── G2Lattice ────────────────────────────────────────────────────────────────

/// Two-factor short-rate lattice: a [`Lattice2D`] with node discounting.
#[derive(Debug, Clone)]
pub struct G2Lattice {
    lattice: Lattice2D,
    discounts: Vec<Array>,
}

impl G2Lattice {
    /// Lattice whose node rates are `rate(t_i, x, y)`.
    pub fn new(lattice: Lattice2D, rate: impl Fn(Time, Real, Real) -> Rate) -> Self {
        let grid = lattice.tree1().time_grid().clone();
        let discounts = (0..grid.steps())
            .map(|i| {
                let (t, dt) = (grid.time(i), grid.dt(i));
                Array::from_fn(lattice.size(i), |index| {
                    let (x, y) = lattice.underlyings(i, index);
                    (-rate(t, x, y) * dt).exp()
                })
            })
            .collect();
        Self { lattice, discounts }
    }

    /// The factor lattice.
    pub fn lattice(&self) -> &Lattice2D {
        &self.lattice
    }
}

impl LatticeImpl for G2Lattice {
    fn size(&self, i: usize) -> usize {
        self.lattice.size(i)
    }

    fn discount(&self, i: usize, index: usize) -> DiscountFactor {
        self.discounts[i][index]
    }

    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        self.lattice.descendant(i, index, branch)
    }

    fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        self.lattice.probability(i, index, branch)
    }

    fn branches(&self) -> usize {
        self.lattice.branches()
    }
}
