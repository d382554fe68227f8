//! Lattice over an equity tree with a constant short rate.

use super::{LatticeImpl, TimeGrid, Tree, TreeLattice};
use qn_core::{ensure, errors::Result, DiscountFactor, Rate, Real, Time};

/// Equity lattice: node values come from `tree`, every step discounts at
/// `exp(−r dt)`.
#[derive(Debug, Clone)]
pub struct BlackScholesLattice<T: Tree> {
    tree: T,
    risk_free_rate: Rate,
    dt: Time,
    discount: DiscountFactor,
}

impl<T: Tree> BlackScholesLattice<T> {
    /// Tree lattice from 0 to `end`; the tree must have `steps + 1`
    /// columns.
    pub fn build(
        tree: T,
        risk_free_rate: Rate,
        end: Time,
        steps: usize,
    ) -> Result<TreeLattice<Self>> {
        ensure!(
            tree.columns() == steps + 1,
            "tree has {} columns, {} steps requested",
            tree.columns(),
            steps
        );
        let grid = TimeGrid::new(end, steps)?;
        let dt = end / steps as Time;
        let imp = Self {
            tree,
            risk_free_rate,
            dt,
            discount: (-risk_free_rate * dt).exp(),
        };
        Ok(TreeLattice::new(imp, grid))
    }

    /// The underlying tree.
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// The constant short rate.
    pub fn risk_free_rate(&self) -> Rate {
        self.risk_free_rate
    }

    /// Step length.
    pub fn dt(&self) -> Time {
        self.dt
    }
}

impl<T: Tree> LatticeImpl for BlackScholesLattice<T> {
    fn size(&self, i: usize) -> usize {
        self.tree.size(i)
    }

    fn discount(&self, _i: usize, _index: usize) -> DiscountFactor {
        self.discount
    }

    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        self.tree.descendant(i, index, branch)
    }

    fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        self.tree.probability(i, index, branch)
    }

    fn branches(&self) -> usize {
        self.tree.branches()
    }

    fn underlying(&self, i: usize, index: usize) -> Option<Real> {
        Some(self.tree.underlying(i, index))
    }
}
