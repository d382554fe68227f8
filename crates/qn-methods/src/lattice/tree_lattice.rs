//! Backward induction on lattices.
//!
//! [`Lattice`] is the interface seen by discretized assets. [`TreeLattice`]
//! implements it for any [`LatticeImpl`], i.e. anything that can report
//! node counts, descendants, branch probabilities and one-step discount
//! factors. It also computes Arrow-Debreu state prices, which the
//! short-rate trees use to fit the initial curve.

use super::discretized_asset::DiscretizedAsset;
use super::TimeGrid;
use qn_core::{ensure, errors::Result, fail, DiscountFactor, Real, Time};
use qn_math::{close, Array};

/// A numerical method rolling discretized assets back in time.
pub trait Lattice: std::fmt::Debug + Send + Sync {
    /// The time grid of the lattice.
    fn time_grid(&self) -> &TimeGrid;

    /// Set `asset` at time `t` and let it initialize its values on the
    /// lattice nodes at `t`.
    fn initialize(&self, asset: &mut dyn DiscretizedAsset, t: Time) -> Result<()>;

    /// Roll `asset` back to `to` and adjust its values there.
    fn rollback(&self, asset: &mut dyn DiscretizedAsset, to: Time) -> Result<()>;

    /// Roll `asset` back to `to` without the final adjustment.
    fn partial_rollback(&self, asset: &mut dyn DiscretizedAsset, to: Time) -> Result<()>;

    /// Present value of `asset` from its current time.
    fn present_value(&self, asset: &mut dyn DiscretizedAsset) -> Result<Real>;

    /// Values of the underlying variable on the nodes at `t`.
    fn grid(&self, t: Time) -> Result<Array>;
}

/// The per-node data a [`TreeLattice`] needs.
pub trait LatticeImpl: std::fmt::Debug + Send + Sync {
    /// Number of nodes at step `i`.
    fn size(&self, i: usize) -> usize;

    /// One-step discount factor from node `(i, index)`.
    fn discount(&self, i: usize, index: usize) -> DiscountFactor;

    /// Descendant of `(i, index)` through `branch`.
    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize;

    /// Probability of `branch` from `(i, index)`.
    fn probability(&self, i: usize, index: usize, branch: usize) -> Real;

    /// Number of branches per node.
    fn branches(&self) -> usize;

    /// Underlying value at `(i, index)`, if the lattice has a single
    /// underlying variable.
    fn underlying(&self, _i: usize, _index: usize) -> Option<Real> {
        None
    }
}

/// Generic tree lattice over a [`LatticeImpl`].
#[derive(Debug, Clone)]
pub struct TreeLattice<I: LatticeImpl> {
    imp: I,
    time_grid: TimeGrid,
    state_prices: Vec<Array>,
}

impl<I: LatticeImpl> TreeLattice<I> {
    /// Lattice over `imp` on `time_grid`.
    pub fn new(imp: I, time_grid: TimeGrid) -> Self {
        Self {
            imp,
            time_grid,
            state_prices: vec![Array::from_element(1, 1.0)],
        }
    }

    /// The implementation.
    pub fn inner(&self) -> &I {
        &self.imp
    }

    /// Mutable access to the implementation. State prices already computed
    /// are kept, so callers may only change data of steps at or beyond the
    /// last computed one.
    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.imp
    }

    /// Number of nodes at step `i`.
    pub fn size(&self, i: usize) -> usize {
        self.imp.size(i)
    }

    /// Compute and cache state prices up to step `until`.
    pub fn compute_state_prices(&mut self, until: usize) {
        let from = self.state_prices.len() - 1;
        for i in from..until {
            let next = self.propagate(i, &self.state_prices[i]);
            self.state_prices.push(next);
        }
    }

    /// Arrow-Debreu prices of the nodes at step `i`.
    pub fn state_prices(&mut self, i: usize) -> &Array {
        if i >= self.state_prices.len() {
            self.compute_state_prices(i);
        }
        &self.state_prices[i]
    }

    /// One backward step: values at step `i` from values at step `i + 1`.
    pub fn step_back(&self, i: usize, values: &Array) -> Array {
        let branches = self.imp.branches();
        Array::from_fn(self.imp.size(i), |j| {
            let mut value = 0.0;
            for l in 0..branches {
                value += self.imp.probability(i, j, l) * values[self.imp.descendant(i, j, l)];
            }
            value * self.imp.discount(i, j)
        })
    }

    fn propagate(&self, i: usize, prices: &Array) -> Array {
        let mut next = Array::zeros(self.imp.size(i + 1));
        let branches = self.imp.branches();
        for j in 0..self.imp.size(i) {
            let weighted = prices[j] * self.imp.discount(i, j);
            for l in 0..branches {
                next[self.imp.descendant(i, j, l)] += weighted * self.imp.probability(i, j, l);
            }
        }
        next
    }
}

impl<I: LatticeImpl> Lattice for TreeLattice<I> {
    fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    fn initialize(&self, asset: &mut dyn DiscretizedAsset, t: Time) -> Result<()> {
        let i = self.time_grid.index(t)?;
        asset.core_mut().set_time(t);
        asset.reset(self, self.imp.size(i))
    }

    fn rollback(&self, asset: &mut dyn DiscretizedAsset, to: Time) -> Result<()> {
        self.partial_rollback(asset, to)?;
        asset.adjust_values(self)
    }

    fn partial_rollback(&self, asset: &mut dyn DiscretizedAsset, to: Time) -> Result<()> {
        let from = asset.time();
        if close(from, to) {
            return Ok(());
        }
        ensure!(from > to, "cannot roll the asset back to {to} (it is already at t = {from})");
        let i_from = self.time_grid.index(from)?;
        let i_to = self.time_grid.index(to)?;
        for i in (i_to..i_from).rev() {
            let new_values = self.step_back(i, asset.values());
            let core = asset.core_mut();
            core.set_time(self.time_grid.time(i));
            core.set_values(new_values);
            if i != i_to {
                asset.adjust_values(self)?;
            }
        }
        Ok(())
    }

    fn present_value(&self, asset: &mut dyn DiscretizedAsset) -> Result<Real> {
        let i = self.time_grid.index(asset.time())?;
        let value = if i < self.state_prices.len() {
            self.state_prices[i].dot(asset.values())
        } else {
            let mut prices = self.state_prices[self.state_prices.len() - 1].clone();
            for k in self.state_prices.len() - 1..i {
                prices = self.propagate(k, &prices);
            }
            prices.dot(asset.values())
        };
        Ok(value)
    }

    fn grid(&self, t: Time) -> Result<Array> {
        let i = self.time_grid.index(t)?;
        let mut values = Vec::with_capacity(self.imp.size(i));
        for j in 0..self.imp.size(i) {
            match self.imp.underlying(i, j) {
                Some(x) => values.push(x),
                None => fail!("lattice has no single underlying grid"),
            }
        }
        Ok(Array::from_vec(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::DiscretizedDiscountBond;
    use approx::assert_abs_diff_eq;

    /// Two-branch lattice with a constant short rate.
    #[derive(Debug)]
    struct ConstantRate {
        rate: Real,
        dt: Time,
    }

    impl LatticeImpl for ConstantRate {
        fn size(&self, i: usize) -> usize {
            i + 1
        }
        fn discount(&self, _i: usize, _index: usize) -> DiscountFactor {
            (-self.rate * self.dt).exp()
        }
        fn descendant(&self, _i: usize, index: usize, branch: usize) -> usize {
            index + branch
        }
        fn probability(&self, _i: usize, _index: usize, _branch: usize) -> Real {
            0.5
        }
        fn branches(&self) -> usize {
            2
        }
    }

    fn lattice() -> TreeLattice<ConstantRate> {
        let grid = TimeGrid::new(2.0, 8).unwrap();
        TreeLattice::new(ConstantRate { rate: 0.03, dt: 0.25 }, grid)
    }

    #[test]
    fn state_prices_sum_to_discount() {
        let mut l = lattice();
        let sum = l.state_prices(8).sum();
        assert_abs_diff_eq!(sum, (-0.06_f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn discount_bond_rolls_back_to_curve() {
        let l = lattice();
        let mut bond = DiscretizedDiscountBond::default();
        l.initialize(&mut bond, 2.0).unwrap();
        l.rollback(&mut bond, 0.0).unwrap();
        assert_abs_diff_eq!(bond.values()[0], (-0.06_f64).exp(), epsilon = 1e-14);

        let mut bond = DiscretizedDiscountBond::default();
        l.initialize(&mut bond, 2.0).unwrap();
        l.partial_rollback(&mut bond, 1.0).unwrap();
        let pv = l.present_value(&mut bond).unwrap();
        assert_abs_diff_eq!(pv, (-0.06_f64).exp(), epsilon = 1e-14);
        assert!(l.rollback(&mut bond, 1.5).is_err());
        assert!(l.grid(1.0).is_err());
    }
}
