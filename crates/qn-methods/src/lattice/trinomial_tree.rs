//! Recombining trinomial tree.
//!
//! The process variance over a step must not depend on the state, which
//! holds for the Ornstein-Uhlenbeck state variables of the short-rate
//! models. Node spacing at step `i` is `dx_i = sqrt(3 V_i)`; each node
//! branches around the node closest to its conditional mean.

use super::{TimeGrid, Tree};
use qn_core::{ensure, errors::Result, Integer, Real};
use qn_processes::StochasticProcess1D;
use tracing::debug;

/// Branching of one time step: for each node the offset `k` of the middle
/// descendant and the down/middle/up probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Branching {
    k: Vec<Integer>,
    probs: [Vec<Real>; 3],
    j_min: Integer,
    j_max: Integer,
}

impl Default for Branching {
    fn default() -> Self {
        Self {
            k: Vec::new(),
            probs: [Vec::new(), Vec::new(), Vec::new()],
            j_min: Integer::MAX,
            j_max: Integer::MIN,
        }
    }
}

impl Branching {
    fn add(&mut self, k: Integer, p_down: Real, p_mid: Real, p_up: Real) {
        self.k.push(k);
        self.probs[0].push(p_down);
        self.probs[1].push(p_mid);
        self.probs[2].push(p_up);
        self.j_min = self.j_min.min(k - 1);
        self.j_max = self.j_max.max(k + 1);
    }

    /// Node of the next column reached from `index` via `branch`.
    pub fn descendant(&self, index: usize, branch: usize) -> usize {
        (self.k[index] - self.j_min - 1) as usize + branch
    }

    /// Probability of `branch` from node `index`.
    pub fn probability(&self, index: usize, branch: usize) -> Real {
        self.probs[branch][index]
    }

    /// Number of nodes in the next column.
    pub fn size(&self) -> usize {
        (self.j_max - self.j_min + 1) as usize
    }

    /// Middle-descendant offsets.
    pub fn k(&self) -> &[Integer] {
        &self.k
    }

    /// Lowest node offset of the next column.
    pub fn j_min(&self) -> Integer {
        self.j_min
    }

    /// Highest node offset of the next column.
    pub fn j_max(&self) -> Integer {
        self.j_max
    }
}

/// A recombining trinomial tree on `x0 + j dx_i`.
#[derive(Debug, Clone)]
pub struct TrinomialTree {
    x0: Real,
    dx: Vec<Real>,
    branchings: Vec<Branching>,
    time_grid: TimeGrid,
}

impl TrinomialTree {
    /// Build the tree of `process` on `grid`. With `is_positive` the lowest
    /// descendant of every node stays strictly above zero.
    pub fn new(
        process: &dyn StochasticProcess1D,
        grid: &TimeGrid,
        is_positive: bool,
    ) -> Result<Self> {
        let x0 = process.x0();
        let steps = grid.steps();
        ensure!(steps > 0, "trinomial tree needs at least one time step");

        let mut dx = Vec::with_capacity(steps + 1);
        dx.push(0.0);
        let mut branchings = Vec::with_capacity(steps);
        let (mut j_min, mut j_max) = (0, 0);
        let sqrt3 = 3.0_f64.sqrt();

        for i in 0..steps {
            let t = grid.time(i);
            let dt = grid.dt(i);
            let v2 = process.variance_1d(t, 0.0, dt);
            ensure!(v2 > 0.0, "non-positive variance {v2} at t = {t}");
            let v = v2.sqrt();
            let dx_next = v * sqrt3;
            dx.push(dx_next);

            let mut branching = Branching::default();
            for j in j_min..=j_max {
                let x = x0 + j as Real * dx[i];
                let m = process.expectation_1d(t, x, dt);
                let mut k = ((m - x0) / dx_next + 0.5).floor() as Integer;
                if is_positive {
                    while x0 + (k - 1) as Real * dx_next <= 0.0 {
                        k += 1;
                    }
                }
                let e = m - (x0 + k as Real * dx_next);
                let e2 = e * e;
                let e3 = e * sqrt3;
                let p_down = (1.0 + e2 / v2 - e3 / v) / 6.0;
                let p_mid = (2.0 - e2 / v2) / 3.0;
                let p_up = (1.0 + e2 / v2 + e3 / v) / 6.0;
                branching.add(k, p_down, p_mid, p_up);
            }
            j_min = branching.j_min;
            j_max = branching.j_max;
            branchings.push(branching);
        }
        debug!(
            steps,
            x0,
            width = j_max - j_min + 1,
            "built trinomial tree"
        );
        Ok(Self {
            x0,
            dx,
            branchings,
            time_grid: grid.clone(),
        })
    }

    /// Node spacing of column `i` (zero for the root).
    pub fn dx(&self, i: usize) -> Real {
        self.dx[i]
    }

    /// Branching from column `i` to `i + 1`.
    pub fn branching(&self, i: usize) -> &Branching {
        &self.branchings[i]
    }

    /// The time grid.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }
}

impl Tree for TrinomialTree {
    fn columns(&self) -> usize {
        self.time_grid.size()
    }

    fn size(&self, i: usize) -> usize {
        if i == 0 {
            1
        } else {
            self.branchings[i - 1].size()
        }
    }

    fn underlying(&self, i: usize, index: usize) -> Real {
        if i == 0 {
            self.x0
        } else {
            let j = self.branchings[i - 1].j_min as Real + index as Real;
            self.x0 + j * self.dx[i]
        }
    }

    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        self.branchings[i].descendant(index, branch)
    }

    fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        self.branchings[i].probability(index, branch)
    }

    fn branches(&self) -> usize {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use qn_processes::OrnsteinUhlenbeckProcess;

    fn tree(a: Real, steps: usize) -> TrinomialTree {
        let p = OrnsteinUhlenbeckProcess::new(a, 0.01, 0.0, 0.0);
        TrinomialTree::new(&p, &TimeGrid::new(5.0, steps).unwrap(), false).unwrap()
    }

    #[test]
    fn mean_reversion_caps_width() {
        let t = tree(0.5, 100);
        assert_eq!(t.size(0), 1);
        assert_eq!(t.size(1), 3);
        // the tree stops widening once reversion dominates
        assert!(t.size(100) < 2 * 100 + 1);
        assert_eq!(t.size(100), t.size(99));
    }

    #[test]
    fn conditional_moments_are_matched() {
        let p = OrnsteinUhlenbeckProcess::new(0.3, 0.01, 0.0, 0.0);
        let grid = TimeGrid::new(2.0, 20).unwrap();
        let t = TrinomialTree::new(&p, &grid, false).unwrap();
        let i = 10;
        for index in 0..t.size(i) {
            let x = t.underlying(i, index);
            let (mut mean, mut second) = (0.0, 0.0);
            for b in 0..3 {
                let y = t.underlying(i + 1, t.descendant(i, index, b));
                let q = t.probability(i, index, b);
                mean += q * y;
                second += q * y * y;
            }
            let m = p.expectation_1d(grid.time(i), x, grid.dt(i));
            let v = p.variance_1d(grid.time(i), x, grid.dt(i));
            assert_abs_diff_eq!(mean, m, epsilon = 1e-14);
            assert_abs_diff_eq!(second - mean * mean, v, epsilon = 1e-14);
        }
    }

    #[test]
    fn positive_tree_stays_above_zero() {
        let p = OrnsteinUhlenbeckProcess::new(0.1, 0.02, 0.01, 0.01);
        let grid = TimeGrid::new(10.0, 40).unwrap();
        let t = TrinomialTree::new(&p, &grid, true).unwrap();
        for i in 1..t.columns() {
            assert!(t.underlying(i, 0) > 0.0);
        }
    }

    proptest! {
        #[test]
        fn probabilities_sum_to_one(a in 0.01f64..2.0, steps in 1usize..40) {
            let t = tree(a, steps);
            for i in 0..steps {
                for index in 0..t.size(i) {
                    let s: Real = (0..3).map(|b| t.probability(i, index, b)).sum();
                    prop_assert!((s - 1.0).abs() < 1e-12);
                    for b in 0..3 {
                        prop_assert!(t.descendant(i, index, b) < t.size(i + 1));
                    }
                }
            }
        }
    }
}
