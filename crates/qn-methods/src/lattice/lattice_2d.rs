//! Two-dimensional lattice from two correlated trinomial trees.
//!
//! Node `index` of column `i` packs the node pair `(index1, index2)` as
//! `index1 + index2 · size1(i)`; branch `b` packs `(b % 3, b / 3)`. The
//! product probabilities are corrected by `ρ m[b1][b2] / 36` so that the
//! factor increments get correlation `ρ`.

use super::{Tree, TrinomialTree};
use qn_core::{ensure, errors::Result, Real};

const BRANCHES: usize = 3;

/// Nine-branch lattice over two trinomial trees. Discounting is left to
/// the model that owns the lattice.
#[derive(Debug, Clone)]
pub struct Lattice2D {
    tree1: TrinomialTree,
    tree2: TrinomialTree,
    rho: Real,
    m: [[Real; BRANCHES]; BRANCHES],
}

impl Lattice2D {
    /// Combine `tree1` and `tree2` (built on the same time grid) with
    /// correlation `correlation`.
    pub fn new(tree1: TrinomialTree, tree2: TrinomialTree, correlation: Real) -> Result<Self> {
        ensure!(
            tree1.time_grid() == tree2.time_grid(),
            "the two trees must share their time grid"
        );
        ensure!(
            correlation.abs() <= 1.0,
            "correlation {correlation} outside [-1, 1]"
        );
        let m = if correlation < 0.0 {
            [[-1.0, -4.0, 5.0], [-4.0, 8.0, -4.0], [5.0, -4.0, -1.0]]
        } else {
            [[5.0, -4.0, -1.0], [-4.0, 8.0, -4.0], [-1.0, -4.0, 5.0]]
        };
        Ok(Self {
            tree1,
            tree2,
            rho: correlation.abs(),
            m,
        })
    }

    /// First tree.
    pub fn tree1(&self) -> &TrinomialTree {
        &self.tree1
    }

    /// Second tree.
    pub fn tree2(&self) -> &TrinomialTree {
        &self.tree2
    }

    /// Number of nodes in column `i`.
    pub fn size(&self, i: usize) -> usize {
        self.tree1.size(i) * self.tree2.size(i)
    }

    /// Split a packed node index into the node indices of the two trees.
    pub fn split_index(&self, i: usize, index: usize) -> (usize, usize) {
        let modulo = self.tree1.size(i);
        (index % modulo, index / modulo)
    }

    /// Underlying values `(x, y)` of the two trees at node `(i, index)`.
    pub fn underlyings(&self, i: usize, index: usize) -> (Real, Real) {
        let (index1, index2) = self.split_index(i, index);
        (
            self.tree1.underlying(i, index1),
            self.tree2.underlying(i, index2),
        )
    }

    /// Packed descendant of `(i, index)` through packed `branch`.
    pub fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        let (index1, index2) = self.split_index(i, index);
        let (branch1, branch2) = (branch % BRANCHES, branch / BRANCHES);
        let modulo = self.tree1.size(i + 1);
        self.tree1.descendant(i, index1, branch1)
            + self.tree2.descendant(i, index2, branch2) * modulo
    }

    /// Probability of packed `branch` from `(i, index)`.
    pub fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        let (index1, index2) = self.split_index(i, index);
        let (branch1, branch2) = (branch % BRANCHES, branch / BRANCHES);
        let p1 = self.tree1.probability(i, index1, branch1);
        let p2 = self.tree2.probability(i, index2, branch2);
        p1 * p2 + self.rho * self.m[branch1][branch2] / 36.0
    }

    /// Number of branches per node.
    pub fn branches(&self) -> usize {
        BRANCHES * BRANCHES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::TimeGrid;
    use approx::assert_abs_diff_eq;
    use qn_processes::OrnsteinUhlenbeckProcess;

    fn lattice(rho: Real) -> Lattice2D {
        let grid = TimeGrid::new(1.0, 10).unwrap();
        let x = OrnsteinUhlenbeckProcess::new(0.1, 0.01, 0.0, 0.0);
        let y = OrnsteinUhlenbeckProcess::new(0.3, 0.008, 0.0, 0.0);
        let t1 = TrinomialTree::new(&x, &grid, false).unwrap();
        let t2 = TrinomialTree::new(&y, &grid, false).unwrap();
        Lattice2D::new(t1, t2, rho).unwrap()
    }

    #[test]
    fn probabilities_sum_to_one_and_descendants_are_valid() {
        let l = lattice(-0.4);
        for i in 0..10 {
            assert_eq!(l.size(i), l.tree1().size(i) * l.tree2().size(i));
            for index in 0..l.size(i) {
                let s: Real = (0..9).map(|b| l.probability(i, index, b)).sum();
                assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
                for b in 0..9 {
                    assert!(l.descendant(i, index, b) < l.size(i + 1));
                }
            }
        }
    }

    #[test]
    fn correlation_shows_in_covariance() {
        let rho = 0.5;
        let l = lattice(rho);
        // at the root: E[dx dy] / (sd_x sd_y) ≈ ρ
        let (x0, y0) = l.underlyings(0, 0);
        let (mut cxy, mut vx, mut vy, mut mx, mut my) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for b in 0..9 {
            let p = l.probability(0, 0, b);
            let (x, y) = l.underlyings(1, l.descendant(0, 0, b));
            mx += p * (x - x0);
            my += p * (y - y0);
            cxy += p * (x - x0) * (y - y0);
            vx += p * (x - x0) * (x - x0);
            vy += p * (y - y0) * (y - y0);
        }
        let corr = (cxy - mx * my) / ((vx - mx * mx) * (vy - my * my)).sqrt();
        assert_abs_diff_eq!(corr, rho, epsilon = 0.05);
    }
}
