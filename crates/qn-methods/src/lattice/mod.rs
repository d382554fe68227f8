//! Lattice methods.
//!
//! # Overview
//!
//! * [`TimeGrid`]: grid of time points with mandatory nodes
//! * [`Tree`]: recombining trees; [`BinomialTree`] with seven classical
//!   variants and [`TrinomialTree`] for mean-reverting processes
//! * [`Lattice`]: backward induction of [`DiscretizedAsset`]s;
//!   [`TreeLattice`] is the generic implementation over any [`LatticeImpl`]
//! * [`BlackScholesLattice`] and [`Lattice2D`]: concrete lattice
//!   implementations over one tree and two correlated trinomial trees
//! * discretized assets: discount bond, vanilla option, swap, cap/floor
//!   and options on other assets

pub mod binomial_tree;
pub mod black_scholes_lattice;
pub mod discretized_asset;
pub mod discretized_capfloor;
pub mod discretized_swap;
pub mod discretized_vanilla_option;
pub mod lattice_2d;
pub mod tree;
pub mod tree_lattice;
pub mod trinomial_tree;

pub use binomial_tree::{BinomialTree, BinomialType};
pub use black_scholes_lattice::BlackScholesLattice;
pub use discretized_asset::{
    DiscretizedAsset, DiscretizedAssetCore, DiscretizedDiscountBond, DiscretizedOption,
};
pub use discretized_capfloor::{CapFloorPeriods, CapFloorType, DiscretizedCapFloor};
pub use discretized_swap::{DiscretizedSwap, SwapLegs, SwapType};
pub use discretized_vanilla_option::DiscretizedVanillaOption;
pub use lattice_2d::Lattice2D;
pub use tree::Tree;
pub use tree_lattice::{Lattice, LatticeImpl, TreeLattice};
pub use trinomial_tree::TrinomialTree;

use qn_core::{ensure, errors::Result, fail, Time};
use qn_math::close_enough;

// ─── TimeGrid ─────────────────────────────────────────────────────────────────

/// An increasing grid of times starting at zero.
///
/// Grids built from mandatory times contain every mandatory time exactly;
/// between two mandatory times the spacing is regular.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dts: Vec<Time>,
    mandatory_times: Vec<Time>,
}

impl TimeGrid {
    /// Regular grid from 0 to `end` with `steps` intervals.
    pub fn new(end: Time, steps: usize) -> Result<Self> {
        ensure!(end > 0.0, "time grid end must be positive, got {end}");
        ensure!(steps > 0, "time grid needs at least one step");
        let dt = end / steps as Time;
        let mut times: Vec<Time> = (0..=steps).map(|i| i as Time * dt).collect();
        times[steps] = end;
        Ok(Self::from_times(times, vec![end]))
    }

    /// Grid through all `mandatory` times with spacing at most
    /// `max(mandatory) / steps`. With `steps == 0` the spacing is the
    /// smallest distance between mandatory times.
    pub fn with_mandatory_times(mandatory: &[Time], steps: usize) -> Result<Self> {
        ensure!(!mandatory.is_empty(), "empty set of mandatory times");
        let mut mandatory = mandatory.to_vec();
        mandatory.sort_by(|a, b| a.total_cmp(b));
        ensure!(mandatory[0] >= 0.0, "negative times not allowed");
        mandatory.dedup_by(|a, b| close_enough(*a, *b));

        let last = mandatory[mandatory.len() - 1];
        ensure!(last > 0.0, "time grid needs a positive mandatory time");
        let dt_max = if steps == 0 {
            let mut prev = 0.0;
            let mut min_diff = Time::INFINITY;
            for &t in &mandatory {
                if t > prev {
                    min_diff = min_diff.min(t - prev);
                }
                prev = t;
            }
            min_diff
        } else {
            last / steps as Time
        };

        let mut times = vec![0.0];
        let mut period_begin = 0.0;
        for &period_end in &mandatory {
            if period_end > period_begin {
                let ratio = (period_end - period_begin) / dt_max;
                let n = ((ratio - 1.0e-10).ceil() as usize).max(1);
                let dt = (period_end - period_begin) / n as Time;
                for k in 1..n {
                    times.push(period_begin + k as Time * dt);
                }
                times.push(period_end);
            }
            period_begin = period_end;
        }
        Ok(Self::from_times(times, mandatory))
    }

    fn from_times(times: Vec<Time>, mandatory_times: Vec<Time>) -> Self {
        let dts = times.windows(2).map(|w| w[1] - w[0]).collect();
        Self {
            times,
            dts,
            mandatory_times,
        }
    }

    /// Index of `t` on the grid; fails if `t` is not a grid node.
    pub fn index(&self, t: Time) -> Result<usize> {
        let i = self.closest_index(t);
        if close_enough(t, self.times[i]) {
            Ok(i)
        } else {
            fail!(
                "using inadequate time grid: {t} is not a node (closest node {} at index {i})",
                self.times[i]
            )
        }
    }

    /// Index of the grid node closest to `t`.
    pub fn closest_index(&self, t: Time) -> usize {
        let pos = self.times.partition_point(|&x| x < t);
        if pos == 0 {
            0
        } else if pos == self.times.len() {
            self.times.len() - 1
        } else {
            let dt1 = self.times[pos] - t;
            let dt2 = t - self.times[pos - 1];
            if dt1 < dt2 {
                pos
            } else {
                pos - 1
            }
        }
    }

    /// Time of the grid node closest to `t`.
    pub fn closest_time(&self, t: Time) -> Time {
        self.times[self.closest_index(t)]
    }

    /// Time at node `i`.
    pub fn time(&self, i: usize) -> Time {
        self.times[i]
    }

    /// Interval `t_{i+1} − t_i`.
    pub fn dt(&self, i: usize) -> Time {
        self.dts[i]
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Number of intervals.
    pub fn steps(&self) -> usize {
        self.dts.len()
    }

    /// First node (always zero).
    pub fn front(&self) -> Time {
        self.times[0]
    }

    /// Last node.
    pub fn back(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All nodes.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// The mandatory times the grid was built from, sorted.
    pub fn mandatory_times(&self) -> &[Time] {
        &self.mandatory_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn regular_grid() {
        let g = TimeGrid::new(1.0, 4).unwrap();
        assert_eq!(g.size(), 5);
        assert_eq!(g.steps(), 4);
        assert_eq!(g.front(), 0.0);
        assert_eq!(g.back(), 1.0);
        assert_abs_diff_eq!(g.dt(2), 0.25, epsilon = 1e-15);
        assert_eq!(g.index(0.5).unwrap(), 2);
        assert!(g.index(0.3).is_err());
        assert_eq!(g.closest_index(0.3), 1);
        assert_eq!(g.closest_index(7.0), 4);
        assert!(TimeGrid::new(0.0, 4).is_err());
    }

    #[test]
    fn mandatory_times_are_nodes() {
        let g = TimeGrid::with_mandatory_times(&[1.0, 0.3, 0.3, 2.0], 10).unwrap();
        for t in [0.0, 0.3, 1.0, 2.0] {
            assert!(g.index(t).is_ok(), "{t} missing");
        }
        assert_eq!(g.mandatory_times(), &[0.3, 1.0, 2.0]);
        assert!(TimeGrid::with_mandatory_times(&[-1.0, 1.0], 10).is_err());
    }

    #[test]
    fn zero_steps_uses_smallest_gap() {
        let g = TimeGrid::with_mandatory_times(&[0.5, 1.0, 2.0], 0).unwrap();
        assert_eq!(g.steps(), 4);
        assert_abs_diff_eq!(g.dt(3), 0.5, epsilon = 1e-15);
    }

    proptest! {
        #[test]
        fn spacing_never_exceeds_bound(
            mut ts in prop::collection::vec(0.01f64..10.0, 1..6),
            steps in 1usize..60,
        ) {
            let g = TimeGrid::with_mandatory_times(&ts, steps).unwrap();
            ts.sort_by(|a, b| a.total_cmp(b));
            let bound = ts[ts.len() - 1] / steps as f64;
            for i in 0..g.steps() {
                prop_assert!(g.dt(i) <= bound * (1.0 + 1e-9));
                prop_assert!(g.dt(i) > 0.0);
            }
            for t in ts {
                prop_assert!(g.index(t).is_ok());
            }
        }
    }
}
