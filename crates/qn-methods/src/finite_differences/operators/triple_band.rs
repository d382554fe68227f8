//! Tridiagonal operator along one direction of a multi-dimensional grid.

use super::FdmLinearOp;
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{ensure, errors::Result, Real, Size};
use qn_math::Array;
use std::sync::Arc;

/// Operator acting on each grid line along `direction` as a tridiagonal
/// matrix: `(L u)_i = lower_i u_{i−1} + diag_i u_i + upper_i u_{i+1}`.
///
/// The bands are stored per grid point; `lower` must vanish on the first
/// point of each line and `upper` on the last one.
#[derive(Debug, Clone)]
pub struct TripleBandLinearOp {
    direction: usize,
    i0: Vec<Size>,
    i2: Vec<Size>,
    reverse_index: Vec<Size>,
    pub(crate) lower: Vec<Real>,
    pub(crate) diag: Vec<Real>,
    pub(crate) upper: Vec<Real>,
    mesher: Arc<dyn FdmMesher>,
}

/// `v[i]` with a length-one slice broadcast to every index.
#[inline]
fn broadcast(v: &[Real], i: usize) -> Real {
    if v.len() == 1 {
        v[0]
    } else {
        v[i]
    }
}

impl TripleBandLinearOp {
    /// Zero operator along `direction`.
    pub fn new(direction: usize, mesher: Arc<dyn FdmMesher>) -> Self {
        let layout = mesher.layout();
        let size = layout.size();

        // index ordering in which `direction` runs fastest, so that each
        // grid line is contiguous for the Thomas sweep
        let mut new_dim = layout.dim().to_vec();
        new_dim.swap(0, direction);
        let mut new_spacing = crate::finite_differences::FdmLinearOpLayout::new(new_dim)
            .spacing()
            .to_vec();
        new_spacing.swap(0, direction);

        let mut i0 = vec![0; size];
        let mut i2 = vec![0; size];
        let mut reverse_index = vec![0; size];
        for iter in layout.iter() {
            let i = iter.index();
            i0[i] = layout.neighbourhood(&iter, direction, -1);
            i2[i] = layout.neighbourhood(&iter, direction, 1);
            let new_index: Size = iter
                .coordinates()
                .iter()
                .zip(&new_spacing)
                .map(|(c, s)| c * s)
                .sum();
            reverse_index[new_index] = i;
        }
        Self {
            direction,
            i0,
            i2,
            reverse_index,
            lower: vec![0.0; size],
            diag: vec![0.0; size],
            upper: vec![0.0; size],
            mesher,
        }
    }

    fn with_bands(&self, lower: Vec<Real>, diag: Vec<Real>, upper: Vec<Real>) -> Self {
        Self {
            direction: self.direction,
            i0: self.i0.clone(),
            i2: self.i2.clone(),
            reverse_index: self.reverse_index.clone(),
            lower,
            diag,
            upper,
            mesher: Arc::clone(&self.mesher),
        }
    }

    /// Direction the operator acts along.
    pub fn direction(&self) -> usize {
        self.direction
    }

    /// The mesher the operator lives on.
    pub fn mesher(&self) -> &Arc<dyn FdmMesher> {
        &self.mesher
    }

    /// Number of grid points.
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// `self + m` (both along the same direction).
    pub fn add(&self, m: &TripleBandLinearOp) -> Self {
        debug_assert_eq!(self.direction, m.direction);
        let zip = |a: &[Real], b: &[Real]| a.iter().zip(b).map(|(x, y)| x + y).collect();
        self.with_bands(
            zip(&self.lower, &m.lower),
            zip(&self.diag, &m.diag),
            zip(&self.upper, &m.upper),
        )
    }

    /// `self + diag(u)`.
    pub fn add_diagonal(&self, u: &Array) -> Self {
        let diag = self.diag.iter().zip(u.iter()).map(|(d, x)| d + x).collect();
        self.with_bands(self.lower.clone(), diag, self.upper.clone())
    }

    /// `diag(u) · self`: row `i` scaled by `u_i`.
    pub fn mult(&self, u: &Array) -> Self {
        let scale = |band: &[Real]| band.iter().zip(u.iter()).map(|(b, s)| b * s).collect();
        self.with_bands(scale(&self.lower), scale(&self.diag), scale(&self.upper))
    }

    /// `self · diag(u)`: each band scaled by the value at the point it
    /// multiplies.
    ///
    /// Neighbours are taken in flat index order (`i ± 1`), so the result is
    /// exact only for operators along direction 0.
    pub fn mult_r(&self, u: &Array) -> Result<Self> {
        let n = self.size();
        ensure!(u.size() == n, "inconsistent size of rhs: {} vs {n}", u.size());
        let mut lower = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut upper = vec![0.0; n];
        for i in 0..n {
            let sm1 = if i > 0 { u[i - 1] } else { 1.0 };
            let sp1 = if i + 1 < n { u[i + 1] } else { 1.0 };
            lower[i] = self.lower[i] * sm1;
            diag[i] = self.diag[i] * u[i];
            upper[i] = self.upper[i] * sp1;
        }
        Ok(self.with_bands(lower, diag, upper))
    }

    /// Set `self = y + diag(a) · x + diag(b)`.
    ///
    /// `a` and `b` may be empty (term dropped), of length one (broadcast)
    /// or of the grid size.
    pub fn axpyb(
        &mut self,
        a: &[Real],
        x: &TripleBandLinearOp,
        y: &TripleBandLinearOp,
        b: &[Real],
    ) {
        for i in 0..self.size() {
            let (mut l, mut d, mut u) = (y.lower[i], y.diag[i], y.upper[i]);
            if !a.is_empty() {
                let s = broadcast(a, i);
                l += s * x.lower[i];
                d += s * x.diag[i];
                u += s * x.upper[i];
            }
            if !b.is_empty() {
                d += broadcast(b, i);
            }
            self.lower[i] = l;
            self.diag[i] = d;
            self.upper[i] = u;
        }
    }

    /// Solve `(a · L + b · I) x = r` line by line with the Thomas
    /// algorithm.
    pub fn solve_splitting(&self, r: &Array, a: Real, b: Real) -> Result<Array> {
        let n = self.size();
        ensure!(r.size() == n, "inconsistent size of rhs: {} vs {n}", r.size());
        let mut ret = Array::zeros(n);
        let mut tmp = vec![0.0; n];

        let mut rim1 = self.reverse_index[0];
        let mut bet = a * self.diag[rim1] + b;
        ensure!(bet != 0.0, "division by zero in tridiagonal solve");
        bet = 1.0 / bet;
        ret[rim1] = r[rim1] * bet;

        for j in 1..n {
            let ri = self.reverse_index[j];
            tmp[j] = a * self.upper[rim1] * bet;
            bet = b + a * (self.diag[ri] - tmp[j] * self.lower[ri]);
            ensure!(bet != 0.0, "division by zero in tridiagonal solve");
            bet = 1.0 / bet;
            ret[ri] = (r[ri] - a * self.lower[ri] * ret[rim1]) * bet;
            rim1 = ri;
        }
        for j in (0..n.saturating_sub(1)).rev() {
            let update = tmp[j + 1] * ret[self.reverse_index[j + 1]];
            ret[self.reverse_index[j]] -= update;
        }
        Ok(ret)
    }
}

impl FdmLinearOp for TripleBandLinearOp {
    fn apply(&self, r: &Array) -> Array {
        debug_assert_eq!(r.size(), self.size());
        Array::from_fn(self.size(), |i| {
            r[self.i0[i]] * self.lower[i] + r[i] * self.diag[i] + r[self.i2[i]] * self.upper[i]
        })
    }
}
