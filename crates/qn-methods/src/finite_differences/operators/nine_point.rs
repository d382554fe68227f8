//! Nine-point stencils in a plane spanned by two directions.

use super::derivatives::first_derivative_stencil;
use super::FdmLinearOp;
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{Real, Size};
use qn_math::Array;
use std::sync::Arc;

/// Operator with a 3×3 stencil per grid point in the plane of directions
/// `d0` and `d1`. `a[k][l]` weights the neighbour at offset `(k − 1, l − 1)`.
#[derive(Debug, Clone)]
pub struct NinePointLinearOp {
    d0: usize,
    d1: usize,
    index: Vec<[[Size; 3]; 3]>,
    a: Vec<[[Real; 3]; 3]>,
    mesher: Arc<dyn FdmMesher>,
}

impl NinePointLinearOp {
    /// Zero operator in the plane `(d0, d1)`.
    pub fn new(d0: usize, d1: usize, mesher: Arc<dyn FdmMesher>) -> Self {
        let layout = mesher.layout();
        let mut index = vec![[[0; 3]; 3]; layout.size()];
        for iter in layout.iter() {
            let i = iter.index();
            for (k, row) in index[i].iter_mut().enumerate() {
                for (l, slot) in row.iter_mut().enumerate() {
                    *slot = layout.neighbourhood2(&iter, d0, k as isize - 1, d1, l as isize - 1);
                }
            }
        }
        Self {
            d0,
            d1,
            a: vec![[[0.0; 3]; 3]; layout.size()],
            index,
            mesher,
        }
    }

    /// The two directions of the plane.
    pub fn directions(&self) -> (usize, usize) {
        (self.d0, self.d1)
    }

    /// Row `i` scaled by `u_i`.
    pub fn mult(&self, u: &Array) -> Self {
        let mut ret = self.clone();
        for (i, stencil) in ret.a.iter_mut().enumerate() {
            for w in stencil.iter_mut().flatten() {
                *w *= u[i];
            }
        }
        ret
    }

    /// The mesher the operator lives on.
    pub fn mesher(&self) -> &Arc<dyn FdmMesher> {
        &self.mesher
    }
}

impl FdmLinearOp for NinePointLinearOp {
    fn apply(&self, r: &Array) -> Array {
        Array::from_fn(self.a.len(), |i| {
            let mut s = 0.0;
            for k in 0..3 {
                for l in 0..3 {
                    s += self.a[i][k][l] * r[self.index[i][k][l]];
                }
            }
            s
        })
    }
}

/// `∂²/∂x∂y` as the product of the first derivative stencils along both
/// directions (one-sided on the boundaries).
#[derive(Debug, Clone)]
pub struct SecondOrderMixedDerivativeOp(NinePointLinearOp);

impl SecondOrderMixedDerivativeOp {
    /// Operator in the plane `(d0, d1)`.
    pub fn new(d0: usize, d1: usize, mesher: Arc<dyn FdmMesher>) -> Self {
        let mut op = NinePointLinearOp::new(d0, d1, Arc::clone(&mesher));
        let layout = mesher.layout();
        let last0 = layout.dim()[d0] - 1;
        let last1 = layout.dim()[d1] - 1;
        for iter in layout.iter() {
            let i = iter.index();
            let c0 = iter.coordinates()[d0];
            let c1 = iter.coordinates()[d1];
            let w0 = first_derivative_stencil(
                mesher.dminus(&iter, d0),
                mesher.dplus(&iter, d0),
                c0 == 0,
                c0 == last0,
            );
            let w1 = first_derivative_stencil(
                mesher.dminus(&iter, d1),
                mesher.dplus(&iter, d1),
                c1 == 0,
                c1 == last1,
            );
            for k in 0..3 {
                for l in 0..3 {
                    op.a[i][k][l] = w0[k] * w1[l];
                }
            }
        }
        Self(op)
    }

    /// Row `i` scaled by `u_i`.
    pub fn mult(&self, u: &Array) -> NinePointLinearOp {
        self.0.mult(u)
    }
}

impl From<SecondOrderMixedDerivativeOp> for NinePointLinearOp {
    fn from(op: SecondOrderMixedDerivativeOp) -> Self {
        op.0
    }
}

impl FdmLinearOp for SecondOrderMixedDerivativeOp {
    fn apply(&self, r: &Array) -> Array {
        self.0.apply(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmMesherComposite, Uniform1dMesher};
    use approx::assert_abs_diff_eq;

    #[test]
    fn mixed_derivative_of_bilinear_function() {
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(0.0, 1.0, 6).unwrap(),
            Uniform1dMesher::new(-1.0, 1.0, 9).unwrap(),
        ));
        let x = mesher.locations(0);
        let y = mesher.locations(1);
        let f = Array::from_fn(x.size(), |i| 2.0 * x[i] * y[i] + x[i] * x[i] + 3.0 * y[i]);
        let d = SecondOrderMixedDerivativeOp::new(0, 1, Arc::clone(&mesher)).apply(&f);
        // exact everywhere, one-sided stencils included
        for i in 0..x.size() {
            assert_abs_diff_eq!(d[i], 2.0, epsilon = 1e-9);
        }
    }
}
