//! First and second derivative operators on non-uniform grids.
//!
//! Interior points use central three-point differences. On the grid
//! boundary the first derivative is one-sided and the second derivative is
//! set to zero.

use super::triple_band::TripleBandLinearOp;
use super::FdmLinearOp;
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_math::Array;
use std::ops::Deref;
use std::sync::Arc;

/// Three-point stencil `(lower, diag, upper)` of `∂/∂x` at a point with
/// spacings `hm` (backwards) and `hp` (forwards).
pub(crate) fn first_derivative_stencil(
    hm: f64,
    hp: f64,
    at_lower: bool,
    at_upper: bool,
) -> [f64; 3] {
    if at_lower {
        [0.0, -1.0 / hp, 1.0 / hp]
    } else if at_upper {
        [-1.0 / hm, 1.0 / hm, 0.0]
    } else {
        let zetam1 = hm * (hm + hp);
        let zeta0 = hm * hp;
        let zetap1 = hp * (hm + hp);
        [-hp / zetam1, (hp - hm) / zeta0, hm / zetap1]
    }
}

macro_rules! band_op_newtype {
    ($name:ident) => {
        impl Deref for $name {
            type Target = TripleBandLinearOp;

            fn deref(&self) -> &TripleBandLinearOp {
                &self.0
            }
        }

        impl From<$name> for TripleBandLinearOp {
            fn from(op: $name) -> TripleBandLinearOp {
                op.0
            }
        }

        impl FdmLinearOp for $name {
            fn apply(&self, r: &Array) -> Array {
                self.0.apply(r)
            }
        }
    };
}

/// `∂/∂x` along one direction.
#[derive(Debug, Clone)]
pub struct FirstDerivativeOp(TripleBandLinearOp);

impl FirstDerivativeOp {
    /// Operator along `direction`.
    pub fn new(direction: usize, mesher: Arc<dyn FdmMesher>) -> Self {
        let mut op = TripleBandLinearOp::new(direction, Arc::clone(&mesher));
        let layout = mesher.layout();
        let last = layout.dim()[direction] - 1;
        for iter in layout.iter() {
            let i = iter.index();
            let c = iter.coordinates()[direction];
            let [l, d, u] = first_derivative_stencil(
                mesher.dminus(&iter, direction),
                mesher.dplus(&iter, direction),
                c == 0,
                c == last,
            );
            op.lower[i] = l;
            op.diag[i] = d;
            op.upper[i] = u;
        }
        Self(op)
    }
}

band_op_newtype!(FirstDerivativeOp);

/// `∂²/∂x²` along one direction.
#[derive(Debug, Clone)]
pub struct SecondDerivativeOp(TripleBandLinearOp);

impl SecondDerivativeOp {
    /// Operator along `direction`.
    pub fn new(direction: usize, mesher: Arc<dyn FdmMesher>) -> Self {
        let mut op = TripleBandLinearOp::new(direction, Arc::clone(&mesher));
        let layout = mesher.layout();
        let last = layout.dim()[direction] - 1;
        for iter in layout.iter() {
            let c = iter.coordinates()[direction];
            if c == 0 || c == last {
                continue;
            }
            let i = iter.index();
            let hm = mesher.dminus(&iter, direction);
            let hp = mesher.dplus(&iter, direction);
            let zetam1 = hm * (hm + hp);
            let zeta0 = hm * hp;
            let zetap1 = hp * (hm + hp);
            op.lower[i] = 2.0 / zetam1;
            op.diag[i] = -2.0 / zeta0;
            op.upper[i] = 2.0 / zetap1;
        }
        Self(op)
    }
}

band_op_newtype!(SecondDerivativeOp);
