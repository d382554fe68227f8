//! Hull-White operator on the state variable `x = r − α(t)`.

use super::{
    FdmLinearOp, FdmLinearOpComposite, FirstDerivativeOp, SecondDerivativeOp, TripleBandLinearOp,
};
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;
use qn_processes::HullWhiteProcess;
use std::sync::Arc;

/// `−a x ∂V/∂x + ½σ² ∂²V/∂x² − (x + α) V`, with `α` averaged over the
/// current step.
#[derive(Debug, Clone)]
pub struct FdmHullWhiteOp {
    process: HullWhiteProcess,
    direction: usize,
    x: Array,
    dz_map: TripleBandLinearOp,
    map_t: TripleBandLinearOp,
}

impl FdmHullWhiteOp {
    /// Operator along `direction` of `mesher`.
    pub fn new(mesher: Arc<dyn FdmMesher>, process: &HullWhiteProcess, direction: usize) -> Self {
        let x = mesher.locations(direction);
        let n = x.size();
        let drift = x.map(|xi| -process.a() * xi);
        let diffusion = Array::from_element(n, 0.5 * process.sigma() * process.sigma());
        let dz_map = FirstDerivativeOp::new(direction, Arc::clone(&mesher))
            .mult(&drift)
            .add(&SecondDerivativeOp::new(direction, Arc::clone(&mesher)).mult(&diffusion));
        Self {
            process: process.clone(),
            direction,
            x,
            dz_map,
            map_t: TripleBandLinearOp::new(direction, mesher),
        }
    }
}

impl FdmLinearOp for FdmHullWhiteOp {
    fn apply(&self, r: &Array) -> Array {
        self.map_t.apply(r)
    }
}

impl FdmLinearOpComposite for FdmHullWhiteOp {
    fn size(&self) -> usize {
        1
    }

    fn set_time(&mut self, t1: Time, t2: Time) {
        let phi = 0.5 * (self.process.alpha(t1) + self.process.alpha(t2));
        let discount = self.x.map(|x| -(x + phi));
        self.map_t = self.dz_map.add_diagonal(&discount);
    }

    fn apply_mixed(&self, r: &Array) -> Array {
        Array::zeros(r.size())
    }

    fn apply_direction(&self, direction: usize, r: &Array) -> Array {
        if direction == self.direction {
            self.map_t.apply(r)
        } else {
            Array::zeros(r.size())
        }
    }

    fn solve_splitting(&self, direction: usize, r: &Array, dt: Real) -> Result<Array> {
        if direction == self.direction {
            self.map_t.solve_splitting(r, -dt, 1.0)
        } else {
            Ok(r.clone())
        }
    }

    fn preconditioner(&self, r: &Array, dt: Real) -> Result<Array> {
        self.solve_splitting(self.direction, r, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmMesherComposite, Uniform1dMesher};
    use approx::assert_abs_diff_eq;
    use qn_termstructures::FlatForward;

    #[test]
    fn constant_is_discounted_at_the_short_rate() {
        let process = HullWhiteProcess::new(Arc::new(FlatForward::new(0.04)), 0.1, 0.01);
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
            Uniform1dMesher::new(-0.1, 0.1, 21).unwrap(),
        ));
        let mut op = FdmHullWhiteOp::new(Arc::clone(&mesher), &process, 0);
        op.set_time(1.0, 1.0);
        let ones = Array::from_element(21, 1.0);
        let av = op.apply(&ones);
        let x = mesher.locations(0);
        for i in 0..21 {
            assert_abs_diff_eq!(av[i], -(x[i] + process.alpha(1.0)), epsilon = 1e-12);
        }
    }
}
