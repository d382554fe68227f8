//! G2++ operator on the two Gaussian factors.

use super::{
    FdmLinearOp, FdmLinearOpComposite, FirstDerivativeOp, NinePointLinearOp, SecondDerivativeOp,
    SecondOrderMixedDerivativeOp, TripleBandLinearOp,
};
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;
use qn_processes::G2Process;
use std::sync::Arc;

/// `−a x ∂_x − b y ∂_y + ½σ² ∂_xx + ½η² ∂_yy + ρση ∂_xy − (x + y + φ)`.
///
/// The discount term is split evenly between the two directions.
#[derive(Debug, Clone)]
pub struct FdmG2Op {
    process: G2Process,
    direction1: usize,
    direction2: usize,
    x: Array,
    y: Array,
    dx_map: TripleBandLinearOp,
    dy_map: TripleBandLinearOp,
    corr_map: NinePointLinearOp,
    map_x: TripleBandLinearOp,
    map_y: TripleBandLinearOp,
}

impl FdmG2Op {
    /// Operator with `x` along `direction1` and `y` along `direction2`.
    pub fn new(
        mesher: Arc<dyn FdmMesher>,
        process: &G2Process,
        direction1: usize,
        direction2: usize,
    ) -> Self {
        let x = mesher.locations(direction1);
        let y = mesher.locations(direction2);
        let n = x.size();
        let m = || Arc::clone(&mesher);

        let dx_map = FirstDerivativeOp::new(direction1, m())
            .mult(&x.map(|v| -process.a() * v))
            .add(
                &SecondDerivativeOp::new(direction1, m())
                    .mult(&Array::from_element(n, 0.5 * process.sigma() * process.sigma())),
            );
        let dy_map = FirstDerivativeOp::new(direction2, m())
            .mult(&y.map(|v| -process.b() * v))
            .add(
                &SecondDerivativeOp::new(direction2, m())
                    .mult(&Array::from_element(n, 0.5 * process.eta() * process.eta())),
            );
        let corr_map = SecondOrderMixedDerivativeOp::new(direction1, direction2, m()).mult(
            &Array::from_element(n, process.rho() * process.sigma() * process.eta()),
        );

        Self {
            process: process.clone(),
            direction1,
            direction2,
            x,
            y,
            dx_map,
            dy_map,
            corr_map,
            map_x: TripleBandLinearOp::new(direction1, m()),
            map_y: TripleBandLinearOp::new(direction2, m()),
        }
    }
}

impl FdmLinearOp for FdmG2Op {
    fn apply(&self, r: &Array) -> Array {
        &(&self.map_x.apply(r) + &self.map_y.apply(r)) + &self.apply_mixed(r)
    }
}

impl FdmLinearOpComposite for FdmG2Op {
    fn size(&self) -> usize {
        2
    }

    fn set_time(&mut self, t1: Time, t2: Time) {
        let phi = 0.5 * (self.process.phi(t1) + self.process.phi(t2));
        let hr: Vec<Real> = self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(x, y)| -0.5 * (x + y + phi))
            .collect();
        self.map_x.axpyb(&[], &self.dx_map, &self.dx_map, &hr);
        self.map_y.axpyb(&[], &self.dy_map, &self.dy_map, &hr);
    }

    fn apply_mixed(&self, r: &Array) -> Array {
        self.corr_map.apply(r)
    }

    fn apply_direction(&self, direction: usize, r: &Array) -> Array {
        if direction == self.direction1 {
            self.map_x.apply(r)
        } else if direction == self.direction2 {
            self.map_y.apply(r)
        } else {
            Array::zeros(r.size())
        }
    }

    fn solve_splitting(&self, direction: usize, r: &Array, dt: Real) -> Result<Array> {
        if direction == self.direction1 {
            self.map_x.solve_splitting(r, -dt, 1.0)
        } else if direction == self.direction2 {
            self.map_y.solve_splitting(r, -dt, 1.0)
        } else {
            Ok(r.clone())
        }
    }

    fn preconditioner(&self, r: &Array, dt: Real) -> Result<Array> {
        self.solve_splitting(self.direction1, r, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmMesherComposite, Uniform1dMesher};
    use approx::assert_abs_diff_eq;
    use qn_termstructures::FlatForward;

    #[test]
    fn apply_is_the_sum_of_its_parts() {
        let process =
            G2Process::new(Arc::new(FlatForward::new(0.03)), 0.1, 0.01, 0.3, 0.008, -0.6).unwrap();
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(-0.05, 0.05, 11).unwrap(),
            Uniform1dMesher::new(-0.04, 0.04, 9).unwrap(),
        ));
        let mut op = FdmG2Op::new(Arc::clone(&mesher), &process, 0, 1);
        op.set_time(0.5, 0.75);
        let x = mesher.locations(0);
        let y = mesher.locations(1);
        let u = Array::from_fn(x.size(), |i| (10.0 * x[i]).sin() * (1.0 + 5.0 * y[i] * y[i]));
        let total = op.apply(&u);
        let directional = &op.apply_direction(0, &u) + &op.apply_direction(1, &u);
        let parts = &directional + &op.apply_mixed(&u);
        for i in 0..x.size() {
            assert_abs_diff_eq!(total[i], parts[i], epsilon = 1e-12);
        }
        assert_eq!(op.apply_direction(2, &u).norm(), 0.0);
    }
}
