//! Heston operator on log-spot × variance.

use super::{
    FdmLinearOp, FdmLinearOpComposite, FirstDerivativeOp, NinePointLinearOp, SecondDerivativeOp,
    SecondOrderMixedDerivativeOp, TripleBandLinearOp,
};
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;
use qn_processes::HestonProcess;
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// `(r − q − ½v) ∂_x + ½v ∂_xx + κ(θ − v) ∂_v + ½σ²v ∂_vv + ρσv ∂_xv − r`
/// with `x = ln S` along direction 0 and `v` along direction 1.
///
/// The discount term is split evenly between the two directions.
#[derive(Debug, Clone)]
pub struct FdmHestonOp {
    process: Arc<HestonProcess>,
    half_v: Array,
    dx_map: TripleBandLinearOp,
    dxx_map: TripleBandLinearOp,
    dy_map: TripleBandLinearOp,
    correlation_map: NinePointLinearOp,
    map_x: TripleBandLinearOp,
    map_y: TripleBandLinearOp,
}

impl FdmHestonOp {
    /// Operator on a two-dimensional `mesher`.
    pub fn new(mesher: Arc<dyn FdmMesher>, process: Arc<HestonProcess>) -> Self {
        let v = mesher.locations(1);
        let half_v = &v * 0.5;
        let m = || Arc::clone(&mesher);

        let dxx_map = SecondDerivativeOp::new(0, m()).mult(&half_v);
        let (kappa, theta, sigma) = (process.kappa(), process.theta(), process.sigma());
        let dy_map = SecondDerivativeOp::new(1, m())
            .mult(&(&v * (0.5 * sigma * sigma)))
            .add(&FirstDerivativeOp::new(1, m()).mult(&v.map(|vi| kappa * (theta - vi))));
        let correlation_map =
            SecondOrderMixedDerivativeOp::new(0, 1, m()).mult(&(&v * (process.rho() * sigma)));

        Self {
            dx_map: FirstDerivativeOp::new(0, m()).into(),
            dxx_map,
            dy_map,
            correlation_map,
            map_x: TripleBandLinearOp::new(0, m()),
            map_y: TripleBandLinearOp::new(1, m()),
            half_v,
            process,
        }
    }
}

impl FdmLinearOp for FdmHestonOp {
    fn apply(&self, r: &Array) -> Array {
        &(&self.map_x.apply(r) + &self.map_y.apply(r)) + &self.apply_mixed(r)
    }
}

impl FdmLinearOpComposite for FdmHestonOp {
    fn size(&self) -> usize {
        2
    }

    fn set_time(&mut self, t1: Time, t2: Time) {
        let r = self.process.risk_free_rate().forward_rate(t1, t2);
        let q = self.process.dividend_yield().forward_rate(t1, t2);
        let drift: Vec<Real> = self.half_v.iter().map(|hv| r - q - hv).collect();
        self.map_x.axpyb(&drift, &self.dx_map, &self.dxx_map, &[-0.5 * r]);
        self.map_y.axpyb(&[], &self.dy_map, &self.dy_map, &[-0.5 * r]);
    }

    fn apply_mixed(&self, r: &Array) -> Array {
        self.correlation_map.apply(r)
    }

    fn apply_direction(&self, direction: usize, r: &Array) -> Array {
        match direction {
            0 => self.map_x.apply(r),
            1 => self.map_y.apply(r),
            _ => Array::zeros(r.size()),
        }
    }

    fn solve_splitting(&self, direction: usize, r: &Array, dt: Real) -> Result<Array> {
        match direction {
            0 => self.map_x.solve_splitting(r, -dt, 1.0),
            1 => self.map_y.solve_splitting(r, -dt, 1.0),
            _ => Ok(r.clone()),
        }
    }

    fn preconditioner(&self, r: &Array, dt: Real) -> Result<Array> {
        let tmp = self.solve_splitting(0, r, dt)?;
        self.solve_splitting(1, &tmp, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmMesherComposite, Uniform1dMesher};
    use approx::assert_abs_diff_eq;
    use qn_termstructures::FlatForward;

    #[test]
    fn discounted_forward_is_in_the_kernel() {
        let process = Arc::new(
            HestonProcess::new(
                Arc::new(FlatForward::new(0.05)),
                Arc::new(FlatForward::new(0.01)),
                100.0,
                0.04,
                1.5,
                0.04,
                0.3,
                -0.7,
            )
            .unwrap(),
        );
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(3.5, 5.5, 201).unwrap(),
            Uniform1dMesher::new(0.0, 0.5, 11).unwrap(),
        ));
        let mut op = FdmHestonOp::new(Arc::clone(&mesher), process);
        op.set_time(0.0, 0.1);
        // S e^{−qτ} is independent of v and satisfies A V = −q V
        let x = mesher.locations(0);
        let u = x.map(|x| x.exp());
        let au = op.apply(&u);
        for it in mesher.layout().iter() {
            let c = it.coordinates();
            if c[0] == 0 || c[0] == 200 {
                continue;
            }
            let i = it.index();
            assert_abs_diff_eq!(au[i], -0.01 * u[i], epsilon = 1e-3 * u[i]);
        }
    }

    #[test]
    fn apply_is_the_sum_of_its_parts() {
        let process = Arc::new(
            HestonProcess::new(
                Arc::new(FlatForward::new(0.04)),
                Arc::new(FlatForward::new(0.02)),
                100.0,
                0.09,
                2.0,
                0.06,
                0.5,
                -0.4,
            )
            .unwrap(),
        );
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(4.0, 5.2, 21).unwrap(),
            Uniform1dMesher::new(0.0, 0.6, 13).unwrap(),
        ));
        let mut op = FdmHestonOp::new(Arc::clone(&mesher), process);
        op.set_time(0.25, 0.5);
        let x = mesher.locations(0);
        let v = mesher.locations(1);
        let u = Array::from_fn(x.size(), |i| (3.0 * x[i]).cos() * (1.0 + 4.0 * v[i] * v[i]));
        let total = op.apply(&u);
        let directional = &op.apply_direction(0, &u) + &op.apply_direction(1, &u);
        let parts = &directional + &op.apply_mixed(&u);
        for i in 0..x.size() {
            assert_abs_diff_eq!(total[i], parts[i], epsilon = 1e-12);
        }
        assert_eq!(op.apply_direction(2, &u).norm(), 0.0);

        // constants are only discounted
        let ones = Array::from_element(x.size(), 1.0);
        let discounted = op.apply(&ones);
        for i in 0..x.size() {
            assert_abs_diff_eq!(discounted[i], -0.04, epsilon = 1e-10);
        }
    }
}
