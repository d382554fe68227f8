//! Black-Scholes operator in log-spot.

use super::{
    FdmLinearOp, FdmLinearOpComposite, FirstDerivativeOp, SecondDerivativeOp, TripleBandLinearOp,
};
use crate::finite_differences::mesher_composite::FdmMesher;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;
use qn_processes::GeneralizedBlackScholesProcess;
use qn_termstructures::{BlackVolTermStructure, YieldTermStructure};
use std::sync::Arc;

/// `∂V/∂t + (r − q − ½σ²) ∂V/∂x + ½σ² ∂²V/∂x² − r V` with `x = ln S`.
///
/// Rates are the forward rates over the current step; the volatility is
/// either the Black forward volatility at `strike` or, with local
/// volatility, evaluated per grid point at the middle of the step.
#[derive(Debug, Clone)]
pub struct FdmBlackScholesOp {
    mesher: Arc<dyn FdmMesher>,
    process: Arc<GeneralizedBlackScholesProcess>,
    strike: Real,
    local_vol: bool,
    illegal_local_vol_overwrite: Option<Real>,
    direction: usize,
    x: Array,
    dx_map: TripleBandLinearOp,
    dxx_map: TripleBandLinearOp,
    map_t: TripleBandLinearOp,
}

impl FdmBlackScholesOp {
    /// Operator along `direction` of `mesher`. With `local_vol` the
    /// process local volatility is used; non-finite or negative local
    /// variances are replaced by `illegal_local_vol_overwrite²` when given.
    pub fn new(
        mesher: Arc<dyn FdmMesher>,
        process: Arc<GeneralizedBlackScholesProcess>,
        strike: Real,
        local_vol: bool,
        illegal_local_vol_overwrite: Option<Real>,
        direction: usize,
    ) -> Self {
        let x = mesher.locations(direction);
        Self {
            dx_map: FirstDerivativeOp::new(direction, Arc::clone(&mesher)).into(),
            dxx_map: SecondDerivativeOp::new(direction, Arc::clone(&mesher)).into(),
            map_t: TripleBandLinearOp::new(direction, Arc::clone(&mesher)),
            mesher,
            process,
            strike,
            local_vol,
            illegal_local_vol_overwrite,
            direction,
            x,
        }
    }

    fn local_variance(&self, t: Time, x: Real) -> Real {
        let v = self.process.local_vol(t, x.exp());
        let v2 = v * v;
        match self.illegal_local_vol_overwrite {
            Some(o) if !v2.is_finite() || v2 < 0.0 => o * o,
            _ => v2,
        }
    }
}

impl FdmLinearOp for FdmBlackScholesOp {
    fn apply(&self, r: &Array) -> Array {
        self.map_t.apply(r)
    }
}

impl FdmLinearOpComposite for FdmBlackScholesOp {
    fn size(&self) -> usize {
        1
    }

    fn set_time(&mut self, t1: Time, t2: Time) {
        let r = self.process.risk_free_rate().forward_rate(t1, t2);
        let q = self.process.dividend_yield().forward_rate(t1, t2);

        if self.local_vol {
            let tm = 0.5 * (t1 + t2);
            let v = Array::from_fn(self.x.size(), |i| self.local_variance(tm, self.x[i]));
            let drift: Vec<Real> = v.iter().map(|vi| r - q - 0.5 * vi).collect();
            let half_v = v * 0.5;
            self.map_t
                .axpyb(&drift, &self.dx_map, &self.dxx_map.mult(&half_v), &[-r]);
        } else {
            let v = self
                .process
                .black_volatility()
                .black_forward_variance(t1, t2, self.strike)
                / (t2 - t1);
            let half_v = Array::from_element(self.mesher.layout().size(), 0.5 * v);
            self.map_t
                .axpyb(&[r - q - 0.5 * v], &self.dx_map, &self.dxx_map.mult(&half_v), &[-r]);
        }
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
