use super::{begin_step, directional_sweep, explicit_predictor, FdmScheme};
use crate::finite_differences::boundary::FdmBoundaryConditionSet;
use crate::finite_differences::operators::FdmLinearOpComposite;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;

/// Hundsdorfer-Verwer ADI: a Douglas stage, then a second sweep on the
/// predictor corrected by `μ dt A (Y − V)`, with the explicit directional
/// terms of the second sweep taken at `Y`.
#[derive(Debug)]
pub struct HundsdorferScheme<'a> {
    theta: Real,
    mu: Real,
    dt: Option<Time>,
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
}

impl<'a> HundsdorferScheme<'a> {
    /// Scheme with weights `theta` and `mu`.
    pub fn new(
        theta: Real,
        mu: Real,
        op: &'a mut dyn FdmLinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            theta,
            mu,
            dt: None,
            op,
            bc_set,
        }
    }
}

impl FdmScheme for HundsdorferScheme<'_> {
    fn set_step(&mut self, dt: Time) {
        self.dt = Some(dt);
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        let dt = begin_step(self.op, self.bc_set, t, self.dt)?;
        let theta_dt = self.theta * dt;
        let y0 = explicit_predictor(self.op, self.bc_set, values, dt);
        let y = directional_sweep(self.op, y0.clone(), values, theta_dt)?;

        self.bc_set.apply_before_applying(self.op);
        let mut yt = y0 + &(self.op.apply(&(&y - &*values)) * (self.mu * dt));
        self.bc_set.apply_after_applying(&mut yt);

        let mut yt = directional_sweep(self.op, yt, &y, theta_dt)?;
        self.bc_set.apply_after_solving(&mut yt);
        *values = yt;
        Ok(())
    }
}
