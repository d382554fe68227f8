use super::{begin_step, directional_sweep, explicit_predictor, FdmScheme};
use crate::finite_differences::boundary::FdmBoundaryConditionSet;
use crate::finite_differences::operators::FdmLinearOpComposite;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;

/// Douglas ADI: an explicit predictor on the full operator followed by
/// one implicit correction per direction.
///
/// Second order in time for `θ = ½` without mixed derivatives, first
/// order otherwise.
#[derive(Debug)]
pub struct DouglasScheme<'a> {
    theta: Real,
    dt: Option<Time>,
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
}

impl<'a> DouglasScheme<'a> {
    /// Scheme with implicit weight `theta`.
    pub fn new(
        theta: Real,
        op: &'a mut dyn FdmLinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            theta,
            dt: None,
            op,
            bc_set,
        }
    }
}

impl FdmScheme for DouglasScheme<'_> {
    fn set_step(&mut self, dt: Time) {
        self.dt = Some(dt);
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        let dt = begin_step(self.op, self.bc_set, t, self.dt)?;
        let y = explicit_predictor(self.op, self.bc_set, values, dt);
        let mut y = directional_sweep(self.op, y, values, self.theta * dt)?;
        self.bc_set.apply_after_solving(&mut y);
        *values = y;
        Ok(())
    }
}
