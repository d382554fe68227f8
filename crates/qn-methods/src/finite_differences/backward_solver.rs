//! Backward rollback of grid values with damping steps and stopping times.

use super::boundary::FdmBoundaryConditionSet;
use super::operators::FdmLinearOpComposite;
use super::schemes::{FdmScheme, FdmSchemeDesc, FdmSchemeKind, ImplicitEulerScheme};
use super::step_conditions::{FdmStepConditionComposite, StepCondition};
use qn_core::{ensure, errors::Result, Time};
use qn_math::Array;
use tracing::debug;

/// Roll values back from `from` to `to` in `steps` equal steps, stopping
/// exactly on every stopping time in between and applying the condition
/// after each step.
pub(crate) fn rollback_with_stops(
    scheme: &mut dyn FdmScheme,
    stopping_times: &[Time],
    condition: &mut FdmStepConditionComposite,
    values: &mut Array,
    from: Time,
    to: Time,
    steps: usize,
) -> Result<()> {
    ensure!(from >= to, "trying to roll back from {from} to {to}");
    ensure!(steps > 0, "rollback needs at least one step");
    let dt = (from - to) / steps as Time;
    let snap = f64::EPSILON.sqrt();
    scheme.set_step(dt);

    if stopping_times.last().is_some_and(|&last| last == from) {
        condition.apply_to(values, from);
    }

    let mut t = from;
    for _ in 0..steps {
        let mut now = t;
        let next = if (to - (t - dt)).abs() < snap { to } else { t - dt };

        let mut hit = false;
        for &stop in stopping_times.iter().rev() {
            if next <= stop && stop < now {
                hit = true;
                scheme.set_step(now - stop);
                scheme.step(values, now)?;
                condition.apply_to(values, stop);
                now = stop;
            }
        }

        if hit {
            if now > next {
                scheme.set_step(now - next);
                scheme.step(values, now)?;
                condition.apply_to(values, next);
            }
            scheme.set_step(dt);
        } else {
            scheme.step(values, now)?;
            condition.apply_to(values, next);
        }
        t -= dt;
    }
    Ok(())
}

/// Owns the operator, the boundary conditions and the step conditions of
/// a problem and rolls values back with a chosen scheme.
#[derive(Debug)]
pub struct FdmBackwardSolver {
    op: Box<dyn FdmLinearOpComposite>,
    bc_set: FdmBoundaryConditionSet,
    condition: FdmStepConditionComposite,
    scheme_desc: FdmSchemeDesc,
}

impl FdmBackwardSolver {
    /// Solver for `op` with boundary and step conditions.
    pub fn new(
        op: Box<dyn FdmLinearOpComposite>,
        bc_set: FdmBoundaryConditionSet,
        condition: FdmStepConditionComposite,
        scheme_desc: FdmSchemeDesc,
    ) -> Self {
        Self {
            op,
            bc_set,
            condition,
            scheme_desc,
        }
    }

    /// The step conditions, with whatever they recorded during rollbacks.
    pub fn condition(&self) -> &FdmStepConditionComposite {
        &self.condition
    }

    /// The scheme in use.
    pub fn scheme_desc(&self) -> FdmSchemeDesc {
        self.scheme_desc
    }

    /// Roll `values` back from `from` to `to`.
    ///
    /// The first `damping_steps` steps use implicit Euler; they cover the
    /// fraction `damping_steps / (steps + damping_steps)` of the interval.
    /// With the implicit Euler scheme itself all steps are plain steps.
    pub fn rollback(
        &mut self,
        values: &mut Array,
        from: Time,
        to: Time,
        steps: usize,
        damping_steps: usize,
    ) -> Result<()> {
        self.scheme_desc.validate()?;
        let all_steps = steps + damping_steps;
        let stopping_times = self.condition.stopping_times().to_vec();
        debug!(
            scheme = ?self.scheme_desc.kind,
            from,
            to,
            steps,
            damping_steps,
            points = values.size(),
            "finite-difference rollback"
        );

        if self.scheme_desc.kind == FdmSchemeKind::ImplicitEuler {
            let mut scheme = ImplicitEulerScheme::new(self.op.as_mut(), &mut self.bc_set);
            return rollback_with_stops(
                &mut scheme,
                &stopping_times,
                &mut self.condition,
                values,
                from,
                to,
                all_steps,
            );
        }

        let damping_to = from - (from - to) * damping_steps as Time / all_steps as Time;
        if damping_steps > 0 {
            let mut damping = ImplicitEulerScheme::new(self.op.as_mut(), &mut self.bc_set);
            rollback_with_stops(
                &mut damping,
                &stopping_times,
                &mut self.condition,
                values,
                from,
                damping_to,
                damping_steps,
            )?;
        }
        if steps > 0 {
            let mut scheme = self.scheme_desc.build(self.op.as_mut(), &mut self.bc_set);
            rollback_with_stops(
                scheme.as_mut(),
                &stopping_times,
                &mut self.condition,
                values,
                damping_to,
                to,
                steps,
            )?;
        }
        Ok(())
    }
}
