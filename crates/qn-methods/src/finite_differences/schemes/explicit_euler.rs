use super::implicit_euler::implicit_step;
use super::{begin_step, FdmScheme};
use crate::finite_differences::boundary::FdmBoundaryConditionSet;
use crate::finite_differences::operators::FdmLinearOpComposite;
use qn_core::{errors::Result, Real, Time};
use qn_math::Array;

/// `V(t − dt) = V(t) + θ dt A V(t)`.
pub(crate) fn explicit_step(
    op: &mut dyn FdmLinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    values: &mut Array,
    t: Time,
    dt: Option<Time>,
    theta: Real,
) -> Result<()> {
    let dt = begin_step(op, bc_set, t, dt)?;
    bc_set.apply_before_applying(op);
    *values += &(op.apply(values) * (theta * dt));
    bc_set.apply_after_applying(values);
    Ok(())
}

/// Explicit Euler: first order, stable only for `dt` of the order of the
/// squared grid spacing.
#[derive(Debug)]
pub struct ExplicitEulerScheme<'a> {
    dt: Option<Time>,
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
}

impl<'a> ExplicitEulerScheme<'a> {
    /// Scheme over `op` with boundary conditions `bc_set`.
    pub fn new(
        op: &'a mut dyn FdmLinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self { dt: None, op, bc_set }
    }
}

impl FdmScheme for ExplicitEulerScheme<'_> {
    fn set_step(&mut self, dt: Time) {
        self.dt = Some(dt);
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        explicit_step(self.op, self.bc_set, values, t, self.dt, 1.0)
    }
}

/// θ-scheme: an explicit step weighted `1 − θ` followed by an implicit
/// step weighted `θ`.
#[derive(Debug)]
pub struct CrankNicolsonScheme<'a> {
    theta: Real,
    dt: Option<Time>,
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
}

impl<'a> CrankNicolsonScheme<'a> {
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

impl FdmScheme for CrankNicolsonScheme<'_> {
    fn set_step(&mut self, dt: Time) {
        self.dt = Some(dt);
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        if self.theta != 1.0 {
            explicit_step(self.op, self.bc_set, values, t, self.dt, 1.0 - self.theta)?;
        }
        if self.theta != 0.0 {
            implicit_step(self.op, self.bc_set, values, t, self.dt, self.theta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::black_scholes_op;
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn crank_nicolson_is_the_average_of_both_eulers_for_a_bond() {
        let (mut op, x) = black_scholes_op();
        let mut bc = FdmBoundaryConditionSet::new();
        let mut cn = CrankNicolsonScheme::new(0.5, &mut op, &mut bc);
        let dt = 0.1;
        cn.set_step(dt);
        let mut values = Array::from_element(x.size(), 1.0);
        cn.step(&mut values, 1.0).unwrap();
        let r: Real = 0.05;
        let expected = (1.0 - 0.5 * r * dt) / (1.0 + 0.5 * r * dt);
        assert_abs_diff_eq!(values[75], expected, epsilon = 1e-10);
    }
}
