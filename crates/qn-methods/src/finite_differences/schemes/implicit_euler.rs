use super::{begin_step, FdmScheme};
use crate::finite_differences::boundary::FdmBoundaryConditionSet;
use crate::finite_differences::operators::FdmLinearOpComposite;
use qn_core::{
    errors::{Error, Result},
    Real, Time,
};
use qn_math::{bicgstab, Array};
use std::cell::RefCell;
use tracing::{trace, warn};

const RELATIVE_TOLERANCE: Real = 1e-8;

/// `(I − θ dt A) V(t − dt) = V(t)`.
///
/// Solved exactly along the single direction of one-dimensional
/// operators, with preconditioned BiCGStab otherwise. A failing
/// preconditioner falls back to the identity for the rest of the solve,
/// and its first error is returned once the solve ends.
pub(crate) fn implicit_step(
    op: &mut dyn FdmLinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    values: &mut Array,
    t: Time,
    dt: Option<Time>,
    theta: Real,
) -> Result<()> {
    let dt = begin_step(op, bc_set, t, dt)?;
    let op: &dyn FdmLinearOpComposite = op;
    bc_set.apply_before_solving(op, values);
    let theta_dt = theta * dt;

    let mut solution = if op.size() == 1 {
        op.solve_splitting(0, values, theta_dt)?
    } else {
        let apply = |r: &Array| r - &(op.apply(r) * theta_dt);
        let precondition_error: RefCell<Option<Error>> = RefCell::new(None);
        let preconditioner = |r: &Array| match op.preconditioner(r, theta_dt) {
            Ok(x) => x,
            Err(e) => {
                precondition_error.borrow_mut().get_or_insert(e);
                r.clone()
            }
        };
        let max_iter = values.size().max(10);
        let rhs: &Array = values;
        let result = bicgstab(
            apply,
            rhs,
            Some(rhs),
            RELATIVE_TOLERANCE,
            max_iter,
            Some(&preconditioner),
        );
        if let Some(e) = precondition_error.borrow_mut().take() {
            warn!(error = %e, "preconditioner failed during implicit step");
            return Err(e);
        }
        let result = result?;
        trace!(iterations = result.iterations, error = result.error, "implicit step");
        result.x
    };
    bc_set.apply_after_solving(&mut solution);
    *values = solution;
    Ok(())
}

/// Implicit Euler: first order, unconditionally stable. Used for the
/// damping steps at the start of a rollback.
#[derive(Debug)]
pub struct ImplicitEulerScheme<'a> {
    dt: Option<Time>,
    op: &'a mut dyn FdmLinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
}

impl<'a> ImplicitEulerScheme<'a> {
    /// Scheme over `op` with boundary conditions `bc_set`.
    pub fn new(
        op: &'a mut dyn FdmLinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self { dt: None, op, bc_set }
    }
}

impl FdmScheme for ImplicitEulerScheme<'_> {
    fn set_step(&mut self, dt: Time) {
        self.dt = Some(dt);
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        implicit_step(self.op, self.bc_set, values, t, self.dt, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{
        FdmHestonOp, FdmLinearOp, FdmMesher, FdmMesherComposite, Uniform1dMesher,
    };
    use qn_processes::HestonProcess;
    use qn_termstructures::FlatForward;
    use std::sync::Arc;

    /// `A = −I` in two directions whose preconditioner always fails.
    #[derive(Debug)]
    struct BrokenPreconditioner;

    impl FdmLinearOp for BrokenPreconditioner {
        fn apply(&self, r: &Array) -> Array {
            r * -1.0
        }
    }

    impl FdmLinearOpComposite for BrokenPreconditioner {
        fn size(&self) -> usize {
            2
        }
        fn set_time(&mut self, _t1: Time, _t2: Time) {}
        fn apply_mixed(&self, r: &Array) -> Array {
            Array::zeros(r.size())
        }
        fn apply_direction(&self, direction: usize, r: &Array) -> Array {
            if direction == 0 {
                r * -1.0
            } else {
                Array::zeros(r.size())
            }
        }
        fn solve_splitting(&self, _direction: usize, r: &Array, dt: Real) -> Result<Array> {
            Ok(r / (1.0 + dt))
        }
        fn preconditioner(&self, _r: &Array, _dt: Real) -> Result<Array> {
            Err(Error::Runtime("singular splitting".into()))
        }
    }

    #[test]
    fn iterative_solve_in_two_directions() {
        let process = Arc::new(
            HestonProcess::new(
                Arc::new(FlatForward::new(0.03)),
                Arc::new(FlatForward::new(0.0)),
                100.0,
                0.04,
                2.0,
                0.04,
                0.4,
                -0.5,
            )
            .unwrap(),
        );
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(3.6, 5.6, 41).unwrap(),
            Uniform1dMesher::new(0.0, 0.4, 11).unwrap(),
        ));
        let mut op = FdmHestonOp::new(Arc::clone(&mesher), process);
        let mut bc = FdmBoundaryConditionSet::new();
        let x = mesher.locations(0);
        let rhs = x.map(|x| (x.exp() - 100.0).max(0.0));
        let mut values = rhs.clone();
        let dt = 0.05;
        {
            let mut scheme = ImplicitEulerScheme::new(&mut op, &mut bc);
            scheme.set_step(dt);
            scheme.step(&mut values, 1.0).unwrap();
        }
        // the residual of (I − dt A) v = rhs is small
        let residual = &(&values - &(op.apply(&values) * dt)) - &rhs;
        assert!(residual.norm() / rhs.norm() < 1e-6);
    }

    #[test]
    fn failing_preconditioner_is_reported() {
        let mut op = BrokenPreconditioner;
        let mut bc = FdmBoundaryConditionSet::new();
        let mut values = Array::from_fn(8, |i| i as Real + 1.0);
        let mut scheme = ImplicitEulerScheme::new(&mut op, &mut bc);
        scheme.set_step(0.1);
        let err = scheme.step(&mut values, 1.0).unwrap_err();
        assert_eq!(err, Error::Runtime("singular splitting".into()));
        // values are left untouched on failure
        assert_eq!(values[0], 1.0);
    }
}
