use super::{theta_from, theta_snapshot, FdmSolverDesc};
use crate::finite_differences::backward_solver::FdmBackwardSolver;
use crate::finite_differences::operators::FdmLinearOpComposite;
use crate::finite_differences::schemes::FdmSchemeDesc;
use crate::finite_differences::step_conditions::FdmSnapshotCondition;
use qn_core::{errors::Result, fail, Real, Time};
use qn_math::{Array, Interpolation1D, NaturalCubicSpline};
use tracing::debug;

/// Rolls a one-dimensional problem back to time zero and interpolates the
/// result with a natural cubic spline.
#[derive(Debug)]
pub struct Fdm1DimSolver {
    x: Vec<Real>,
    values: Array,
    interpolation: NaturalCubicSpline,
    theta_interpolation: Option<NaturalCubicSpline>,
    theta_time: Time,
}

impl Fdm1DimSolver {
    /// Solve with `op` and `scheme`.
    pub fn new(
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        op: Box<dyn FdmLinearOpComposite>,
    ) -> Result<Self> {
        desc.validate()?;
        let mut values = desc.initial_values();
        let x = desc.mesher.locations(0).to_vec();

        let FdmSolverDesc {
            bc_set,
            condition,
            maturity,
            time_steps,
            damping_steps,
            ..
        } = desc;
        let snapshot = theta_snapshot(&condition, maturity);
        let theta_time = snapshot.time();
        let condition = condition.join_snapshot(snapshot);

        let mut solver = FdmBackwardSolver::new(op, bc_set, condition, scheme);
        solver.rollback(&mut values, maturity, 0.0, time_steps, damping_steps)?;
        debug!(points = x.len(), "one-dimensional rollback done");

        let interpolation = NaturalCubicSpline::new(&x, values.as_slice())?;
        let theta_interpolation = solver
            .condition()
            .snapshot()
            .and_then(FdmSnapshotCondition::values)
            .map(|v| NaturalCubicSpline::new(&x, v.as_slice()))
            .transpose()?;
        Ok(Self {
            x,
            values,
            interpolation,
            theta_interpolation,
            theta_time,
        })
    }

    /// Grid coordinates.
    pub fn grid(&self) -> &[Real] {
        &self.x
    }

    /// Values at time zero on the grid.
    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Value at `x`.
    pub fn interpolate_at(&self, x: Real) -> Real {
        self.interpolation.value(x)
    }

    /// `∂V/∂x` at `x`.
    pub fn derivative_x(&self, x: Real) -> Real {
        self.interpolation.derivative(x)
    }

    /// `∂²V/∂x²` at `x`.
    pub fn derivative_xx(&self, x: Real) -> Real {
        self.interpolation.second_derivative(x)
    }

    /// `∂V/∂t` at `x`, from the snapshot taken just after time zero.
    pub fn theta_at(&self, x: Real) -> Result<Real> {
        let Some(theta) = &self.theta_interpolation else {
            fail!("no snapshot recorded, can't calculate theta");
        };
        Ok(theta_from(theta.value(x), self.interpolate_at(x), self.theta_time))
    }
}
