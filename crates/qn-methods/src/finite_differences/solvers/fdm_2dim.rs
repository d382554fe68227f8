use super::{theta_from, theta_snapshot, FdmSolverDesc};
use crate::finite_differences::backward_solver::FdmBackwardSolver;
use crate::finite_differences::operators::FdmLinearOpComposite;
use crate::finite_differences::schemes::FdmSchemeDesc;
use crate::finite_differences::step_conditions::FdmSnapshotCondition;
use qn_core::{ensure, errors::Result, fail, Real, Time};
use qn_math::{Array, BicubicSpline};
use tracing::debug;

/// Rolls a two-dimensional problem back to time zero and interpolates the
/// result with a bicubic spline.
#[derive(Debug)]
pub struct Fdm2DimSolver {
    x: Vec<Real>,
    y: Vec<Real>,
    values: Array,
    interpolation: BicubicSpline,
    theta_interpolation: Option<BicubicSpline>,
    theta_time: Time,
}

impl Fdm2DimSolver {
    /// Solve with `op` and `scheme`.
    pub fn new(
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        op: Box<dyn FdmLinearOpComposite>,
    ) -> Result<Self> {
        desc.validate()?;
        let layout = desc.mesher.layout();
        ensure!(
            layout.dim().len() == 2,
            "two-dimensional mesher required, got {} dimensions",
            layout.dim().len()
        );
        let mut x = Vec::with_capacity(layout.dim()[0]);
        let mut y = Vec::with_capacity(layout.dim()[1]);
        for iter in layout.iter() {
            let c = iter.coordinates();
            if c[1] == 0 {
                x.push(desc.mesher.location(&iter, 0));
            }
            if c[0] == 0 {
                y.push(desc.mesher.location(&iter, 1));
            }
        }
        let mut values = desc.initial_values();

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
        debug!(nx = x.len(), ny = y.len(), "two-dimensional rollback done");

        // the layout runs x fastest, which is the row-major order of the spline
        let interpolation = BicubicSpline::new(&x, &y, values.as_slice())?;
        let theta_interpolation = solver
            .condition()
            .snapshot()
            .and_then(FdmSnapshotCondition::values)
            .map(|v| BicubicSpline::new(&x, &y, v.as_slice()))
            .transpose()?;
        Ok(Self {
            x,
            y,
            values,
            interpolation,
            theta_interpolation,
            theta_time,
        })
    }

    /// Grid coordinates along the first direction.
    pub fn grid_x(&self) -> &[Real] {
        &self.x
    }

    /// Grid coordinates along the second direction.
    pub fn grid_y(&self) -> &[Real] {
        &self.y
    }

    /// Values at time zero on the grid.
    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Value at `(x, y)`.
    pub fn interpolate_at(&self, x: Real, y: Real) -> Real {
        self.interpolation.value(x, y)
    }

    /// `∂V/∂x`.
    pub fn derivative_x(&self, x: Real, y: Real) -> Real {
        self.interpolation.derivative_x(x, y)
    }

    /// `∂²V/∂x²`.
    pub fn derivative_xx(&self, x: Real, y: Real) -> Real {
        self.interpolation.second_derivative_x(x, y)
    }

    /// `∂V/∂y`.
    pub fn derivative_y(&self, x: Real, y: Real) -> Real {
        self.interpolation.derivative_y(x, y)
    }

    /// `∂²V/∂y²`.
    pub fn derivative_yy(&self, x: Real, y: Real) -> Real {
        self.interpolation.second_derivative_y(x, y)
    }

    /// `∂²V/∂x∂y`.
    pub fn derivative_xy(&self, x: Real, y: Real) -> Real {
        self.interpolation.derivative_xy(x, y)
    }

    /// `∂V/∂t`, from the snapshot taken just after time zero.
    pub fn theta_at(&self, x: Real, y: Real) -> Result<Real> {
        let Some(theta) = &self.theta_interpolation else {
            fail!("no snapshot recorded, can't calculate theta");
        };
        Ok(theta_from(theta.value(x, y), self.interpolate_at(x, y), self.theta_time))
    }
}
