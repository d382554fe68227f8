//! Solvers that set up the terminal values, roll them back to time zero
//! and interpolate the result.
//!
//! [`Fdm1DimSolver`] and [`Fdm2DimSolver`] are generic over the operator;
//! the model solvers wrap them and translate grid coordinates to market
//! variables (spot instead of log-spot, greeks by the chain rule).

mod black_scholes;
mod fdm_1dim;
mod fdm_2dim;
mod heston;
mod short_rate;

pub use black_scholes::FdmBlackScholesSolver;
pub use fdm_1dim::Fdm1DimSolver;
pub use fdm_2dim::Fdm2DimSolver;
pub use heston::FdmHestonSolver;
pub use short_rate::{FdmG2Solver, FdmHullWhiteSolver};

use super::boundary::FdmBoundaryConditionSet;
use super::inner_value::FdmInnerValueCalculator;
use super::mesher_composite::FdmMesher;
use super::step_conditions::{FdmSnapshotCondition, FdmStepConditionComposite};
use qn_core::{ensure, errors::Result, Real, Size, Time};
use qn_math::Array;
use std::sync::Arc;

/// Everything a solver needs besides the operator and the scheme.
#[derive(Debug)]
pub struct FdmSolverDesc {
    /// Grid.
    pub mesher: Arc<dyn FdmMesher>,
    /// Boundary conditions.
    pub bc_set: FdmBoundaryConditionSet,
    /// Step conditions (early exercise).
    pub condition: FdmStepConditionComposite,
    /// Terminal payoff and exercise values.
    pub calculator: Arc<dyn FdmInnerValueCalculator>,
    /// Time of the terminal condition.
    pub maturity: Time,
    /// Number of scheme steps.
    pub time_steps: Size,
    /// Number of implicit Euler steps before the scheme takes over.
    pub damping_steps: Size,
}

impl FdmSolverDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.maturity > 0.0, "maturity must be positive, got {}", self.maturity);
        ensure!(self.time_steps > 0, "at least one time step required");
        Ok(())
    }

    /// Cell-averaged terminal values on the grid.
    pub(crate) fn initial_values(&self) -> Array {
        let layout = self.mesher.layout();
        let mut values = Array::zeros(layout.size());
        for iter in layout.iter() {
            values[iter.index()] = self.calculator.avg_inner_value(&iter, self.maturity);
        }
        values
    }
}

/// Snapshot taken shortly after time zero, before the first stopping
/// time, from which theta is estimated.
pub(crate) fn theta_snapshot(
    condition: &FdmStepConditionComposite,
    maturity: Time,
) -> FdmSnapshotCondition {
    let first = condition.stopping_times().first().copied().unwrap_or(maturity);
    FdmSnapshotCondition::new(0.99 * first.min(1.0 / 365.0))
}

/// `(V(t_snapshot) − V(0)) / t_snapshot`.
pub(crate) fn theta_from(snapshot_value: Real, value: Real, snapshot_time: Time) -> Real {
    (snapshot_value - value) / snapshot_time
}
