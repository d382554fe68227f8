use super::{Fdm2DimSolver, FdmSolverDesc};
use crate::finite_differences::operators::FdmHestonOp;
use crate::finite_differences::schemes::FdmSchemeDesc;
use qn_core::{errors::Result, Real};
use qn_processes::HestonProcess;
use std::sync::Arc;

/// Heston PDE on log-spot × variance, read back in spot.
#[derive(Debug)]
pub struct FdmHestonSolver {
    solver: Fdm2DimSolver,
}

impl FdmHestonSolver {
    /// Solve for `process`.
    pub fn new(
        process: Arc<HestonProcess>,
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        let op = FdmHestonOp::new(Arc::clone(&desc.mesher), process);
        let solver = Fdm2DimSolver::new(desc, scheme, Box::new(op))?;
        Ok(Self { solver })
    }

    /// The underlying grid solver.
    pub fn solver(&self) -> &Fdm2DimSolver {
        &self.solver
    }

    /// Value at spot `s` and variance `v`.
    pub fn value_at(&self, s: Real, v: Real) -> Real {
        self.solver.interpolate_at(s.ln(), v)
    }

    /// `∂V/∂S`.
    pub fn delta_at(&self, s: Real, v: Real) -> Real {
        self.solver.derivative_x(s.ln(), v) / s
    }

    /// `∂²V/∂S²`.
    pub fn gamma_at(&self, s: Real, v: Real) -> Real {
        let x = s.ln();
        (self.solver.derivative_xx(x, v) - self.solver.derivative_x(x, v)) / (s * s)
    }

    /// `∂V/∂t`.
    pub fn theta_at(&self, s: Real, v: Real) -> Result<Real> {
        self.solver.theta_at(s.ln(), v)
    }
}
