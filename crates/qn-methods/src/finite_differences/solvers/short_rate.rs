use super::{Fdm1DimSolver, Fdm2DimSolver, FdmSolverDesc};
use crate::finite_differences::operators::{FdmG2Op, FdmHullWhiteOp};
use crate::finite_differences::schemes::FdmSchemeDesc;
use qn_core::{errors::Result, Real};
use qn_processes::{G2Process, HullWhiteProcess};
use std::sync::Arc;

/// Hull-White PDE on the state variable `x = r − α(t)`.
#[derive(Debug)]
pub struct FdmHullWhiteSolver {
    solver: Fdm1DimSolver,
}

impl FdmHullWhiteSolver {
    /// Solve for `process`.
    pub fn new(
        process: &HullWhiteProcess,
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
    ) -> Result<Self> {
        let op = FdmHullWhiteOp::new(Arc::clone(&desc.mesher), process, 0);
        let solver = Fdm1DimSolver::new(desc, scheme, Box::new(op))?;
        Ok(Self { solver })
    }

    /// Value at state `x`; today's value is at `x = 0`.
    pub fn value_at(&self, x: Real) -> Real {
        self.solver.interpolate_at(x)
    }
}

/// G2++ PDE on the two factors.
#[derive(Debug)]
pub struct FdmG2Solver {
    solver: Fdm2DimSolver,
}

impl FdmG2Solver {
    /// Solve for `process`.
    pub fn new(process: &G2Process, desc: FdmSolverDesc, scheme: FdmSchemeDesc) -> Result<Self> {
        let op = FdmG2Op::new(Arc::clone(&desc.mesher), process, 0, 1);
        let solver = Fdm2DimSolver::new(desc, scheme, Box::new(op))?;
        Ok(Self { solver })
    }

    /// Value at factors `(x, y)`; today's value is at the origin.
    pub fn value_at(&self, x: Real, y: Real) -> Real {
        self.solver.interpolate_at(x, y)
    }
}
