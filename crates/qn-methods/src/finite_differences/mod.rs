//! Finite-difference framework for pricing PDEs.
//!
//! # Overview
//!
//! * [`FdmLinearOpLayout`]: flat indexing of a multi-dimensional grid
//! * meshers: [`Fdm1dMesher`] and its builders, combined by
//!   [`FdmMesherComposite`]
//! * operators: banded derivative operators and the model PDE operators
//!   implementing [`FdmLinearOpComposite`]
//! * [`BoundaryCondition`]s and [`StepCondition`]s
//! * schemes: explicit/implicit Euler, Crank-Nicolson and the ADI family,
//!   selected by [`FdmSchemeDesc`]
//! * [`FdmBackwardSolver`] and the grid solvers on top of it
//!
//! Values are rolled back from maturity to time zero; the time argument of
//! a step is the later end of the step.

mod backward_solver;
mod boundary;
mod inner_value;
mod layout;
mod mesher_composite;
mod meshers;
mod operators;
mod schemes;
mod solvers;
mod step_conditions;

pub use backward_solver::FdmBackwardSolver;
pub use boundary::{BoundaryCondition, FdmBoundaryConditionSet, FdmDirichletBoundary, Side};
pub use inner_value::{
    AffineStateModel, FdmAffineSwapInnerValue, FdmInnerValueCalculator, FdmLogInnerValue,
};
pub use layout::{FdmLinearOpIterator, FdmLinearOpLayout};
pub use mesher_composite::{FdmMesher, FdmMesherComposite};
pub use meshers::{
    Concentrating1dMesher, Fdm1dMesher, FdmBlackScholesMesher, FdmHestonVarianceMesher,
    FdmSimpleProcess1dMesher, Uniform1dMesher,
};
pub use operators::{
    FdmBlackScholesOp, FdmG2Op, FdmHestonOp, FdmHullWhiteOp, FdmLinearOp, FdmLinearOpComposite,
    FirstDerivativeOp, NinePointLinearOp, SecondDerivativeOp, SecondOrderMixedDerivativeOp,
    TripleBandLinearOp,
};
pub use schemes::{
    CraigSneydScheme, CrankNicolsonScheme, DouglasScheme, ExplicitEulerScheme, FdmScheme,
    FdmSchemeDesc, FdmSchemeKind, HundsdorferScheme, ImplicitEulerScheme,
    ModifiedCraigSneydScheme,
};
pub use solvers::{
    Fdm1DimSolver, Fdm2DimSolver, FdmBlackScholesSolver, FdmG2Solver, FdmHestonSolver,
    FdmHullWhiteSolver, FdmSolverDesc,
};
pub use step_conditions::{
    FdmAmericanStepCondition, FdmBermudanStepCondition, FdmSnapshotCondition,
    FdmStepConditionComposite, StepCondition,
};
