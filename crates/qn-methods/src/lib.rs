//! # qn-methods
//!
//! Numerical methods: the finite-difference PDE framework, lattice
//! (tree) methods with backward induction of discretized assets, and the
//! generic Monte Carlo framework.
//!
//! # Modules
//!
//! * [`finite_differences`]: meshers, operators, boundary and step
//!   conditions, operator-splitting schemes and solvers
//! * [`lattice`]: time grids, binomial and trinomial trees, tree lattices
//!   (one- and two-dimensional), discretized assets
//! * [`monte_carlo`]: paths, path generators, pricers and the Monte Carlo
//!   model including Longstaff-Schwartz regression

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite-difference methods.
pub mod finite_differences;

/// Lattice methods: trees, tree lattices, discretized assets.
pub mod lattice;

/// Monte Carlo simulation: path generation, pricing, statistics.
pub mod monte_carlo;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    Fdm1DimSolver, Fdm2DimSolver, FdmBackwardSolver, FdmLinearOpComposite, FdmMesher,
    FdmMesherComposite, FdmSchemeDesc, FdmSchemeKind, FdmSolverDesc,
};
pub use lattice::{
    BinomialTree, BinomialType, DiscretizedAsset, DiscretizedAssetCore, Lattice, Lattice2D,
    LatticeImpl, TimeGrid, Tree, TreeLattice, TrinomialTree,
};
pub use monte_carlo::{
    LongstaffSchwartzPathPricer, MonteCarloModel, MultiPath, MultiPathGenerator, Path,
    PathGenerator, PathPricer,
};
