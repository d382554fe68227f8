//! # qn-math
//!
//! Numerical building blocks: `Array`/`Matrix` newtypes over nalgebra,
//! matrix square roots, the normal distribution and Black formula,
//! interpolation, one-dimensional root finding, iterative linear solvers,
//! least-squares regression, random numbers and statistics accumulators.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// One-dimensional real vector.
pub mod array;

/// Floating-point comparison utilities.
pub mod comparison;

/// Normal distribution and the Black formula.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// 1-D and 2-D interpolation.
pub mod interpolations;

/// Linear least-squares regression.
pub mod linear_least_squares;

/// Krylov solvers for operators given as closures.
pub mod linear_solvers;

/// Two-dimensional real matrix.
pub mod matrix;

/// Decompositions and matrix square roots.
pub mod matrix_utilities;

/// Random number generators.
pub mod random_numbers;

/// 1-D root-finding solvers.
pub mod solvers1d;

/// Statistics accumulators.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use comparison::{close, close_enough};
pub use distributions::{black_formula, inverse_cumulative_normal, normal_cdf, normal_pdf};
pub use integrals::simpson;
pub use interpolations::{
    BicubicSpline, Interpolation1D, LinearInterpolation, LogLinearInterpolation,
    NaturalCubicSpline,
};
pub use linear_solvers::{bicgstab, BiCGStabResult};
pub use matrix::Matrix;
pub use matrix_utilities::{
    cholesky_decomposition, pseudo_sqrt, rank_reduced_sqrt, symmetric_eigen, SalvagingAlgorithm,
};
pub use random_numbers::{GaussianRng, GaussianSequenceGenerator, MersenneTwisterUniformRng};
pub use solvers1d::{bisection, brent};
pub use statistics::{SequenceStatistics, Statistics};
