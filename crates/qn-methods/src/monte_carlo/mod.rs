//! Monte Carlo simulation framework.
//!
//! # Overview
//!
//! * [`Path`] and [`MultiPath`]: realisations of a process on a time grid
//! * [`PathGenerator`] and [`MultiPathGenerator`]: draw paths of scalar and
//!   multi-dimensional processes, with antithetic mirrors on request
//! * [`PathPricer`] / [`MultiPathPricer`]: discounted payoff of one path
//! * [`MonteCarloModel`]: drives a generator and a pricer and accumulates
//!   [`Statistics`](qn_math::Statistics), optionally with antithetic
//!   averaging and a control variate
//! * [`LongstaffSchwartzPathPricer`]: early exercise by least-squares
//!   regression of continuation values

mod longstaff_schwartz;
mod model;
mod path;
mod path_generator;

pub use longstaff_schwartz::{
    monomial_basis, AmericanPathPricer, BasisFunction, EarlyExercisePathPricer,
    LongstaffSchwartzPathPricer,
};
pub use model::{MonteCarloModel, MultiPathPricer, PathPricer};
pub use path::{MultiPath, Path, Sample};
pub use path_generator::{MultiPathGenerator, PathGenerator, SampleGenerator};
