//! # quantnum
//!
//! Numerical pricing core for quantitative finance: a finite-difference
//! PDE framework, recombining trees, Monte Carlo simulation and LIBOR
//! market models, with the pricing engines built on them.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on it rather than on the individual
//! `qn-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use quantnum::core::{Exercise, OptionType};
//! use quantnum::pricingengines::{
//!     EngineConfig, FdBlackScholesVanillaEngine, PricingEngine, VanillaOptionArgs,
//! };
//! use quantnum::processes::GeneralizedBlackScholesProcess;
//! use quantnum::termstructures::{BlackConstantVol, FlatForward};
//! use std::sync::Arc;
//!
//! let process = Arc::new(GeneralizedBlackScholesProcess::new(
//!     100.0,
//!     Arc::new(FlatForward::new(0.05)),
//!     Arc::new(FlatForward::new(0.0)),
//!     Arc::new(BlackConstantVol::new(0.2)),
//! ));
//! let config = EngineConfig::from_toml_str("[fd]\nx_grid = 200").unwrap();
//! let engine = FdBlackScholesVanillaEngine::from_config(process, &config).unwrap();
//! let put = VanillaOptionArgs::vanilla(
//!     OptionType::Put,
//!     100.0,
//!     Exercise::american(0.0, 1.0).unwrap(),
//! )
//! .unwrap();
//! let results = engine.calculate(&put).unwrap();
//! assert!(results.value > 5.5 && results.value < 6.5);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, payoffs, exercises and errors.
pub use qn_core as core;

/// Arrays, matrices, distributions, interpolation, statistics and
/// random numbers.
pub use qn_math as math;

/// Yield, volatility and default-probability curves.
pub use qn_termstructures as termstructures;

/// Stochastic processes.
pub use qn_processes as processes;

/// Short-rate and stochastic-volatility models.
pub use qn_models as models;

/// Numerical methods (finite differences, lattices, Monte Carlo).
pub use qn_methods as methods;

/// LIBOR market models.
pub use qn_marketmodels as marketmodels;

/// Pricing engines and their configuration.
pub use qn_pricingengines as pricingengines;
