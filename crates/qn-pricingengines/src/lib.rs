//! # qn-pricingengines
//!
//! Pricing engines built on the numerical methods of `qn-methods`, with
//! closed-form references to check them against.
//!
//! ## Engines
//!
//! - [`FdBlackScholesVanillaEngine`]: finite differences on log-spot, optional local vol
//! - [`FdHestonVanillaEngine`]: finite differences on log-spot × variance
//! - [`FdHullWhiteSwaptionEngine`], [`FdG2SwaptionEngine`]: Bermudan swaptions on short-rate grids
//! - [`BinomialVanillaEngine`]: binomial trees of every [`BinomialType`](qn_methods::BinomialType)
//! - [`TreeSwaptionEngine`], [`TreeCapFloorEngine`]: short-rate trinomial trees
//! - [`McEuropeanEngine`], [`McAmericanEngine`], [`McHestonEuropeanEngine`]: Monte Carlo
//! - [`MidPointCdsEngine`]: credit default swaps
//! - [`AnalyticEuropeanEngine`], [`BlackCapFloorEngine`], [`DiscountingSwapEngine`]: closed form
//!
//! Every numerical engine can be built from an [`EngineConfig`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Closed-form Black-Scholes and Black caplet references.
pub mod analytic;
/// Binomial-tree vanilla engine.
pub mod binomial_vanilla_engine;
/// Grid, tree and simulation settings loaded from TOML.
pub mod config;
pub mod discounting_swap_engine;
/// Finite-difference vanilla engine under Black-Scholes.
pub mod fd_black_scholes_vanilla_engine;
/// Finite-difference vanilla engine under Heston.
pub mod fd_heston_vanilla_engine;
pub mod fd_short_rate_swaption_engines;
/// Instrument arguments passed to the engines.
pub mod instruments;
/// Monte Carlo engines.
pub mod mc_engines;
pub mod midpoint_cds_engine;
/// Engine trait and result types.
pub mod results;
pub mod tree_short_rate_engines;

pub use analytic::{
    black_caplet, black_scholes_price, black_scholes_theta, AnalyticEuropeanEngine,
    BlackCapFloorEngine, BlackScholesGreeks,
};
pub use binomial_vanilla_engine::BinomialVanillaEngine;
pub use config::{EngineConfig, FdConfig, McConfig, TreeConfig};
pub use discounting_swap_engine::DiscountingSwapEngine;
pub use fd_black_scholes_vanilla_engine::FdBlackScholesVanillaEngine;
pub use fd_heston_vanilla_engine::FdHestonVanillaEngine;
pub use fd_short_rate_swaption_engines::{FdG2SwaptionEngine, FdHullWhiteSwaptionEngine};
pub use instruments::{
    CapFloorArgs, CdsArgs, ProtectionSide, SwapArgs, SwaptionArgs, VanillaOptionArgs,
};
pub use mc_engines::{McAmericanEngine, McEuropeanEngine, McHestonEuropeanEngine};
pub use midpoint_cds_engine::{CdsResults, MidPointCdsEngine};
pub use results::{OptionResults, PricingEngine, PricingResults};
pub use tree_short_rate_engines::{ShortRateLattice, TreeCapFloorEngine, TreeSwaptionEngine};
