//! # qn-marketmodels
//!
//! Monte Carlo framework for LIBOR market models: displaced lognormal
//! forwards on a discrete tenor structure, evolved step by step under a
//! chosen numeraire bond.
//!
//! # Overview
//!
//! * [`EvolutionDescription`]: rate times, evolution times and the
//!   numeraire choices compatible with them
//! * [`CurveState`] / [`LmmCurveState`]: forwards, discount ratios, swap
//!   rates and annuities of a simulated curve
//! * [`MarketModel`] / [`FlatVol`]: per-step covariance pseudo-roots
//! * [`BrownianGenerator`]: factor draws per step
//! * [`LmmDriftCalculator`]: no-arbitrage drifts under a bond numeraire
//! * [`MarketModelEvolver`]: [`LogNormalFwdRateEuler`] and the
//!   predictor-corrector [`LogNormalFwdRatePc`]
//! * [`MarketModelMultiProduct`]: forwards, optionlets and coterminal
//!   swaptions
//! * [`AccountingEngine`]: path values deflated by the numeraire
//!
//! ```text
//! MarketModel ──► Evolver ──► CurveState ──► Product ──► cash flows
//!                    ▲                                      │
//!            BrownianGenerator              AccountingEngine ◄┘
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Path-wise valuation.
pub mod accounting_engine;

/// Gaussian factor draws.
pub mod brownian_generator;

/// Simulated curve snapshots.
pub mod curve_state;

/// Drift computation.
pub mod drift_calculator;

/// Time grids and numeraires.
pub mod evolution_description;

/// Forward-rate evolvers.
pub mod evolvers;

/// Covariance structure of the forwards.
pub mod market_model;

/// Simulated products.
pub mod products;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use accounting_engine::{AccountingEngine, MarketModelDiscounter};
pub use brownian_generator::{
    BrownianGenerator, BrownianGeneratorFactory, MtBrownianGenerator, MtBrownianGeneratorFactory,
};
pub use curve_state::{CurveState, LmmCurveState};
pub use drift_calculator::LmmDriftCalculator;
pub use evolution_description::{
    check_compatibility, is_in_money_market_measure, is_in_money_market_plus_measure,
    is_in_terminal_measure, money_market_measure, money_market_plus_measure, terminal_measure,
    EvolutionDescription,
};
pub use evolvers::{LogNormalFwdRateEuler, LogNormalFwdRatePc, MarketModelEvolver};
pub use market_model::{exponential_forward_correlation, FlatVol, MarketModel};
pub use products::{
    CashFlow, MarketModelMultiProduct, MultiStepCoterminalSwaptions, MultiStepForwards,
    MultiStepOptionlets,
};
