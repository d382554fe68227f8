//! # qn-models
//!
//! Calibratable models: short-rate models with their trees and closed
//! forms, and the Heston stochastic-volatility parameter set.
//!
//! ## Trait hierarchy
//!
//! ```text
//! CalibratedModel
//! ├── ShortRateModel
//! │   ├── OneFactorModel ─ OneFactorAffineModel → Vasicek, HullWhite
//! │   │                                         → BlackKarasinski
//! │   └── TwoFactorModel                        → G2
//! └── (equity)                                  → HestonModel
//! ```
//!
//! `HullWhite` and `G2` also implement the finite-difference
//! `AffineStateModel`, so swaption engines value the exercise payoff on the
//! PDE grid with the same closed-form bonds.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod calibrated_model;
pub mod short_rate_model;

// ── One-factor short-rate models ─────────────────────────────────────────────
pub mod black_karasinski;
pub mod hull_white_model;
pub mod vasicek;

// ── Two-factor short-rate models ─────────────────────────────────────────────
pub mod g2_model;

// ── Equity models ────────────────────────────────────────────────────────────
pub mod heston_model;

// ── Re-exports ───────────────────────────────────────────────────────────────
pub use black_karasinski::BlackKarasinski;
pub use calibrated_model::{
    BoundaryConstraint, CalibratedModel, Constraint, NoConstraint, Parameter, PositiveConstraint,
};
pub use g2_model::G2;
pub use heston_model::HestonModel;
pub use hull_white_model::HullWhite;
pub use short_rate_model::{
    G2Lattice, OneFactorAffineModel, OneFactorModel, ShortRateFitting, ShortRateModel,
    ShortRateTree, TwoFactorModel,
};
pub use vasicek::Vasicek;
