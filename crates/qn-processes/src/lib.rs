//! # qn-processes
//!
//! Stochastic processes `dX = μ(t, X) dt + σ(t, X) dW` used by the
//! finite-difference operators, the trees and the Monte Carlo path
//! generators.
//!
//! # Overview
//!
//! - [`StochasticProcess`]: multi-dimensional interface (drift, diffusion,
//!   discretization, `evolve`).
//! - [`StochasticProcess1D`]: scalar convenience trait; every scalar
//!   process is also a one-dimensional [`StochasticProcess`].
//! - Concrete processes: generalized Black-Scholes, Ornstein-Uhlenbeck,
//!   Hull-White, G2++ and Heston.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Generalized Black-Scholes process.
pub mod black_scholes_process;

/// G2++ two-factor Gaussian short-rate process.
pub mod g2_process;

/// Heston stochastic-volatility process.
pub mod heston_process;

/// Hull-White short-rate process fitted to a yield curve.
pub mod hull_white_process;

/// Ornstein-Uhlenbeck process.
pub mod ornstein_uhlenbeck_process;

/// Base traits.
pub mod stochastic_process;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use black_scholes_process::GeneralizedBlackScholesProcess;
pub use g2_process::G2Process;
pub use heston_process::HestonProcess;
pub use hull_white_process::HullWhiteProcess;
pub use ornstein_uhlenbeck_process::OrnsteinUhlenbeckProcess;
pub use stochastic_process::{StochasticProcess, StochasticProcess1D};
