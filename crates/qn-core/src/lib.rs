//! # qn-core
//!
//! Foundational types shared by every crate of the workspace: numeric
//! aliases, the error type with its early-return macros, option payoffs,
//! exercise schedules and position signs.
//!
//! All times are year fractions measured from a common reference time `0`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error type and the `ensure!` / `ensure_post!` / `fail!` macros.
pub mod errors;

/// Exercise schedules (European, American, Bermudan).
pub mod exercise;

/// Option payoffs and the call/put flag.
pub mod payoff;

/// Long/short position.
pub mod position;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Signed integer used for lattice node offsets.
pub type Integer = i32;

/// Alias used for array sizes and indices.
pub type Size = usize;

/// A time measurement in years.
pub type Time = Real;

/// A rate expressed as a decimal (0.05 = 5 %).
pub type Rate = Real;

/// A spread over a reference rate.
pub type Spread = Real;

/// A discount factor in (0, 1].
pub type DiscountFactor = Real;

/// A volatility expressed as a decimal.
pub type Volatility = Real;

/// A probability in [0, 1].
pub type Probability = Real;

/// A price or value.
pub type Price = Real;

/// Tolerance used when deciding whether two times coincide.
pub const TIME_EPSILON: Time = 1.0e-10;

/// Return `true` if `t1` and `t2` denote the same point in time.
#[inline]
pub fn same_time(t1: Time, t2: Time) -> bool {
    (t1 - t2).abs() <= TIME_EPSILON * (1.0 + t1.abs().max(t2.abs()))
}

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use exercise::{Exercise, ExerciseType};
pub use payoff::{
    AssetOrNothingPayoff, CashOrNothingPayoff, OptionType, Payoff, PlainVanillaPayoff,
    StrikedPayoff,
};
pub use position::Position;
