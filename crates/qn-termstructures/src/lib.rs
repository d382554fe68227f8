//! # qn-termstructures
//!
//! Curves indexed directly by time in years from the reference time `0`:
//!
//! - yield curves ([`YieldTermStructure`]): flat, log-linear discount
//!   interpolation, zero-spreaded;
//! - Black volatility ([`BlackVolTermStructure`]) and local volatility
//!   ([`LocalVolTermStructure`]);
//! - default-probability curves ([`DefaultProbabilityTermStructure`]).
//!
//! Curves are immutable once built and are shared through `Arc`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Black volatility curves.
pub mod black_vol_term_structure;

/// Default-probability (credit) curves.
pub mod default_probability_term_structure;

/// Flat continuously-compounded yield curve.
pub mod flat_forward;

/// Yield curve interpolating discount factors.
pub mod interpolated_discount_curve;

/// Local volatility curves.
pub mod local_vol_term_structure;

/// Common base trait.
pub mod term_structure;

/// Yield curve trait.
pub mod yield_term_structure;

/// Yield curve with a parallel zero-rate spread.
pub mod zero_spreaded_term_structure;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use black_vol_term_structure::{BlackConstantVol, BlackVarianceCurve, BlackVolTermStructure};
pub use default_probability_term_structure::{
    DefaultProbabilityTermStructure, FlatHazardRate, PiecewiseFlatHazardRate,
};
pub use flat_forward::FlatForward;
pub use interpolated_discount_curve::InterpolatedDiscountCurve;
pub use local_vol_term_structure::{LocalConstantVol, LocalVolCurve, LocalVolTermStructure};
pub use term_structure::TermStructure;
pub use yield_term_structure::YieldTermStructure;
pub use zero_spreaded_term_structure::ZeroSpreadedTermStructure;
