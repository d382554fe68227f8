//! Linear operators on finite-difference grids.
//!
//! # Overview
//!
//! * [`FdmLinearOp`]: anything that maps grid values to grid values
//! * [`TripleBandLinearOp`], [`FirstDerivativeOp`], [`SecondDerivativeOp`]:
//!   tridiagonal operators along one direction
//! * [`NinePointLinearOp`], [`SecondOrderMixedDerivativeOp`]: stencils in
//!   a plane, used for correlation terms
//! * [`FdmLinearOpComposite`]: a PDE operator split into directional
//!   parts and a mixed part, as required by the splitting schemes, with
//!   implementations for Black-Scholes, Heston, Hull-White and G2++

mod black_scholes_op;
mod derivatives;
mod g2_op;
mod heston_op;
mod hull_white_op;
mod nine_point;
mod triple_band;

pub use black_scholes_op::FdmBlackScholesOp;
pub use derivatives::{FirstDerivativeOp, SecondDerivativeOp};
pub use g2_op::FdmG2Op;
pub use heston_op::FdmHestonOp;
pub use hull_white_op::FdmHullWhiteOp;
pub use nine_point::{NinePointLinearOp, SecondOrderMixedDerivativeOp};
pub use triple_band::TripleBandLinearOp;

use qn_core::{errors::Result, Real, Time};
use qn_math::Array;

/// A linear map on grid values.
pub trait FdmLinearOp: std::fmt::Debug + Send + Sync {
    /// `L r`.
    fn apply(&self, r: &Array) -> Array;
}

/// PDE operator `A = Σ_d A_d + A_mixed` split by direction.
///
/// `apply` is the full operator; it equals the sum of `apply_direction`
/// over all directions plus `apply_mixed`.
pub trait FdmLinearOpComposite: FdmLinearOp {
    /// Number of splitting directions.
    fn size(&self) -> usize;

    /// Freeze time-dependent coefficients for a step from `t1` to `t2`.
    fn set_time(&mut self, t1: Time, t2: Time);

    /// Mixed-derivative part.
    fn apply_mixed(&self, r: &Array) -> Array;

    /// Part acting along `direction` (zero for directions the operator
    /// does not act on).
    fn apply_direction(&self, direction: usize, r: &Array) -> Array;

    /// Solve `(I − dt · A_direction) x = r`.
    fn solve_splitting(&self, direction: usize, r: &Array, dt: Real) -> Result<Array>;

    /// Approximate inverse of `I − dt · A`, used by iterative solvers.
    fn preconditioner(&self, r: &Array, dt: Real) -> Result<Array>;
}
