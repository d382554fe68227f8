//! Time-stepping schemes for `∂V/∂t + A V = 0`, stepping backwards.
//!
//! # Overview
//!
//! * [`ExplicitEulerScheme`], [`ImplicitEulerScheme`] and
//!   [`CrankNicolsonScheme`]: classical θ-schemes on the full operator
//! * [`DouglasScheme`], [`CraigSneydScheme`], [`ModifiedCraigSneydScheme`]
//!   and [`HundsdorferScheme`]: alternating-direction implicit schemes that
//!   only solve tridiagonal systems along one direction at a time and
//!   treat the mixed-derivative part explicitly
//! * [`FdmSchemeDesc`]: serializable scheme choice with the usual presets
//!
//! Every scheme borrows the operator and the boundary conditions for the
//! duration of a rollback.

mod craig_sneyd;
mod douglas;
mod explicit_euler;
mod hundsdorfer;
mod implicit_euler;

pub use craig_sneyd::{CraigSneydScheme, ModifiedCraigSneydScheme};
pub use douglas::DouglasScheme;
pub use explicit_euler::{CrankNicolsonScheme, ExplicitEulerScheme};
pub use hundsdorfer::HundsdorferScheme;
pub use implicit_euler::ImplicitEulerScheme;

use super::boundary::FdmBoundaryConditionSet;
use super::operators::FdmLinearOpComposite;
use qn_core::{ensure, errors::Result, Real, Time};
use qn_math::Array;
use serde::{Deserialize, Serialize};

/// One backward time step of size `dt`.
pub trait FdmScheme {
    /// Step size of subsequent calls to [`step`](Self::step).
    fn set_step(&mut self, dt: Time);

    /// Replace the values at `t` by the values at `t − dt`.
    fn step(&mut self, values: &mut Array, t: Time) -> Result<()>;
}

// ── Scheme description ────────────────────────────────────────────────────────

/// Scheme family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FdmSchemeKind {
    /// Explicit Euler.
    ExplicitEuler,
    /// Implicit Euler.
    ImplicitEuler,
    /// Crank-Nicolson with weight `theta` on the implicit half.
    CrankNicolson,
    /// Douglas ADI.
    Douglas,
    /// Craig-Sneyd ADI.
    CraigSneyd,
    /// Modified Craig-Sneyd ADI.
    ModifiedCraigSneyd,
    /// Hundsdorfer-Verwer ADI.
    Hundsdorfer,
    /// Hundsdorfer-Verwer ADI with the `1 − √2/2` weight.
    ModifiedHundsdorfer,
}

/// Scheme family with its weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FdmSchemeDesc {
    /// Family.
    pub kind: FdmSchemeKind,
    /// Implicitness weight.
    pub theta: Real,
    /// Weight of the correction stage.
    pub mu: Real,
}

impl FdmSchemeDesc {
    /// Arbitrary weights.
    pub fn new(kind: FdmSchemeKind, theta: Real, mu: Real) -> Self {
        Self { kind, theta, mu }
    }

    /// Douglas with `θ = ½`.
    pub fn douglas() -> Self {
        Self::new(FdmSchemeKind::Douglas, 0.5, 0.0)
    }

    /// Implicit Euler.
    pub fn implicit_euler() -> Self {
        Self::new(FdmSchemeKind::ImplicitEuler, 0.0, 0.0)
    }

    /// Explicit Euler.
    pub fn explicit_euler() -> Self {
        Self::new(FdmSchemeKind::ExplicitEuler, 0.0, 0.0)
    }

    /// Crank-Nicolson.
    pub fn crank_nicolson() -> Self {
        Self::new(FdmSchemeKind::CrankNicolson, 0.5, 0.0)
    }

    /// Craig-Sneyd with `θ = μ = ½`.
    pub fn craig_sneyd() -> Self {
        Self::new(FdmSchemeKind::CraigSneyd, 0.5, 0.5)
    }

    /// Modified Craig-Sneyd with `θ = μ = ⅓`.
    pub fn modified_craig_sneyd() -> Self {
        Self::new(FdmSchemeKind::ModifiedCraigSneyd, 1.0 / 3.0, 1.0 / 3.0)
    }

    /// Hundsdorfer with `θ = ½ + √3/6`, `μ = ½`.
    pub fn hundsdorfer() -> Self {
        Self::new(FdmSchemeKind::Hundsdorfer, 0.5 + 3.0_f64.sqrt() / 6.0, 0.5)
    }

    /// Hundsdorfer with `θ = 1 − √2/2`, `μ = ½`.
    pub fn modified_hundsdorfer() -> Self {
        Self::new(FdmSchemeKind::ModifiedHundsdorfer, 1.0 - 0.5 * 2.0_f64.sqrt(), 0.5)
    }

    /// Check the weights.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.theta),
            "scheme weight theta must lie in [0, 1], got {}",
            self.theta
        );
        ensure!(
            (0.0..=1.0).contains(&self.mu),
            "scheme weight mu must lie in [0, 1], got {}",
            self.mu
        );
        Ok(())
    }

    /// Scheme over `op` and `bc_set`.
    pub fn build<'a>(
        &self,
        op: &'a mut dyn FdmLinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Box<dyn FdmScheme + 'a> {
        match self.kind {
            FdmSchemeKind::ExplicitEuler => Box::new(ExplicitEulerScheme::new(op, bc_set)),
            FdmSchemeKind::ImplicitEuler => Box::new(ImplicitEulerScheme::new(op, bc_set)),
            FdmSchemeKind::CrankNicolson => {
                Box::new(CrankNicolsonScheme::new(self.theta, op, bc_set))
            }
            FdmSchemeKind::Douglas => Box::new(DouglasScheme::new(self.theta, op, bc_set)),
            FdmSchemeKind::CraigSneyd => {
                Box::new(CraigSneydScheme::new(self.theta, self.mu, op, bc_set))
            }
            FdmSchemeKind::ModifiedCraigSneyd => {
                Box::new(ModifiedCraigSneydScheme::new(self.theta, self.mu, op, bc_set))
            }
            FdmSchemeKind::Hundsdorfer | FdmSchemeKind::ModifiedHundsdorfer => {
                Box::new(HundsdorferScheme::new(self.theta, self.mu, op, bc_set))
            }
        }
    }
}

impl Default for FdmSchemeDesc {
    fn default() -> Self {
        Self::douglas()
    }
}

// ── Building blocks shared by the schemes ────────────────────────────────────

/// Freeze the operator and the boundaries for the step `[t − dt, t]`.
pub(crate) fn begin_step(
    op: &mut dyn FdmLinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    t: Time,
    dt: Option<Time>,
) -> Result<Time> {
    let Some(dt) = dt else {
        qn_core::fail!("time step not set");
    };
    ensure!(t - dt > -1e-8, "a step towards negative time given: t = {t}, dt = {dt}");
    let from = (t - dt).max(0.0);
    op.set_time(from, t);
    bc_set.set_time(from);
    Ok(dt)
}

/// `a + dt · A a` with the boundaries reapplied.
pub(crate) fn explicit_predictor(
    op: &dyn FdmLinearOpComposite,
    bc_set: &FdmBoundaryConditionSet,
    a: &Array,
    dt: Time,
) -> Array {
    bc_set.apply_before_applying(op);
    let mut y = a + &(op.apply(a) * dt);
    bc_set.apply_after_applying(&mut y);
    y
}

/// One implicit correction per direction:
/// `y ← (I − θ dt A_i)⁻¹ (y − θ dt A_i base)`.
pub(crate) fn directional_sweep(
    op: &dyn FdmLinearOpComposite,
    mut y: Array,
    base: &Array,
    theta_dt: Real,
) -> Result<Array> {
    for direction in 0..op.size() {
        let rhs = &y - &(op.apply_direction(direction, base) * theta_dt);
        y = op.solve_splitting(direction, &rhs, theta_dt)?;
    }
    Ok(y)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::finite_differences::{
        FdmBlackScholesOp, FdmLinearOp, FdmLinearOpComposite, FdmMesher, FdmMesherComposite,
        Uniform1dMesher,
    };
    use qn_core::{errors::Result, Real, Time};
    use qn_math::Array;
    use qn_processes::GeneralizedBlackScholesProcess;
    use qn_termstructures::{BlackConstantVol, FlatForward};
    use std::sync::Arc;

    /// The zero operator in `n` points and `dims` directions.
    #[derive(Debug)]
    pub struct ZeroOp {
        pub dims: usize,
    }

    impl FdmLinearOp for ZeroOp {
        fn apply(&self, r: &Array) -> Array {
            Array::zeros(r.size())
        }
    }

    impl FdmLinearOpComposite for ZeroOp {
        fn size(&self) -> usize {
            self.dims
        }
        fn set_time(&mut self, _t1: Time, _t2: Time) {}
        fn apply_mixed(&self, r: &Array) -> Array {
            Array::zeros(r.size())
        }
        fn apply_direction(&self, _direction: usize, r: &Array) -> Array {
            Array::zeros(r.size())
        }
        fn solve_splitting(&self, _direction: usize, r: &Array, _dt: Real) -> Result<Array> {
            Ok(r.clone())
        }
        fn preconditioner(&self, r: &Array, _dt: Real) -> Result<Array> {
            Ok(r.clone())
        }
    }

    /// Black-Scholes operator on a log-spot grid around 100, with the
    /// grid locations.
    pub fn black_scholes_op() -> (FdmBlackScholesOp, Array) {
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
            Uniform1dMesher::new(100.0_f64.ln() - 1.5, 100.0_f64.ln() + 1.5, 151).unwrap(),
        ));
        let process = Arc::new(GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.0)),
            Arc::new(BlackConstantVol::new(0.2)),
        ));
        let x = mesher.locations(0);
        (FdmBlackScholesOp::new(mesher, process, 100.0, false, None, 0), x)
    }
}
