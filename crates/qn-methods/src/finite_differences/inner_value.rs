//! Exercise values on the grid.

use super::layout::FdmLinearOpIterator;
use super::mesher_composite::FdmMesher;
use crate::lattice::{SwapLegs, SwapType};
use qn_core::{payoff::Payoff, Real, Time};
use qn_math::simpson;
use std::sync::{Arc, OnceLock};

/// Value of immediate exercise at a grid point.
pub trait FdmInnerValueCalculator: std::fmt::Debug + Send + Sync {
    /// Exercise value at the grid point `iter` and time `t`.
    fn inner_value(&self, iter: &FdmLinearOpIterator, t: Time) -> Real;

    /// Exercise value averaged over the cell around `iter`; used for the
    /// terminal condition, where the payoff kink would otherwise spoil the
    /// convergence order.
    fn avg_inner_value(&self, iter: &FdmLinearOpIterator, t: Time) -> Real {
        self.inner_value(iter, t)
    }
}

// ── Payoff of the exponential of a log-spot coordinate ───────────────────────

/// `payoff(exp(x))` with `x` the grid coordinate along `direction`.
#[derive(Debug)]
pub struct FdmLogInnerValue {
    payoff: Arc<dyn Payoff>,
    mesher: Arc<dyn FdmMesher>,
    direction: usize,
    avg_inner_values: OnceLock<Vec<Real>>,
}

impl FdmLogInnerValue {
    /// Payoff in the log-spot coordinate `direction` of `mesher`.
    pub fn new(payoff: Arc<dyn Payoff>, mesher: Arc<dyn FdmMesher>, direction: usize) -> Self {
        Self {
            payoff,
            mesher,
            direction,
            avg_inner_values: OnceLock::new(),
        }
    }

    fn avg_inner_value_calc(&self, iter: &FdmLinearOpIterator, t: Time) -> Real {
        let dim = self.mesher.layout().dim()[self.direction];
        let coord = iter.coordinates()[self.direction];
        if coord == 0 || coord == dim - 1 {
            return self.inner_value(iter, t);
        }
        let loc = self.mesher.location(iter, self.direction);
        let a = loc - 0.5 * self.mesher.dminus(iter, self.direction);
        let b = loc + 0.5 * self.mesher.dplus(iter, self.direction);
        let f = |x: Real| self.payoff.value(x.exp());
        let (fa, fb) = (f(a), f(b));
        let acc = if fa != 0.0 || fb != 0.0 {
            (fa + fb) * 5e-5
        } else {
            1e-4
        };
        match simpson(f, a, b, acc.abs(), 8) {
            Ok(integral) => integral / (b - a),
            Err(_) => self.inner_value(iter, t),
        }
    }
}

impl FdmInnerValueCalculator for FdmLogInnerValue {
    fn inner_value(&self, iter: &FdmLinearOpIterator, _t: Time) -> Real {
        self.payoff.value(self.mesher.location(iter, self.direction).exp())
    }

    fn avg_inner_value(&self, iter: &FdmLinearOpIterator, t: Time) -> Real {
        let values = self.avg_inner_values.get_or_init(|| {
            let layout = self.mesher.layout();
            let mut values = vec![Real::NAN; layout.dim()[self.direction]];
            for it in layout.iter() {
                let xn = it.coordinates()[self.direction];
                if values[xn].is_nan() {
                    values[xn] = self.avg_inner_value_calc(&it, t);
                }
            }
            values
        });
        values[iter.coordinates()[self.direction]]
    }
}

// ── Swap value under an affine short-rate model ──────────────────────────────

/// Short-rate model with closed-form discount bonds given its state.
pub trait AffineStateModel: std::fmt::Debug + Send + Sync {
    /// Number of state variables.
    fn state_dimension(&self) -> usize;

    /// Price at `t` of the zero bond maturing at `maturity`, conditional on
    /// the state variables `state` at `t`.
    fn discount_bond(&self, t: Time, maturity: Time, state: &[Real]) -> Real;
}

/// Exercise value of a vanilla swap: the positive part of the swap value
/// over the coupons starting at or after the exercise time.
///
/// The model state variables are the grid coordinates along the first
/// `state_dimension()` directions.
#[derive(Debug)]
pub struct FdmAffineSwapInnerValue<M: AffineStateModel> {
    model: Arc<M>,
    swap_type: SwapType,
    legs: SwapLegs,
    mesher: Arc<dyn FdmMesher>,
}

impl<M: AffineStateModel> FdmAffineSwapInnerValue<M> {
    /// Swap of `swap_type` over `legs` priced with `model`.
    pub fn new(
        model: Arc<M>,
        swap_type: SwapType,
        legs: SwapLegs,
        mesher: Arc<dyn FdmMesher>,
    ) -> Self {
        Self {
            model,
            swap_type,
            legs,
            mesher,
        }
    }

    /// Swap value at `t` given the model state.
    pub fn swap_value(&self, t: Time, state: &[Real]) -> Real {
        let started = |reset: Time| reset < t && !qn_math::close_enough(reset, t);
        let bond = |maturity: Time| self.model.discount_bond(t, maturity, state);
        let legs = &self.legs;

        let fixed: Real = (0..legs.fixed_coupons.len())
            .filter(|&i| !started(legs.fixed_reset_times[i]))
            .map(|i| legs.fixed_coupons[i] * bond(legs.fixed_pay_times[i]))
            .sum();
        let floating: Real = (0..legs.floating_reset_times.len())
            .filter(|&i| !started(legs.floating_reset_times[i]))
            .map(|i| {
                let p = bond(legs.floating_pay_times[i]);
                let spread = legs.floating_spreads[i] * legs.floating_accrual_times[i] * p;
                legs.nominal * (bond(legs.floating_reset_times[i]) - p + spread)
            })
            .sum();
        self.swap_type.sign() * (floating - fixed)
    }
}

impl<M: AffineStateModel> FdmInnerValueCalculator for FdmAffineSwapInnerValue<M> {
    fn inner_value(&self, iter: &FdmLinearOpIterator, t: Time) -> Real {
        let state: Vec<Real> = (0..self.model.state_dimension())
            .map(|d| self.mesher.location(iter, d))
            .collect();
        self.swap_value(t, &state).max(0.0)
    }
}
