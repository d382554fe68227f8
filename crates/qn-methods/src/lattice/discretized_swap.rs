//! Fixed-versus-floating swap on a short-rate lattice.
//!
//! Coupons whose reset time is still ahead are valued at reset by rolling
//! a unit discount bond back from the payment time: a floating coupon is
//! worth `N (1 − P) + N τ s P` at reset, a fixed coupon `c P`. Coupons
//! already fixed (reset time before 0) are added as known amounts at their
//! payment time.

use super::discretized_asset::{DiscretizedAsset, DiscretizedAssetCore, DiscretizedDiscountBond};
use super::tree_lattice::Lattice;
use qn_core::{ensure, errors::Result, Real, Spread, Time};
use qn_math::Array;
use serde::{Deserialize, Serialize};

/// Which leg is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapType {
    /// Pays fixed, receives floating.
    Payer,
    /// Receives fixed, pays floating.
    Receiver,
}

impl SwapType {
    /// +1 for a payer swap, −1 for a receiver swap (sign of the floating leg).
    pub fn sign(self) -> Real {
        match self {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }
}

/// Cash-flow schedule of a vanilla swap, in times from the reference date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapLegs {
    /// Notional of both legs.
    pub nominal: Real,
    /// Accrual start of each fixed coupon.
    pub fixed_reset_times: Vec<Time>,
    /// Payment time of each fixed coupon.
    pub fixed_pay_times: Vec<Time>,
    /// Amount of each fixed coupon.
    pub fixed_coupons: Vec<Real>,
    /// Fixing time of each floating coupon.
    pub floating_reset_times: Vec<Time>,
    /// Payment time of each floating coupon.
    pub floating_pay_times: Vec<Time>,
    /// Accrual period of each floating coupon.
    pub floating_accrual_times: Vec<Time>,
    /// Spread over the index of each floating coupon.
    pub floating_spreads: Vec<Spread>,
    /// Known amounts of floating coupons already fixed; only read for
    /// coupons with a negative reset time.
    pub floating_coupons: Vec<Real>,
}

impl SwapLegs {
    /// Check that every per-coupon vector matches its leg.
    pub fn validate(&self) -> Result<()> {
        let n_fixed = self.fixed_reset_times.len();
        ensure!(
            self.fixed_pay_times.len() == n_fixed && self.fixed_coupons.len() == n_fixed,
            "fixed leg: {} reset times, {} pay times, {} coupons",
            n_fixed,
            self.fixed_pay_times.len(),
            self.fixed_coupons.len()
        );
        let n_float = self.floating_reset_times.len();
        ensure!(
            self.floating_pay_times.len() == n_float
                && self.floating_accrual_times.len() == n_float
                && self.floating_spreads.len() == n_float,
            "floating leg: inconsistent schedule sizes"
        );
        ensure!(
            self.floating_reset_times.iter().all(|&t| t >= 0.0)
                || self.floating_coupons.len() == n_float,
            "floating coupons already fixed need known amounts"
        );
        Ok(())
    }

    /// Reset and payment times from 0 on; those are the times a lattice
    /// must contain to value the swap.
    pub fn event_times(&self) -> Vec<Time> {
        self.fixed_reset_times
            .iter()
            .chain(&self.fixed_pay_times)
            .chain(&self.floating_reset_times)
            .chain(&self.floating_pay_times)
            .copied()
            .filter(|&t| t >= 0.0)
            .collect()
    }
}

/// Discretized vanilla swap.
#[derive(Debug)]
pub struct DiscretizedSwap {
    core: DiscretizedAssetCore,
    swap_type: SwapType,
    legs: SwapLegs,
}

impl DiscretizedSwap {
    /// Swap of `swap_type` over `legs`.
    pub fn new(swap_type: SwapType, legs: SwapLegs) -> Result<Self> {
        legs.validate()?;
        Ok(Self {
            core: DiscretizedAssetCore::default(),
            swap_type,
            legs,
        })
    }

    /// The swap schedule.
    pub fn legs(&self) -> &SwapLegs {
        &self.legs
    }

    /// Payer or receiver.
    pub fn swap_type(&self) -> SwapType {
        self.swap_type
    }

    fn bond_values(&self, lattice: &dyn Lattice, pay_time: Time) -> Result<Array> {
        let mut bond = DiscretizedDiscountBond::default();
        lattice.initialize(&mut bond, pay_time)?;
        lattice.rollback(&mut bond, self.time())?;
        Ok(bond.values().clone())
    }
}

impl DiscretizedAsset for DiscretizedSwap {
    fn core(&self) -> &DiscretizedAssetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DiscretizedAssetCore {
        &mut self.core
    }

    fn reset(&mut self, lattice: &dyn Lattice, size: usize) -> Result<()> {
        self.core.set_values(Array::zeros(size));
        self.adjust_values(lattice)
    }

    fn mandatory_times(&self) -> Vec<Time> {
        self.legs.event_times()
    }

    fn pre_adjust_values_impl(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let sign = self.swap_type.sign();
        let nominal = self.legs.nominal;

        for i in 0..self.legs.floating_reset_times.len() {
            let reset = self.legs.floating_reset_times[i];
            if reset >= 0.0 && self.is_on_time(lattice, reset) {
                let bond = self.bond_values(lattice, self.legs.floating_pay_times[i])?;
                let accrual = self.legs.floating_accrual_times[i];
                let spread = self.legs.floating_spreads[i];
                for (v, p) in self.core.values_mut().iter_mut().zip(bond.iter()) {
                    let coupon = nominal * (1.0 - p) + nominal * accrual * spread * p;
                    *v += sign * coupon;
                }
            }
        }

        for i in 0..self.legs.fixed_reset_times.len() {
            let reset = self.legs.fixed_reset_times[i];
            if reset >= 0.0 && self.is_on_time(lattice, reset) {
                let bond = self.bond_values(lattice, self.legs.fixed_pay_times[i])?;
                let amount = self.legs.fixed_coupons[i];
                for (v, p) in self.core.values_mut().iter_mut().zip(bond.iter()) {
                    *v -= sign * amount * p;
                }
            }
        }
        Ok(())
    }

    fn post_adjust_values_impl(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let sign = self.swap_type.sign();

        // coupons fixed before the reference time are known amounts
        for i in 0..self.legs.fixed_reset_times.len() {
            let pay = self.legs.fixed_pay_times[i];
            if self.legs.fixed_reset_times[i] < 0.0 && self.is_on_time(lattice, pay) {
                let amount = self.legs.fixed_coupons[i];
                for v in self.core.values_mut().iter_mut() {
                    *v -= sign * amount;
                }
            }
        }
        for i in 0..self.legs.floating_reset_times.len() {
            let pay = self.legs.floating_pay_times[i];
            if self.legs.floating_reset_times[i] < 0.0 && self.is_on_time(lattice, pay) {
                let amount = self.legs.floating_coupons[i];
                for v in self.core.values_mut().iter_mut() {
                    *v += sign * amount;
                }
            }
        }
        Ok(())
    }
}
