//! Caps, floors and collars on a short-rate lattice.
//!
//! Each optionlet is valued at its start time as an option on the discount
//! bond maturing at its end time: a caplet with strike `K` and accrual `τ`
//! is worth `N (1 + K τ) g max(0, 1/(1 + K τ) − P)`.

use super::discretized_asset::{DiscretizedAsset, DiscretizedAssetCore, DiscretizedDiscountBond};
use super::tree_lattice::Lattice;
use qn_core::{ensure, errors::Result, Rate, Real, Time};
use qn_math::Array;
use serde::{Deserialize, Serialize};

/// Kind of cap/floor instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapFloorType {
    /// Strip of caplets.
    Cap,
    /// Strip of floorlets.
    Floor,
    /// Long cap, short floor.
    Collar,
}

/// Optionlet schedule of a cap/floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapFloorPeriods {
    /// Fixing time of each optionlet (accrual start).
    pub start_times: Vec<Time>,
    /// Payment time of each optionlet (accrual end).
    pub end_times: Vec<Time>,
    /// Accrual fraction of each period.
    pub accrual_times: Vec<Time>,
    /// Notional of each period.
    pub nominals: Vec<Real>,
    /// Gearing applied to the index rate.
    pub gearings: Vec<Real>,
    /// Cap strikes (ignored for floors).
    pub cap_rates: Vec<Rate>,
    /// Floor strikes (ignored for caps).
    pub floor_rates: Vec<Rate>,
}

/// Discretized cap, floor or collar.
#[derive(Debug)]
pub struct DiscretizedCapFloor {
    core: DiscretizedAssetCore,
    kind: CapFloorType,
    periods: CapFloorPeriods,
}

impl DiscretizedCapFloor {
    /// Instrument of `kind` over `periods`. All periods must fix at or
    /// after the reference time.
    pub fn new(kind: CapFloorType, periods: CapFloorPeriods) -> Result<Self> {
        let n = periods.start_times.len();
        ensure!(n > 0, "no cap/floor periods given");
        ensure!(
            periods.end_times.len() == n
                && periods.accrual_times.len() == n
                && periods.nominals.len() == n
                && periods.gearings.len() == n,
            "inconsistent cap/floor schedule sizes"
        );
        if kind != CapFloorType::Floor {
            ensure!(
                periods.cap_rates.len() == n,
                "{n} periods but {} cap rates",
                periods.cap_rates.len()
            );
        }
        if kind != CapFloorType::Cap {
            ensure!(
                periods.floor_rates.len() == n,
                "{n} periods but {} floor rates",
                periods.floor_rates.len()
            );
        }
        ensure!(
            periods.start_times.iter().all(|&t| t >= 0.0),
            "optionlets already fixed are not supported"
        );
        ensure!(
            periods
                .start_times
                .iter()
                .zip(&periods.end_times)
                .all(|(s, e)| e > s),
            "every period must end after it starts"
        );
        Ok(Self {
            core: DiscretizedAssetCore::default(),
            kind,
            periods,
        })
    }

    /// Cap, floor or collar.
    pub fn kind(&self) -> CapFloorType {
        self.kind
    }
}

impl DiscretizedAsset for DiscretizedCapFloor {
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
        self.periods
            .start_times
            .iter()
            .chain(&self.periods.end_times)
            .copied()
            .collect()
    }

    fn pre_adjust_values_impl(&mut self, lattice: &dyn Lattice) -> Result<()> {
        for i in 0..self.periods.start_times.len() {
            if !self.is_on_time(lattice, self.periods.start_times[i]) {
                continue;
            }
            let mut bond = DiscretizedDiscountBond::default();
            lattice.initialize(&mut bond, self.periods.end_times[i])?;
            lattice.rollback(&mut bond, self.time())?;

            let tenor = self.periods.accrual_times[i];
            let scale = self.periods.nominals[i] * self.periods.gearings[i];

            if matches!(self.kind, CapFloorType::Cap | CapFloorType::Collar) {
                let accrual = 1.0 + self.periods.cap_rates[i] * tenor;
                let strike = 1.0 / accrual;
                for (v, p) in self.core.values_mut().iter_mut().zip(bond.values().iter()) {
                    *v += scale * accrual * (strike - p).max(0.0);
                }
            }
            if matches!(self.kind, CapFloorType::Floor | CapFloorType::Collar) {
                let accrual = 1.0 + self.periods.floor_rates[i] * tenor;
                let strike = 1.0 / accrual;
                let mult = if self.kind == CapFloorType::Floor { 1.0 } else { -1.0 };
                for (v, p) in self.core.values_mut().iter_mut().zip(bond.values().iter()) {
                    *v += mult * scale * accrual * (p - strike).max(0.0);
                }
            }
        }
        Ok(())
    }
}
