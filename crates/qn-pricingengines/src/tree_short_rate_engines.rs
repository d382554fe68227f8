//! Swaptions and caps/floors rolled back on short-rate trees.

use crate::config::EngineConfig;
use crate::instruments::{CapFloorArgs, SwaptionArgs};
use crate::results::{PricingEngine, PricingResults};
use qn_core::{ensure, errors::Result, Real, Size};
use qn_methods::lattice::{
    DiscretizedAsset, DiscretizedCapFloor, DiscretizedOption, DiscretizedSwap, Lattice,
};
use qn_methods::TimeGrid;
use qn_models::{BlackKarasinski, HullWhite, OneFactorModel, TwoFactorModel, Vasicek, G2};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// A model that can build a recombining tree on a time grid.
pub trait ShortRateLattice: Debug + Send + Sync {
    /// Tree through every time of `grid`.
    fn lattice(&self, grid: &TimeGrid) -> Result<Box<dyn Lattice>>;
}

impl ShortRateLattice for HullWhite {
    fn lattice(&self, grid: &TimeGrid) -> Result<Box<dyn Lattice>> {
        Ok(Box::new(OneFactorModel::tree(self, grid)?))
    }
}

impl ShortRateLattice for Vasicek {
    fn lattice(&self, grid: &TimeGrid) -> Result<Box<dyn Lattice>> {
        Ok(Box::new(OneFactorModel::tree(self, grid)?))
    }
}

impl ShortRateLattice for BlackKarasinski {
    fn lattice(&self, grid: &TimeGrid) -> Result<Box<dyn Lattice>> {
        Ok(Box::new(OneFactorModel::tree(self, grid)?))
    }
}

impl ShortRateLattice for G2 {
    fn lattice(&self, grid: &TimeGrid) -> Result<Box<dyn Lattice>> {
        Ok(Box::new(TwoFactorModel::tree(self, grid)?))
    }
}

/// Rolls `asset` back from the last grid time to today.
fn roll_to_today(asset: &mut dyn DiscretizedAsset, lattice: &dyn Lattice) -> Result<Real> {
    let end = lattice.time_grid().back();
    lattice.initialize(asset, end)?;
    lattice.rollback(asset, 0.0)?;
    Ok(asset.values()[0])
}

// ── Swaptions ────────────────────────────────────────────────────────────────

/// European, Bermudan and American swaptions on a short-rate tree.
///
/// The grid passes through every exercise and coupon time; between them
/// the spacing is at most `end / time_steps`.
#[derive(Debug, Clone)]
pub struct TreeSwaptionEngine {
    model: Arc<dyn ShortRateLattice>,
    time_steps: Size,
}

impl TreeSwaptionEngine {
    /// Engine with `time_steps` tree steps over the life of the swap.
    pub fn new(model: Arc<dyn ShortRateLattice>, time_steps: Size) -> Result<Self> {
        ensure!(time_steps > 0, "at least one time step required");
        Ok(Self { model, time_steps })
    }

    /// Engine with `config.tree.time_steps` steps.
    pub fn from_config(model: Arc<dyn ShortRateLattice>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Self::new(model, config.tree.time_steps)
    }
}

impl PricingEngine<SwaptionArgs> for TreeSwaptionEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &SwaptionArgs) -> Result<PricingResults> {
        let exercise_times = args.exercise.times().to_vec();
        ensure!(args.exercise.last_time() > 0.0, "swaption already expired");
        let swap = DiscretizedSwap::new(args.swap_type, args.legs()?)?;
        let mut option =
            DiscretizedOption::new(Box::new(swap), args.exercise.exercise_type(), exercise_times);

        let mandatory: Vec<_> =
            option.mandatory_times().into_iter().filter(|&t| t >= 0.0).collect();
        let grid = TimeGrid::with_mandatory_times(&mandatory, self.time_steps)?;
        debug!(steps = grid.steps(), exercise = ?args.exercise.exercise_type(), "tree swaption");
        let lattice = self.model.lattice(&grid)?;
        Ok(PricingResults::from_npv(roll_to_today(&mut option, lattice.as_ref())?))
    }
}

// ── Caps and floors ──────────────────────────────────────────────────────────

/// Caps, floors and collars on a short-rate tree.
#[derive(Debug, Clone)]
pub struct TreeCapFloorEngine {
    model: Arc<dyn ShortRateLattice>,
    time_steps: Size,
}

impl TreeCapFloorEngine {
    /// Engine with `time_steps` tree steps up to the last payment.
    pub fn new(model: Arc<dyn ShortRateLattice>, time_steps: Size) -> Result<Self> {
        ensure!(time_steps > 0, "at least one time step required");
        Ok(Self { model, time_steps })
    }

    /// Engine with `config.tree.time_steps` steps.
    pub fn from_config(model: Arc<dyn ShortRateLattice>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Self::new(model, config.tree.time_steps)
    }
}

impl PricingEngine<CapFloorArgs> for TreeCapFloorEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &CapFloorArgs) -> Result<PricingResults> {
        ensure!(!args.is_empty(), "cap/floor without periods");
        let mut cap_floor = DiscretizedCapFloor::new(args.kind, args.periods.clone())?;
        let grid = TimeGrid::with_mandatory_times(&cap_floor.mandatory_times(), self.time_steps)?;
        debug!(steps = grid.steps(), kind = ?args.kind, periods = args.len(), "tree cap/floor");
        let lattice = self.model.lattice(&grid)?;
        Ok(PricingResults::from_npv(roll_to_today(&mut cap_floor, lattice.as_ref())?))
    }
}
