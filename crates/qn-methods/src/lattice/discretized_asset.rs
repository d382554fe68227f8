//! Discretized assets: values on the nodes of a lattice.
//!
//! An asset is initialized on a lattice at some time, rolled back node
//! column by node column, and adjusted at every time it cares about
//! (coupon payments, exercise dates, …). Adjustments are split into a
//! *pre* part (payments settled before optionality is applied) and a
//! *post* part; each runs at most once per time.

use super::tree_lattice::Lattice;
use qn_core::{errors::Result, ExerciseType, Real, Time};
use qn_math::{close_enough, Array};

/// Mutable state shared by every discretized asset.
#[derive(Debug, Clone)]
pub struct DiscretizedAssetCore {
    time: Time,
    latest_pre_adjustment: Time,
    latest_post_adjustment: Time,
    values: Array,
}

impl Default for DiscretizedAssetCore {
    fn default() -> Self {
        Self {
            time: 0.0,
            latest_pre_adjustment: Time::MAX,
            latest_post_adjustment: Time::MAX,
            values: Array::zeros(0),
        }
    }
}

impl DiscretizedAssetCore {
    /// Current time of the asset.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Move the asset to `t`.
    pub fn set_time(&mut self, t: Time) {
        self.time = t;
    }

    /// Values on the lattice nodes at the current time.
    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Mutable node values.
    pub fn values_mut(&mut self) -> &mut Array {
        &mut self.values
    }

    /// Replace the node values.
    pub fn set_values(&mut self, values: Array) {
        self.values = values;
    }
}

/// An asset whose value is known on the nodes of a [`Lattice`].
pub trait DiscretizedAsset: std::fmt::Debug {
    /// Shared state.
    fn core(&self) -> &DiscretizedAssetCore;

    /// Mutable shared state.
    fn core_mut(&mut self) -> &mut DiscretizedAssetCore;

    /// Set the values for `size` nodes at the current time.
    fn reset(&mut self, lattice: &dyn Lattice, size: usize) -> Result<()>;

    /// Times the lattice must contain for this asset.
    fn mandatory_times(&self) -> Vec<Time>;

    /// Adjustment applied before optionality at the current time.
    fn pre_adjust_values_impl(&mut self, _lattice: &dyn Lattice) -> Result<()> {
        Ok(())
    }

    /// Adjustment applied after optionality at the current time.
    fn post_adjust_values_impl(&mut self, _lattice: &dyn Lattice) -> Result<()> {
        Ok(())
    }

    // ── Provided ─────────────────────────────────────────────────────────

    /// Current time.
    fn time(&self) -> Time {
        self.core().time
    }

    /// Node values at the current time.
    fn values(&self) -> &Array {
        &self.core().values
    }

    /// Run the pre-adjustment once for the current time.
    fn pre_adjust_values(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let t = self.time();
        if !close_enough(t, self.core().latest_pre_adjustment) {
            self.pre_adjust_values_impl(lattice)?;
            self.core_mut().latest_pre_adjustment = t;
        }
        Ok(())
    }

    /// Run the post-adjustment once for the current time.
    fn post_adjust_values(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let t = self.time();
        if !close_enough(t, self.core().latest_post_adjustment) {
            self.post_adjust_values_impl(lattice)?;
            self.core_mut().latest_post_adjustment = t;
        }
        Ok(())
    }

    /// Pre- then post-adjustment.
    fn adjust_values(&mut self, lattice: &dyn Lattice) -> Result<()> {
        self.pre_adjust_values(lattice)?;
        self.post_adjust_values(lattice)
    }

    /// Whether `t` falls on the grid node of the current time.
    fn is_on_time(&self, lattice: &dyn Lattice, t: Time) -> bool {
        let grid = lattice.time_grid();
        close_enough(grid.closest_time(t), self.time())
    }

    /// Initialize on `lattice` at `t`.
    fn initialize(&mut self, lattice: &dyn Lattice, t: Time) -> Result<()>
    where
        Self: Sized,
    {
        lattice.initialize(self, t)
    }

    /// Roll back to `to`, adjusting values there.
    fn rollback(&mut self, lattice: &dyn Lattice, to: Time) -> Result<()>
    where
        Self: Sized,
    {
        lattice.rollback(self, to)
    }

    /// Roll back to `to` without the final adjustment.
    fn partial_rollback(&mut self, lattice: &dyn Lattice, to: Time) -> Result<()>
    where
        Self: Sized,
    {
        lattice.partial_rollback(self, to)
    }

    /// Present value from the current time.
    fn present_value(&mut self, lattice: &dyn Lattice) -> Result<Real>
    where
        Self: Sized,
    {
        lattice.present_value(self)
    }
}

// ── DiscretizedDiscountBond ──────────────────────────────────────────────────

/// Unit zero-coupon bond paying 1 at the time it is initialized.
#[derive(Debug, Clone, Default)]
pub struct DiscretizedDiscountBond {
    core: DiscretizedAssetCore,
}

impl DiscretizedAsset for DiscretizedDiscountBond {
    fn core(&self) -> &DiscretizedAssetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DiscretizedAssetCore {
        &mut self.core
    }

    fn reset(&mut self, _lattice: &dyn Lattice, size: usize) -> Result<()> {
        self.core.values = Array::from_element(size, 1.0);
        Ok(())
    }

    fn mandatory_times(&self) -> Vec<Time> {
        Vec::new()
    }
}

// ── DiscretizedOption ────────────────────────────────────────────────────────

/// Right to enter an underlying discretized asset at the exercise times.
///
/// For American exercise `exercise_times` holds the earliest and latest
/// exercise time.
#[derive(Debug)]
pub struct DiscretizedOption {
    core: DiscretizedAssetCore,
    underlying: Box<dyn DiscretizedAsset>,
    exercise_type: ExerciseType,
    exercise_times: Vec<Time>,
}

impl DiscretizedOption {
    /// Option on `underlying`.
    pub fn new(
        underlying: Box<dyn DiscretizedAsset>,
        exercise_type: ExerciseType,
        exercise_times: Vec<Time>,
    ) -> Self {
        Self {
            core: DiscretizedAssetCore::default(),
            underlying,
            exercise_type,
            exercise_times,
        }
    }

    /// The underlying asset.
    pub fn underlying(&self) -> &dyn DiscretizedAsset {
        self.underlying.as_ref()
    }

    fn apply_exercise_condition(&mut self) {
        let underlying = self.underlying.values();
        for (v, u) in self.core.values.iter_mut().zip(underlying.iter()) {
            *v = v.max(*u);
        }
    }
}

impl DiscretizedAsset for DiscretizedOption {
    fn core(&self) -> &DiscretizedAssetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DiscretizedAssetCore {
        &mut self.core
    }

    /// Initializes the underlying at its last mandatory time (or at the
    /// option time if later) and starts the option at zero.
    fn reset(&mut self, lattice: &dyn Lattice, size: usize) -> Result<()> {
        let start = self
            .underlying
            .mandatory_times()
            .into_iter()
            .fold(self.time(), Time::max);
        lattice.initialize(self.underlying.as_mut(), start)?;
        self.core.values = Array::zeros(size);
        self.adjust_values(lattice)
    }

    fn mandatory_times(&self) -> Vec<Time> {
        let mut times = self.underlying.mandatory_times();
        times.extend(self.exercise_times.iter().copied().filter(|&t| t >= 0.0));
        times
    }

    fn post_adjust_values_impl(&mut self, lattice: &dyn Lattice) -> Result<()> {
        // rolling backwards: exercise happens before the underlying's own
        // payments at the same time are settled
        let t = self.time();
        lattice.partial_rollback(self.underlying.as_mut(), t)?;
        self.underlying.pre_adjust_values(lattice)?;
        let exercise_now = match self.exercise_type {
            ExerciseType::American => {
                let last = self.exercise_times[self.exercise_times.len() - 1];
                t >= self.exercise_times[0] && t <= last
            }
            ExerciseType::European | ExerciseType::Bermudan => self
                .exercise_times
                .iter()
                .any(|&e| e >= 0.0 && self.is_on_time(lattice, e)),
        };
        if exercise_now {
            self.apply_exercise_condition();
        }
        self.underlying.post_adjust_values(lattice)
    }
}
