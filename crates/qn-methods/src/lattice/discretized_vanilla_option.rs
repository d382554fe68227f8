//! Vanilla option on an equity lattice.

use super::discretized_asset::{DiscretizedAsset, DiscretizedAssetCore};
use super::tree_lattice::Lattice;
use qn_core::{errors::Result, Exercise, ExerciseType, Payoff, Time};
use qn_math::Array;
use std::sync::Arc;

/// European, American or Bermudan option whose payoff is evaluated on the
/// lattice grid.
#[derive(Debug)]
pub struct DiscretizedVanillaOption {
    core: DiscretizedAssetCore,
    payoff: Arc<dyn Payoff>,
    exercise_type: ExerciseType,
    stopping_times: Vec<Time>,
}

impl DiscretizedVanillaOption {
    /// Option paying `payoff` according to `exercise`.
    pub fn new(payoff: Arc<dyn Payoff>, exercise: &Exercise) -> Self {
        Self {
            core: DiscretizedAssetCore::default(),
            payoff,
            exercise_type: exercise.exercise_type(),
            stopping_times: exercise.times().to_vec(),
        }
    }

    /// The exercise times (for American exercise: `[earliest, latest]`).
    pub fn stopping_times(&self) -> &[Time] {
        &self.stopping_times
    }

    fn apply_specific_condition(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let grid = lattice.grid(self.time())?;
        for (v, s) in self.core.values_mut().iter_mut().zip(grid.iter()) {
            *v = v.max(self.payoff.value(*s));
        }
        Ok(())
    }
}

impl DiscretizedAsset for DiscretizedVanillaOption {
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
        self.stopping_times.clone()
    }

    fn post_adjust_values_impl(&mut self, lattice: &dyn Lattice) -> Result<()> {
        let now = self.time();
        let exercise_now = match self.exercise_type {
            ExerciseType::American => {
                now >= self.stopping_times[0]
                    && now <= self.stopping_times[self.stopping_times.len() - 1]
            }
            ExerciseType::European => self.is_on_time(lattice, self.stopping_times[0]),
            ExerciseType::Bermudan => self
                .stopping_times
                .iter()
                .any(|&t| self.is_on_time(lattice, t)),
        };
        if exercise_now {
            self.apply_specific_condition(lattice)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{BinomialTree, BinomialType, BlackScholesLattice};
    use approx::assert_abs_diff_eq;
    use qn_core::{OptionType, PlainVanillaPayoff};
    use qn_math::black_formula;
    use qn_processes::GeneralizedBlackScholesProcess;
    use qn_termstructures::{BlackConstantVol, FlatForward};

    fn process(r: f64, q: f64, vol: f64) -> GeneralizedBlackScholesProcess {
        GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(r)),
            Arc::new(FlatForward::new(q)),
            Arc::new(BlackConstantVol::new(vol)),
        )
    }

    fn price(option_type: OptionType, exercise: &Exercise, r: f64) -> f64 {
        let steps = 500;
        let p = process(r, 0.0, 0.2);
        let tree =
            BinomialTree::new(BinomialType::CoxRossRubinstein, &p, 1.0, steps, 100.0).unwrap();
        let lattice = BlackScholesLattice::build(tree, r, 1.0, steps).unwrap();
        let payoff = Arc::new(PlainVanillaPayoff::new(option_type, 100.0).unwrap());
        let mut option = DiscretizedVanillaOption::new(payoff, exercise);
        option.initialize(&lattice, 1.0).unwrap();
        option.rollback(&lattice, 0.0).unwrap();
        option.present_value(&lattice).unwrap()
    }

    #[test]
    fn european_call_converges_to_black() {
        let european = Exercise::european(1.0).unwrap();
        let value = price(OptionType::Call, &european, 0.05);
        let forward = 100.0 * 0.05_f64.exp();
        let expected = black_formula(OptionType::Call, 100.0, forward, 0.2, (-0.05_f64).exp());
        assert_abs_diff_eq!(value, expected, epsilon = 2e-2);
    }

    #[test]
    fn american_put_is_worth_more_than_european() {
        let european = price(OptionType::Put, &Exercise::european(1.0).unwrap(), 0.08);
        let american = price(OptionType::Put, &Exercise::american(0.0, 1.0).unwrap(), 0.08);
        let bermudan = price(
            OptionType::Put,
            &Exercise::bermudan(vec![0.25, 0.5, 0.75, 1.0]).unwrap(),
            0.08,
        );
        assert!(american > bermudan);
        assert!(bermudan > european);
        // American call without dividends is never exercised early
        let call_eu = price(OptionType::Call, &Exercise::european(1.0).unwrap(), 0.08);
        let call_am = price(OptionType::Call, &Exercise::american(0.0, 1.0).unwrap(), 0.08);
        assert_abs_diff_eq!(call_eu, call_am, epsilon = 1e-10);
    }
}
