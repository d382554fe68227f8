//! Conditions applied to the values between time steps: early exercise
//! and snapshots.

use super::inner_value::FdmInnerValueCalculator;
use super::mesher_composite::FdmMesher;
use qn_core::{
    exercise::{Exercise, ExerciseType},
    Time,
};
use qn_math::{close_enough, Array};
use std::sync::Arc;
use tracing::debug;

/// Modification of the values at time `t`, applied after every step.
pub trait StepCondition: std::fmt::Debug + Send + Sync {
    /// Apply to `values` at time `t`.
    fn apply_to(&mut self, values: &mut Array, t: Time);
}

fn exercise_into(
    values: &mut Array,
    t: Time,
    mesher: &dyn FdmMesher,
    calculator: &dyn FdmInnerValueCalculator,
) {
    for iter in mesher.layout().iter() {
        let inner = calculator.inner_value(&iter, t);
        let i = iter.index();
        if inner > values[i] {
            values[i] = inner;
        }
    }
}

/// Exercise at any time: `V = max(V, inner value)` after every step.
#[derive(Debug, Clone)]
pub struct FdmAmericanStepCondition {
    mesher: Arc<dyn FdmMesher>,
    calculator: Arc<dyn FdmInnerValueCalculator>,
}

impl FdmAmericanStepCondition {
    /// Exercise with `calculator` on every point of `mesher`.
    pub fn new(mesher: Arc<dyn FdmMesher>, calculator: Arc<dyn FdmInnerValueCalculator>) -> Self {
        Self { mesher, calculator }
    }
}

impl StepCondition for FdmAmericanStepCondition {
    fn apply_to(&mut self, values: &mut Array, t: Time) {
        exercise_into(values, t, self.mesher.as_ref(), self.calculator.as_ref());
    }
}

/// Exercise on a discrete set of times only.
#[derive(Debug, Clone)]
pub struct FdmBermudanStepCondition {
    exercise_times: Vec<Time>,
    mesher: Arc<dyn FdmMesher>,
    calculator: Arc<dyn FdmInnerValueCalculator>,
}

impl FdmBermudanStepCondition {
    /// Exercise at each of `exercise_times`.
    pub fn new(
        exercise_times: Vec<Time>,
        mesher: Arc<dyn FdmMesher>,
        calculator: Arc<dyn FdmInnerValueCalculator>,
    ) -> Self {
        Self {
            exercise_times,
            mesher,
            calculator,
        }
    }

    /// The exercise times; the solver must stop on each of them.
    pub fn exercise_times(&self) -> &[Time] {
        &self.exercise_times
    }
}

impl StepCondition for FdmBermudanStepCondition {
    fn apply_to(&mut self, values: &mut Array, t: Time) {
        if self.exercise_times.iter().any(|&e| close_enough(e, t)) {
            exercise_into(values, t, self.mesher.as_ref(), self.calculator.as_ref());
        }
    }
}

/// Records the values when the rollback passes a given time.
#[derive(Debug, Clone)]
pub struct FdmSnapshotCondition {
    t: Time,
    values: Option<Array>,
}

impl FdmSnapshotCondition {
    /// Snapshot at `t`.
    pub fn new(t: Time) -> Self {
        Self { t, values: None }
    }

    /// Time of the snapshot.
    pub fn time(&self) -> Time {
        self.t
    }

    /// Recorded values, if the rollback reached the snapshot time.
    pub fn values(&self) -> Option<&Array> {
        self.values.as_ref()
    }
}

impl StepCondition for FdmSnapshotCondition {
    fn apply_to(&mut self, values: &mut Array, t: Time) {
        if close_enough(self.t, t) {
            self.values = Some(values.clone());
        }
    }
}

/// Sequence of step conditions with the union of their stopping times.
///
/// An optional snapshot is kept apart from the other conditions so that
/// solvers can read it after the rollback.
#[derive(Debug, Default)]
pub struct FdmStepConditionComposite {
    stopping_times: Vec<Time>,
    conditions: Vec<Box<dyn StepCondition>>,
    snapshot: Option<FdmSnapshotCondition>,
}

impl FdmStepConditionComposite {
    /// Conditions with the times the solver must stop on.
    pub fn new(stopping_times: Vec<Time>, conditions: Vec<Box<dyn StepCondition>>) -> Self {
        let mut composite = Self {
            stopping_times: Vec::new(),
            conditions,
            snapshot: None,
        };
        composite.add_stopping_times(stopping_times);
        composite
    }

    /// Conditions for an option with `exercise`: American adds
    /// [`FdmAmericanStepCondition`], Bermudan adds
    /// [`FdmBermudanStepCondition`] and its exercise times, European adds
    /// nothing.
    pub fn vanilla_composite(
        exercise: &Exercise,
        calculator: Arc<dyn FdmInnerValueCalculator>,
        mesher: Arc<dyn FdmMesher>,
    ) -> Self {
        match exercise.exercise_type() {
            ExerciseType::European => Self::default(),
            ExerciseType::American => Self::new(
                Vec::new(),
                vec![Box::new(FdmAmericanStepCondition::new(mesher, calculator))],
            ),
            ExerciseType::Bermudan => {
                let times = exercise.times().to_vec();
                debug!(exercise_times = times.len(), "bermudan step condition");
                Self::new(
                    times.clone(),
                    vec![Box::new(FdmBermudanStepCondition::new(times, mesher, calculator))],
                )
            }
        }
    }

    /// Add `snapshot` and its time as a stopping time.
    pub fn join_snapshot(mut self, snapshot: FdmSnapshotCondition) -> Self {
        self.add_stopping_times(vec![snapshot.time()]);
        self.snapshot = Some(snapshot);
        self
    }

    fn add_stopping_times(&mut self, times: Vec<Time>) {
        self.stopping_times.extend(times);
        self.stopping_times.sort_by(|a, b| a.total_cmp(b));
        self.stopping_times.dedup_by(|a, b| close_enough(*a, *b));
    }

    /// Sorted, deduplicated stopping times.
    pub fn stopping_times(&self) -> &[Time] {
        &self.stopping_times
    }

    /// The snapshot condition, if any.
    pub fn snapshot(&self) -> Option<&FdmSnapshotCondition> {
        self.snapshot.as_ref()
    }

    /// Number of conditions, the snapshot included.
    pub fn len(&self) -> usize {
        self.conditions.len() + usize::from(self.snapshot.is_some())
    }

    /// `true` without conditions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StepCondition for FdmStepConditionComposite {
    fn apply_to(&mut self, values: &mut Array, t: Time) {
        for condition in &mut self.conditions {
            condition.apply_to(values, t);
        }
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.apply_to(values, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmLogInnerValue, FdmMesherComposite, Uniform1dMesher};
    use qn_core::payoff::{OptionType, PlainVanillaPayoff};

    fn setup() -> (Arc<dyn FdmMesher>, Arc<dyn FdmInnerValueCalculator>) {
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_1d(
            Uniform1dMesher::new(4.0, 5.0, 11).unwrap(),
        ));
        let payoff = Arc::new(PlainVanillaPayoff::new(OptionType::Put, 100.0).unwrap());
        let calc = Arc::new(FdmLogInnerValue::new(payoff, Arc::clone(&mesher), 0));
        (mesher, calc)
    }

    #[test]
    fn bermudan_exercises_only_on_its_dates() {
        let (mesher, calc) = setup();
        let exercise = Exercise::bermudan(vec![0.5, 0.25, 1.0]).unwrap();
        let mut composite = FdmStepConditionComposite::vanilla_composite(
            &exercise,
            Arc::clone(&calc),
            Arc::clone(&mesher),
        );
        assert_eq!(composite.stopping_times(), &[0.25, 0.5, 1.0]);

        let mut values = Array::zeros(11);
        composite.apply_to(&mut values, 0.3);
        assert_eq!(values.norm(), 0.0);
        composite.apply_to(&mut values, 0.5);
        for iter in mesher.layout().iter() {
            assert_eq!(values[iter.index()], calc.inner_value(&iter, 0.5));
        }
    }

    #[test]
    fn american_exercise_never_lowers_values() {
        let (mesher, calc) = setup();
        let exercise = Exercise::american(0.0, 1.0).unwrap();
        let mut composite = FdmStepConditionComposite::vanilla_composite(&exercise, calc, mesher)
            .join_snapshot(FdmSnapshotCondition::new(0.1));
        assert_eq!(composite.stopping_times(), &[0.1]);
        assert_eq!(composite.len(), 2);

        let mut values = Array::from_element(11, 30.0);
        composite.apply_to(&mut values, 0.7);
        assert!(composite.snapshot().and_then(FdmSnapshotCondition::values).is_none());
        // deep in the money the put is worth at least 100 − e^4
        assert!(values[0] >= 100.0 - 4.0_f64.exp() - 1e-12);
        assert_eq!(values[10], 30.0);

        composite.apply_to(&mut values, 0.1);
        let snap = composite.snapshot().and_then(FdmSnapshotCondition::values).unwrap();
        assert_eq!(snap, &values);
    }
}
