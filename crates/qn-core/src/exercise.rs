//! Exercise schedules.
//!
//! Times are year fractions from the reference time. A European exercise
//! has a single time, an American exercise an interval, a Bermudan
//! exercise a sorted set of distinct times.

use crate::{ensure, Result, Time};
use serde::{Deserialize, Serialize};

/// Kind of exercise right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
    /// Exercisable at expiry only.
    European,
    /// Exercisable at any time in an interval.
    American,
    /// Exercisable on a discrete set of times.
    Bermudan,
}

/// When an option can be exercised.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    exercise_type: ExerciseType,
    times: Vec<Time>,
}

impl Exercise {
    /// Exercise at `expiry` only.
    pub fn european(expiry: Time) -> Result<Self> {
        ensure!(expiry >= 0.0, "negative expiry time {expiry}");
        Ok(Self {
            exercise_type: ExerciseType::European,
            times: vec![expiry],
        })
    }

    /// Exercise at any time in `[earliest, latest]`.
    pub fn american(earliest: Time, latest: Time) -> Result<Self> {
        ensure!(earliest >= 0.0, "negative earliest exercise time {earliest}");
        ensure!(
            latest >= earliest,
            "latest exercise time {latest} before earliest {earliest}"
        );
        Ok(Self {
            exercise_type: ExerciseType::American,
            times: vec![earliest, latest],
        })
    }

    /// Exercise on each of `times`; the times are sorted and deduplicated.
    pub fn bermudan(mut times: Vec<Time>) -> Result<Self> {
        ensure!(!times.is_empty(), "no exercise times given");
        ensure!(
            times.iter().all(|t| t.is_finite() && *t >= 0.0),
            "exercise times must be finite and non-negative"
        );
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup_by(|a, b| crate::same_time(*a, *b));
        Ok(Self {
            exercise_type: ExerciseType::Bermudan,
            times,
        })
    }

    /// The kind of exercise.
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }

    /// The exercise times (for American exercise: `[earliest, latest]`).
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// The last time at which the option can be exercised.
    pub fn last_time(&self) -> Time {
        self.times[self.times.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bermudan_times_sorted_and_unique() {
        let ex = Exercise::bermudan(vec![2.0, 1.0, 2.0, 0.5]).unwrap();
        assert_eq!(ex.times(), &[0.5, 1.0, 2.0]);
        assert_eq!(ex.last_time(), 2.0);
        assert_eq!(ex.exercise_type(), ExerciseType::Bermudan);
    }

    #[test]
    fn american_interval_checked() {
        assert!(Exercise::american(1.0, 0.5).is_err());
        let ex = Exercise::american(0.0, 1.0).unwrap();
        assert_eq!(ex.last_time(), 1.0);
    }

    #[test]
    fn empty_bermudan_rejected() {
        assert!(Exercise::bermudan(Vec::new()).is_err());
    }
}
