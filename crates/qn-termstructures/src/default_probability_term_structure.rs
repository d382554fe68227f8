//! `DefaultProbabilityTermStructure`, credit curves.
//!
//! Provides the trait plus:
//! * `FlatHazardRate`, a constant hazard rate;
//! * `PiecewiseFlatHazardRate`, hazard constant between node times.

use crate::term_structure::TermStructure;
use qn_core::{ensure, errors::Result, Probability, Rate, Real, Time};

/// A default-probability term structure.
///
/// Implementors provide [`survival_probability_impl`]; hazard rate and
/// default density are derived numerically unless overridden.
///
/// [`survival_probability_impl`]: DefaultProbabilityTermStructure::survival_probability_impl
pub trait DefaultProbabilityTermStructure: TermStructure {
    /// Survival probability `S(t) = P(τ > t)`.
    fn survival_probability_impl(&self, t: Time) -> Probability;

    /// Hazard rate `h(t) = −∂ ln S / ∂t`.
    fn hazard_rate_impl(&self, t: Time) -> Rate {
        let dt = 1.0e-4;
        let t1 = (t - 0.5 * dt).max(0.0);
        let t2 = t1 + dt;
        let s2 = self.survival_probability_impl(t2);
        if s2 <= 0.0 {
            return 0.0;
        }
        (self.survival_probability_impl(t1).ln() - s2.ln()) / dt
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Survival probability to `t`.
    fn survival_probability(&self, t: Time) -> Probability {
        if t <= 0.0 {
            1.0
        } else {
            self.survival_probability_impl(t)
        }
    }

    /// Probability of default before `t`.
    fn default_probability(&self, t: Time) -> Probability {
        1.0 - self.survival_probability(t)
    }

    /// Probability of default in `(t1, t2]`.
    fn default_probability_between(&self, t1: Time, t2: Time) -> Probability {
        debug_assert!(t2 >= t1, "t2 ({t2}) < t1 ({t1})");
        self.survival_probability(t1) - self.survival_probability(t2)
    }

    /// Hazard rate at `t`.
    fn hazard_rate(&self, t: Time) -> Rate {
        self.hazard_rate_impl(t)
    }

    /// Default density `f(t) = h(t) S(t)`.
    fn default_density(&self, t: Time) -> Real {
        self.hazard_rate(t) * self.survival_probability(t)
    }
}

// ── FlatHazardRate ────────────────────────────────────────────────────────────

/// Constant hazard rate `λ`: `S(t) = e^{−λt}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatHazardRate {
    hazard: Rate,
}

impl FlatHazardRate {
    /// Flat hazard curve; `hazard` must be non-negative.
    pub fn new(hazard: Rate) -> Result<Self> {
        ensure!(hazard >= 0.0, "negative hazard rate {hazard}");
        Ok(Self { hazard })
    }
}

impl TermStructure for FlatHazardRate {}

impl DefaultProbabilityTermStructure for FlatHazardRate {
    fn survival_probability_impl(&self, t: Time) -> Probability {
        (-self.hazard * t).exp()
    }

    fn hazard_rate_impl(&self, _t: Time) -> Rate {
        self.hazard
    }
}

// ── PiecewiseFlatHazardRate ───────────────────────────────────────────────────

/// Hazard `λ_i` on `(t_{i−1}, t_i]` with `t_0 = 0`; the last hazard is
/// extended beyond the last node.
#[derive(Debug, Clone)]
pub struct PiecewiseFlatHazardRate {
    times: Vec<Time>,
    hazards: Vec<Rate>,
    // cumulative hazard at each node time
    integrated: Vec<Real>,
}

impl PiecewiseFlatHazardRate {
    /// Build from strictly increasing positive node `times` and the hazard
    /// rate on the interval ending at each node.
    pub fn new(times: &[Time], hazards: &[Rate]) -> Result<Self> {
        ensure!(
            times.len() == hazards.len() && !times.is_empty(),
            "need the same non-zero number of times and hazards"
        );
        ensure!(times[0] > 0.0, "first node time must be positive");
        ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            "node times must be increasing"
        );
        ensure!(
            hazards.iter().all(|&h| h >= 0.0),
            "hazard rates must be non-negative"
        );
        let mut integrated = Vec::with_capacity(times.len());
        let mut acc = 0.0;
        let mut prev = 0.0;
        for (&t, &h) in times.iter().zip(hazards) {
            acc += h * (t - prev);
            integrated.push(acc);
            prev = t;
        }
        Ok(Self {
            times: times.to_vec(),
            hazards: hazards.to_vec(),
            integrated,
        })
    }

    fn segment(&self, t: Time) -> usize {
        self.times
            .partition_point(|&ti| ti < t)
            .min(self.times.len() - 1)
    }
}

impl TermStructure for PiecewiseFlatHazardRate {
    fn max_time(&self) -> Time {
        self.times[self.times.len() - 1]
    }
}

impl DefaultProbabilityTermStructure for PiecewiseFlatHazardRate {
    fn survival_probability_impl(&self, t: Time) -> Probability {
        let i = self.segment(t);
        let (start, base) = if i == 0 {
            (0.0, 0.0)
        } else {
            (self.times[i - 1], self.integrated[i - 1])
        };
        (-(base + self.hazards[i] * (t - start))).exp()
    }

    fn hazard_rate_impl(&self, t: Time) -> Rate {
        self.hazards[self.segment(t)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_hazard() {
        let c = FlatHazardRate::new(0.02).unwrap();
        assert_abs_diff_eq!(c.survival_probability(5.0), (-0.1_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(c.default_density(1.0), 0.02 * (-0.02_f64).exp(), epsilon = 1e-15);
        assert!(FlatHazardRate::new(-0.01).is_err());
    }

    #[test]
    fn piecewise_hazard_integrates() {
        let c = PiecewiseFlatHazardRate::new(&[1.0, 3.0], &[0.01, 0.03]).unwrap();
        assert_abs_diff_eq!(c.survival_probability(1.0), (-0.01_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(c.survival_probability(2.0), (-0.04_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(c.survival_probability(4.0), (-0.10_f64).exp(), epsilon = 1e-15);
        assert_eq!(c.hazard_rate(0.5), 0.01);
        assert_eq!(c.hazard_rate(2.5), 0.03);
        assert_abs_diff_eq!(
            c.default_probability_between(1.0, 2.0),
            (-0.01_f64).exp() - (-0.04_f64).exp(),
            epsilon = 1e-15
        );
    }
}
