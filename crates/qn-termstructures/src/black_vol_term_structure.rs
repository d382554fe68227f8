//! `BlackVolTermStructure`, Black implied volatility by time and strike.
//!
//! Provides the trait and two implementations:
//! * `BlackConstantVol`, flat in time and strike;
//! * `BlackVarianceCurve`, time-dependent and strike-independent, with total
//!   variance interpolated linearly in time.

use crate::term_structure::TermStructure;
use qn_core::{ensure, errors::Result, Real, Time, Volatility};
use qn_math::{Interpolation1D, LinearInterpolation};

/// A Black-volatility term structure.
///
/// Implementors provide at least one of
/// [`black_vol_impl`](BlackVolTermStructure::black_vol_impl) and
/// [`black_variance_impl`](BlackVolTermStructure::black_variance_impl).
pub trait BlackVolTermStructure: TermStructure {
    /// Black volatility for time `t` and strike.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Volatility {
        let t = t.max(1.0e-5);
        (self.black_variance_impl(t, strike) / t).sqrt()
    }

    /// Total Black variance `σ²t` for time `t` and strike.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Real {
        let vol = self.black_vol_impl(t, strike);
        vol * vol * t
    }

    /// Black volatility.
    fn black_vol(&self, t: Time, strike: Real) -> Volatility {
        self.black_vol_impl(t, strike)
    }

    /// Total Black variance.
    fn black_variance(&self, t: Time, strike: Real) -> Real {
        self.black_variance_impl(t, strike)
    }

    /// Forward variance between `t1` and `t2`.
    fn black_forward_variance(&self, t1: Time, t2: Time, strike: Real) -> Real {
        debug_assert!(t2 >= t1, "t2 ({t2}) < t1 ({t1})");
        self.black_variance(t2, strike) - self.black_variance(t1, strike)
    }

    /// Forward volatility between `t1` and `t2`.
    fn black_forward_vol(&self, t1: Time, t2: Time, strike: Real) -> Volatility {
        if t2 - t1 <= f64::EPSILON {
            return self.black_vol(t1, strike);
        }
        (self.black_forward_variance(t1, t2, strike).max(0.0) / (t2 - t1)).sqrt()
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// Flat Black volatility, `σ(t, K) = σ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackConstantVol {
    volatility: Volatility,
}

impl BlackConstantVol {
    /// Constant volatility surface.
    pub fn new(volatility: Volatility) -> Self {
        Self { volatility }
    }

    /// The constant volatility.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl TermStructure for BlackConstantVol {}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Volatility {
        self.volatility
    }

    fn black_variance_impl(&self, t: Time, _strike: Real) -> Real {
        self.volatility * self.volatility * t
    }
}

// ── BlackVarianceCurve ────────────────────────────────────────────────────────

/// Term structure of at-the-money volatilities.
///
/// Total variance is linear between nodes (starting from zero at `t = 0`)
/// and extrapolated with the last node's volatility.
#[derive(Debug, Clone)]
pub struct BlackVarianceCurve {
    times: Vec<Time>,
    variances: Vec<Real>,
    interpolation: LinearInterpolation,
}

impl BlackVarianceCurve {
    /// Build from strictly increasing positive `times` and the Black
    /// volatilities at those times. Total variance must not decrease.
    pub fn new(times: &[Time], volatilities: &[Volatility]) -> Result<Self> {
        ensure!(
            times.len() == volatilities.len(),
            "{} times but {} volatilities",
            times.len(),
            volatilities.len()
        );
        ensure!(!times.is_empty(), "no volatilities given");
        ensure!(times[0] > 0.0, "first time must be positive, got {}", times[0]);
        let mut ts = vec![0.0];
        let mut vs = vec![0.0];
        for (&t, &v) in times.iter().zip(volatilities) {
            let var = v * v * t;
            ensure!(
                var >= vs[vs.len() - 1],
                "variance must be non-decreasing (at t = {t})"
            );
            ts.push(t);
            vs.push(var);
        }
        let interpolation = LinearInterpolation::new(&ts, &vs)?;
        Ok(Self {
            times: ts,
            variances: vs,
            interpolation,
        })
    }

    /// Node times, starting at zero.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Instantaneous variance `∂(σ²t)/∂t` at `t`.
    pub fn instantaneous_variance(&self, t: Time) -> Real {
        if t > self.max_time() {
            let n = self.times.len() - 1;
            return self.variances[n] / self.times[n];
        }
        self.interpolation.derivative(t)
    }
}

impl TermStructure for BlackVarianceCurve {
    fn max_time(&self) -> Time {
        self.times[self.times.len() - 1]
    }
}

impl BlackVolTermStructure for BlackVarianceCurve {
    fn black_variance_impl(&self, t: Time, _strike: Real) -> Real {
        let t_max = self.max_time();
        if t <= t_max {
            self.interpolation.value(t)
        } else {
            // flat volatility extrapolation
            self.variances[self.variances.len() - 1] * t / t_max
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_vol() {
        let v = BlackConstantVol::new(0.2);
        assert_abs_diff_eq!(v.black_variance(2.0, 100.0), 0.08, epsilon = 1e-15);
        assert_abs_diff_eq!(v.black_forward_vol(1.0, 2.0, 100.0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn variance_curve_nodes_and_forward_vol() {
        let c = BlackVarianceCurve::new(&[1.0, 2.0], &[0.2, 0.25]).unwrap();
        assert_abs_diff_eq!(c.black_vol(1.0, 0.0), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(c.black_vol(2.0, 0.0), 0.25, epsilon = 1e-12);
        // forward variance between 1 and 2 is 0.125 − 0.04
        assert_abs_diff_eq!(
            c.black_forward_vol(1.0, 2.0, 0.0),
            0.085_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(c.instantaneous_variance(1.5), 0.085, epsilon = 1e-12);
        assert_abs_diff_eq!(c.black_vol(4.0, 0.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn decreasing_variance_rejected() {
        assert!(BlackVarianceCurve::new(&[1.0, 2.0], &[0.3, 0.2]).is_err());
    }
}
