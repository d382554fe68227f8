//! `InterpolatedDiscountCurve`, log-linear interpolation of discount
//! factors.
//!
//! Log-linear discount interpolation gives piecewise-flat instantaneous
//! forwards between nodes. Beyond the last node the last forward is
//! extended.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use qn_core::{ensure, errors::Result, DiscountFactor, Rate, Time};
use qn_math::{Interpolation1D, LogLinearInterpolation};

/// Yield curve through `(t_i, P(0, t_i))` nodes.
#[derive(Debug, Clone)]
pub struct InterpolatedDiscountCurve {
    times: Vec<Time>,
    discounts: Vec<DiscountFactor>,
    interpolation: LogLinearInterpolation,
}

impl InterpolatedDiscountCurve {
    /// Build the curve. A node at `t = 0` with discount 1 is prepended when
    /// missing; times must be increasing and discounts positive.
    pub fn new(times: &[Time], discounts: &[DiscountFactor]) -> Result<Self> {
        ensure!(
            times.len() == discounts.len(),
            "{} times but {} discount factors",
            times.len(),
            discounts.len()
        );
        ensure!(!times.is_empty(), "no nodes given");
        let mut ts = Vec::with_capacity(times.len() + 1);
        let mut ds = Vec::with_capacity(times.len() + 1);
        if times[0] > 0.0 {
            ts.push(0.0);
            ds.push(1.0);
        } else {
            ensure!(times[0] == 0.0, "negative node time {}", times[0]);
            ensure!(
                (discounts[0] - 1.0).abs() < 1e-12,
                "discount at t = 0 must be 1, got {}",
                discounts[0]
            );
        }
        ts.extend_from_slice(times);
        ds.extend_from_slice(discounts);
        let interpolation = LogLinearInterpolation::new(&ts, &ds)?;
        Ok(Self {
            times: ts,
            discounts: ds,
            interpolation,
        })
    }

    /// Node times, starting at zero.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Node discount factors.
    pub fn discounts(&self) -> &[DiscountFactor] {
        &self.discounts
    }
}

impl TermStructure for InterpolatedDiscountCurve {
    fn max_time(&self) -> Time {
        self.times[self.times.len() - 1]
    }
}

impl YieldTermStructure for InterpolatedDiscountCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.interpolation.value(t)
    }

    fn instantaneous_forward(&self, t: Time) -> Rate {
        // d ln P / dt is piecewise constant
        -self.interpolation.derivative(t) / self.interpolation.value(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reprices_nodes_and_flat_forwards() {
        let curve = InterpolatedDiscountCurve::new(
            &[1.0, 2.0, 5.0],
            &[(-0.03_f64).exp(), (-0.07_f64).exp(), (-0.22_f64).exp()],
        )
        .unwrap();
        assert_abs_diff_eq!(curve.discount(2.0), (-0.07_f64).exp(), epsilon = 1e-14);
        assert_abs_diff_eq!(curve.instantaneous_forward(1.5), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.instantaneous_forward(3.0), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.forward_rate(2.0, 5.0), 0.05, epsilon = 1e-12);
        // extrapolation extends the last forward
        assert_abs_diff_eq!(curve.discount(6.0), (-0.27_f64).exp(), epsilon = 1e-12);
        assert_eq!(curve.max_time(), 5.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(InterpolatedDiscountCurve::new(&[1.0, 2.0], &[0.9]).is_err());
        assert!(InterpolatedDiscountCurve::new(&[0.0, 1.0], &[0.9, 0.8]).is_err());
    }
}
