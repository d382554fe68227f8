//! Snapshot of the forward curve on the rate-time grid.
//!
//! Discount ratios `P(T_i) / P(T_j)` are all a market model ever knows
//! about bonds: they are independent of the (unknown) discount to the
//! current time. Coterminal and constant-maturity swap rates and annuities
//! follow from them.

use crate::evolution_description::check_increasing_times;
use qn_core::{ensure, errors::Result, Rate, Real, Time};

/// Read access to a curve on a rate-time grid.
pub trait CurveState: std::fmt::Debug + Send + Sync {
    /// Rate times `T_0 < … < T_n`.
    fn rate_times(&self) -> &[Time];

    /// Accrual periods.
    fn rate_taus(&self) -> &[Time];

    /// Number of forwards.
    fn number_of_rates(&self) -> usize {
        self.rate_taus().len()
    }

    /// First forward carrying a value.
    fn first_valid_index(&self) -> usize;

    /// All forwards; entries before [`first_valid_index`](Self::first_valid_index)
    /// are stale.
    fn forward_rates(&self) -> &[Rate];

    /// Forward `i`.
    fn forward_rate(&self, i: usize) -> Rate {
        self.forward_rates()[i]
    }

    /// `P(T_i) / P(T_j)`.
    fn discount_ratio(&self, i: usize, j: usize) -> Real;

    /// Swap rate over `[T_i, T_n]`.
    fn coterminal_swap_rate(&self, i: usize) -> Rate;

    /// Annuity of the coterminal swap starting at `T_i`, in units of the
    /// bond `numeraire`.
    fn coterminal_swap_annuity(&self, numeraire: usize, i: usize) -> Real;

    /// Swap rate over `[T_i, T_{min(i + spanning, n)}]`.
    fn cm_swap_rate(&self, i: usize, spanning: usize) -> Rate;

    /// Annuity of the swap over `[T_i, T_{min(i + spanning, n)}]`, in units
    /// of the bond `numeraire`.
    fn cm_swap_annuity(&self, numeraire: usize, i: usize, spanning: usize) -> Real;
}

/// Curve state parametrised by forward rates.
#[derive(Debug, Clone)]
pub struct LmmCurveState {
    rate_times: Vec<Time>,
    rate_taus: Vec<Time>,
    first: usize,
    forward_rates: Vec<Rate>,
    // P(T_i) / P(T_first); one entry per rate time
    disc_ratios: Vec<Real>,
    // Σ_{k ≥ i} τ_k P(T_{k+1}) / P(T_first)
    cot_annuities: Vec<Real>,
}

impl LmmCurveState {
    /// Empty state on `rate_times`.
    pub fn new(rate_times: Vec<Time>) -> Result<Self> {
        ensure!(rate_times.len() >= 2, "at least two rate times required");
        check_increasing_times(&rate_times)?;
        let n = rate_times.len() - 1;
        let rate_taus = rate_times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self {
            rate_times,
            rate_taus,
            first: n,
            forward_rates: vec![0.0; n],
            disc_ratios: vec![1.0; n + 1],
            cot_annuities: vec![0.0; n],
        })
    }

    /// Set the forwards from index `first_valid_index` on.
    pub fn set_on_forward_rates(&mut self, rates: &[Rate], first_valid_index: usize) -> Result<()> {
        let n = self.rate_taus.len();
        ensure!(rates.len() == n, "{} forwards for {n} rates", rates.len());
        ensure!(first_valid_index < n, "first valid index {first_valid_index} out of range");
        self.update_forward_rates(rates, first_valid_index);
        Ok(())
    }

    /// [`set_on_forward_rates`](Self::set_on_forward_rates) for callers that
    /// have already checked the sizes.
    pub(crate) fn update_forward_rates(&mut self, rates: &[Rate], first_valid_index: usize) {
        let n = self.rate_taus.len();
        debug_assert!(rates.len() == n && first_valid_index < n);
        self.first = first_valid_index;
        self.forward_rates[first_valid_index..].copy_from_slice(&rates[first_valid_index..]);
        self.disc_ratios[first_valid_index] = 1.0;
        for i in first_valid_index..n {
            self.disc_ratios[i + 1] =
                self.disc_ratios[i] / (1.0 + self.forward_rates[i] * self.rate_taus[i]);
        }
        self.compute_coterminal_annuities();
    }

    /// Set the discount ratios (one per rate time) from index
    /// `first_valid_index` on.
    pub fn set_on_discount_ratios(
        &mut self,
        ratios: &[Real],
        first_valid_index: usize,
    ) -> Result<()> {
        let n = self.rate_taus.len();
        ensure!(ratios.len() == n + 1, "{} discount ratios for {} rate times", ratios.len(), n + 1);
        ensure!(first_valid_index < n, "first valid index {first_valid_index} out of range");
        self.first = first_valid_index;
        let base = ratios[first_valid_index];
        for i in first_valid_index..=n {
            self.disc_ratios[i] = ratios[i] / base;
        }
        for i in first_valid_index..n {
            self.forward_rates[i] =
                (self.disc_ratios[i] / self.disc_ratios[i + 1] - 1.0) / self.rate_taus[i];
        }
        self.compute_coterminal_annuities();
        Ok(())
    }

    fn compute_coterminal_annuities(&mut self) {
        let n = self.rate_taus.len();
        let mut annuity = 0.0;
        for i in (self.first..n).rev() {
            annuity += self.rate_taus[i] * self.disc_ratios[i + 1];
            self.cot_annuities[i] = annuity;
        }
    }

    fn cm_annuity(&self, i: usize, end: usize) -> Real {
        (i..end).map(|k| self.rate_taus[k] * self.disc_ratios[k + 1]).sum()
    }

    fn check_valid(&self, i: usize) {
        debug_assert!(
            i >= self.first,
            "index {i} before the first valid index {}",
            self.first
        );
    }
}

impl CurveState for LmmCurveState {
    fn rate_times(&self) -> &[Time] {
        &self.rate_times
    }

    fn rate_taus(&self) -> &[Time] {
        &self.rate_taus
    }

    fn first_valid_index(&self) -> usize {
        self.first
    }

    fn forward_rates(&self) -> &[Rate] {
        &self.forward_rates
    }

    fn discount_ratio(&self, i: usize, j: usize) -> Real {
        self.check_valid(i.min(j));
        self.disc_ratios[i] / self.disc_ratios[j]
    }

    fn coterminal_swap_rate(&self, i: usize) -> Rate {
        self.check_valid(i);
        let n = self.rate_taus.len();
        (self.disc_ratios[i] - self.disc_ratios[n]) / self.cot_annuities[i]
    }

    fn coterminal_swap_annuity(&self, numeraire: usize, i: usize) -> Real {
        self.check_valid(i.min(numeraire));
        self.cot_annuities[i] / self.disc_ratios[numeraire]
    }

    fn cm_swap_rate(&self, i: usize, spanning: usize) -> Rate {
        self.check_valid(i);
        let end = (i + spanning).min(self.rate_taus.len());
        (self.disc_ratios[i] - self.disc_ratios[end]) / self.cm_annuity(i, end)
    }

    fn cm_swap_annuity(&self, numeraire: usize, i: usize, spanning: usize) -> Real {
        self.check_valid(i.min(numeraire));
        let end = (i + spanning).min(self.rate_taus.len());
        self.cm_annuity(i, end) / self.disc_ratios[numeraire]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn state(forwards: &[Rate]) -> LmmCurveState {
        let times: Vec<Time> = (0..=forwards.len()).map(|i| 0.5 + 0.5 * i as Time).collect();
        let mut cs = LmmCurveState::new(times).unwrap();
        cs.set_on_forward_rates(forwards, 0).unwrap();
        cs
    }

    #[test]
    fn flat_forwards() {
        let cs = state(&[0.04; 4]);
        let d = 1.0 / 1.02;
        assert_abs_diff_eq!(cs.discount_ratio(1, 0), d, epsilon = 1e-15);
        assert_abs_diff_eq!(cs.discount_ratio(0, 4), 1.02_f64.powi(4), epsilon = 1e-13);
        // on a flat simply-compounded curve every swap rate is the forward
        for i in 0..4 {
            assert_abs_diff_eq!(cs.coterminal_swap_rate(i), 0.04, epsilon = 1e-14);
            assert_abs_diff_eq!(cs.cm_swap_rate(i, 2), 0.04, epsilon = 1e-14);
        }
        let annuity = 0.5 * (d + d * d + d * d * d);
        assert_abs_diff_eq!(cs.coterminal_swap_annuity(1, 1), annuity, epsilon = 1e-14);
        assert_abs_diff_eq!(cs.coterminal_swap_annuity(0, 1), annuity * d, epsilon = 1e-14);
        assert_abs_diff_eq!(cs.cm_swap_annuity(1, 1, 10), annuity, epsilon = 1e-14);
        assert_abs_diff_eq!(cs.cm_swap_annuity(0, 0, 1), 0.5 * d, epsilon = 1e-14);
    }

    #[test]
    fn partial_updates_keep_the_valid_tail() {
        let mut cs = state(&[0.03, 0.04, 0.05]);
        cs.set_on_forward_rates(&[9.0, 0.045, 0.05], 1).unwrap();
        assert_eq!(cs.first_valid_index(), 1);
        assert_abs_diff_eq!(cs.forward_rate(1), 0.045);
        assert_abs_diff_eq!(cs.discount_ratio(2, 1), 1.0 / (1.0 + 0.045 * 0.5), epsilon = 1e-15);
        assert!(cs.set_on_forward_rates(&[0.03, 0.04], 0).is_err());
    }

    #[test]
    fn discount_ratios_round_trip_to_forwards() {
        let cs = state(&[0.02, 0.03, 0.05]);
        let ratios: Vec<Real> = (0..4).map(|i| cs.discount_ratio(i, 0)).collect();
        let mut other = LmmCurveState::new(cs.rate_times().to_vec()).unwrap();
        other.set_on_discount_ratios(&ratios, 0).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(other.forward_rate(i), cs.forward_rate(i), epsilon = 1e-14);
        }
    }

    proptest! {
        #[test]
        fn swap_rate_is_an_annuity_weighted_forward_average(
            forwards in proptest::collection::vec(0.001f64..0.2, 2..8)
        ) {
            let cs = state(&forwards);
            let n = forwards.len();
            let weights: Vec<Real> = (0..n).map(|k| 0.5 * cs.discount_ratio(k + 1, 0)).collect();
            let expected = (0..n).map(|k| weights[k] * forwards[k]).sum::<Real>()
                / weights.iter().sum::<Real>();
            prop_assert!((cs.coterminal_swap_rate(0) - expected).abs() < 1e-12);
        }
    }
}
