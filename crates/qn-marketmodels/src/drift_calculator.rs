//! Drifts of displaced lognormal forwards under a discount-bond numeraire.
//!
//! Under the measure of the bond maturing at `T_N`, over one step the log
//! of the displaced forward `F_i + d_i` has drift
//!
//! ```text
//! μ_i = −Σ_{k=i+1}^{N−1} g_k C_ik   (i + 1 < N)
//! μ_i = 0                           (i + 1 = N)
//! μ_i =  Σ_{k=N}^{i}     g_k C_ik   (i ≥ N)
//! g_k = τ_k (F_k + d_k) / (1 + τ_k F_k)
//! ```
//!
//! plus the Itô term `−½ C_ii` which the evolvers add separately.

use qn_core::{ensure, errors::Result, Rate, Real, Spread, Time};
use qn_math::Matrix;

/// Drift of each alive forward over one evolution step.
#[derive(Debug, Clone)]
pub struct LmmDriftCalculator {
    number_of_rates: usize,
    number_of_factors: usize,
    full_factor: bool,
    numeraire: usize,
    alive: usize,
    displacements: Vec<Spread>,
    one_over_taus: Vec<Real>,
    pseudo: Matrix,
    covariance: Matrix,
    downs: Vec<usize>,
    ups: Vec<usize>,
}

impl LmmDriftCalculator {
    /// Calculator for the step whose covariance pseudo-root is `pseudo`.
    pub fn new(
        pseudo: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: usize,
        alive: usize,
    ) -> Result<Self> {
        let n = taus.len();
        let factors = pseudo.cols();
        ensure!(n > 0, "no rates");
        ensure!(displacements.len() == n, "{} displacements for {n} rates", displacements.len());
        ensure!(pseudo.rows() == n, "pseudo-root has {} rows for {n} rates", pseudo.rows());
        ensure!(factors > 0 && factors <= n, "{factors} factors for {n} rates");
        ensure!(alive < n, "first alive rate {alive} out of range");
        ensure!(numeraire <= n, "numeraire {numeraire} out of range");
        ensure!(numeraire >= alive, "numeraire {numeraire} expired before rate {alive}");

        let downs = (0..n).map(|i| (i + 1).min(numeraire)).collect();
        let ups = (0..n).map(|i| (i + 1).max(numeraire)).collect();
        Ok(Self {
            number_of_rates: n,
            number_of_factors: factors,
            full_factor: factors == n,
            numeraire,
            alive,
            displacements: displacements.to_vec(),
            one_over_taus: taus.iter().map(|t| 1.0 / t).collect(),
            covariance: pseudo * &pseudo.transpose(),
            pseudo: pseudo.clone(),
            downs,
            ups,
        })
    }

    /// The numeraire index.
    pub fn numeraire(&self) -> usize {
        self.numeraire
    }

    fn weights(&self, forwards: &[Rate]) -> Vec<Real> {
        (0..self.number_of_rates)
            .map(|k| {
                if k < self.alive {
                    0.0
                } else {
                    (forwards[k] + self.displacements[k]) / (self.one_over_taus[k] + forwards[k])
                }
            })
            .collect()
    }

    /// Drifts of the alive forwards; the full covariance is used when every
    /// factor is kept, the factor loadings otherwise.
    pub fn compute(&self, forwards: &[Rate], drifts: &mut [Real]) {
        if self.full_factor {
            self.compute_plain(forwards, drifts);
        } else {
            self.compute_reduced(forwards, drifts);
        }
    }

    /// Drifts from the covariance matrix, `O(n²)`.
    pub fn compute_plain(&self, forwards: &[Rate], drifts: &mut [Real]) {
        let g = self.weights(forwards);
        for i in self.alive..self.number_of_rates {
            let sum: Real = (self.downs[i]..self.ups[i])
                .map(|k| g[k] * self.covariance[(i, k)])
                .sum();
            drifts[i] = if self.numeraire > i + 1 { -sum } else { sum };
        }
    }

    /// Drifts from the pseudo-root with running sums per factor,
    /// `O(n f)`.
    pub fn compute_reduced(&self, forwards: &[Rate], drifts: &mut [Real]) {
        let g = self.weights(forwards);
        let n = self.number_of_rates;
        let f = self.number_of_factors;
        let a = &self.pseudo;
        let loading = |e: &[Real], i: usize| -> Real { (0..f).map(|r| e[r] * a[(i, r)]).sum() };

        if self.numeraire > 0 && self.numeraire - 1 >= self.alive {
            drifts[self.numeraire - 1] = 0.0;
        }

        // below the numeraire: e_r(i) = Σ_{k=i+1}^{N−1} g_k A_kr
        let mut e = vec![0.0; f];
        for i in (self.alive..self.numeraire.saturating_sub(1)).rev() {
            for (r, er) in e.iter_mut().enumerate() {
                *er += g[i + 1] * a[(i + 1, r)];
            }
            drifts[i] = -loading(&e, i);
        }

        // at and above: e_r(i) = Σ_{k=N}^{i} g_k A_kr
        e.iter_mut().for_each(|er| *er = 0.0);
        for i in self.numeraire..n {
            for (r, er) in e.iter_mut().enumerate() {
                *er += g[i] * a[(i, r)];
            }
            drifts[i] = loading(&e, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pseudo(n: usize, factors: usize) -> Matrix {
        Matrix::from_fn(n, factors, |i, r| {
            0.1 + 0.03 * ((i + 2 * r) % 5) as Real - 0.04 * r as Real
        })
    }

    #[test]
    fn martingale_forward_has_no_drift() {
        // positive loadings: every covariance entry is positive
        let a = Matrix::from_fn(4, 4, |i, r| 0.05 + 0.01 * (i + r) as Real);
        let calc = LmmDriftCalculator::new(&a, &[0.0; 4], &[0.5; 4], 3, 0).unwrap();
        let mut drifts = [1.0; 4];
        calc.compute(&[0.05; 4], &mut drifts);
        assert_eq!(drifts[2], 0.0);
        assert!(drifts[0] < 0.0 && drifts[1] < 0.0);
        assert!(drifts[3] > 0.0);
    }

    #[test]
    fn rejects_expired_numeraire() {
        let a = pseudo(4, 2);
        assert!(LmmDriftCalculator::new(&a, &[0.0; 4], &[0.5; 4], 1, 2).is_err());
        assert!(LmmDriftCalculator::new(&a, &[0.0; 3], &[0.5; 4], 4, 0).is_err());
    }

    proptest! {
        #[test]
        fn reduced_and_plain_agree(
            numeraire in 0usize..=6,
            alive in 0usize..6,
            factors in 1usize..=6,
            forwards in proptest::collection::vec(0.001f64..0.1, 6),
        ) {
            prop_assume!(numeraire >= alive);
            let a = pseudo(6, factors);
            let calc =
                LmmDriftCalculator::new(&a, &[0.01; 6], &[0.5; 6], numeraire, alive).unwrap();
            let mut plain = [0.0; 6];
            let mut reduced = [0.0; 6];
            calc.compute_plain(&forwards, &mut plain);
            calc.compute_reduced(&forwards, &mut reduced);
            for i in alive..6 {
                prop_assert!(
                    (plain[i] - reduced[i]).abs() < 1e-14,
                    "rate {}: {} vs {}",
                    i,
                    plain[i],
                    reduced[i]
                );
            }
        }
    }
}
