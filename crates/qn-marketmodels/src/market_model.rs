//! Market models: per-step covariance pseudo-roots of the displaced log
//! forwards.

use crate::evolution_description::EvolutionDescription;
use qn_core::{ensure, errors::Result, Rate, Real, Spread, Time, Volatility};
use qn_math::{rank_reduced_sqrt, Matrix, SalvagingAlgorithm};
use tracing::debug;

/// A market model of displaced lognormal forwards.
///
/// `pseudo_root(k)` is an `n × f` matrix `A_k` with `A_k A_kᵀ` the
/// covariance of `ln(F + d)` accumulated over step `k` (not per unit time).
pub trait MarketModel: std::fmt::Debug + Send + Sync {
    /// Forwards at time zero.
    fn initial_rates(&self) -> &[Rate];

    /// Displacements `d_i`.
    fn displacements(&self) -> &[Spread];

    /// Grids of the simulation.
    fn evolution(&self) -> &EvolutionDescription;

    /// Number of forwards.
    fn number_of_rates(&self) -> usize {
        self.initial_rates().len()
    }

    /// Number of Brownian factors.
    fn number_of_factors(&self) -> usize;

    /// Number of evolution steps.
    fn number_of_steps(&self) -> usize {
        self.evolution().number_of_steps()
    }

    /// Pseudo-root of step `step`.
    fn pseudo_root(&self, step: usize) -> &Matrix;

    /// Covariance over step `step`.
    fn covariance(&self, step: usize) -> Matrix {
        let a = self.pseudo_root(step);
        a * &a.transpose()
    }

    /// Covariance accumulated over steps `0..=end_step`.
    fn total_covariance(&self, end_step: usize) -> Matrix {
        let n = self.number_of_rates();
        (0..=end_step).fold(Matrix::zeros(n, n), |acc, k| &acc + &self.covariance(k))
    }
}

/// Time-homogeneous exponential correlation
/// `ρ_ij = L + (1 − L) exp(−β |T_i − T_j|)` between the forwards fixing at
/// `rate_times[i]` and `rate_times[j]`.
pub fn exponential_forward_correlation(
    rate_times: &[Time],
    long_term_corr: Real,
    beta: Real,
) -> Result<Matrix> {
    ensure!(rate_times.len() >= 2, "at least two rate times required");
    ensure!(
        (0.0..=1.0).contains(&long_term_corr),
        "long-term correlation ({long_term_corr}) outside [0, 1]"
    );
    ensure!(beta >= 0.0, "negative decay ({beta})");
    let n = rate_times.len() - 1;
    Ok(Matrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else {
            let decay = (-beta * (rate_times[i] - rate_times[j]).abs()).exp();
            long_term_corr + (1.0 - long_term_corr) * decay
        }
    }))
}

/// Flat volatility per forward with a constant correlation matrix.
///
/// Forward `i` diffuses with volatility `σ_i` until its fixing time `T_i`.
#[derive(Debug, Clone)]
pub struct FlatVol {
    initial_rates: Vec<Rate>,
    displacements: Vec<Spread>,
    evolution: EvolutionDescription,
    number_of_factors: usize,
    pseudo_roots: Vec<Matrix>,
}

impl FlatVol {
    /// Build the model; the pseudo-roots keep the `factors` principal
    /// components of each step's covariance.
    pub fn new(
        volatilities: &[Volatility],
        correlations: &Matrix,
        evolution: EvolutionDescription,
        factors: usize,
        initial_rates: Vec<Rate>,
        displacements: Vec<Spread>,
    ) -> Result<Self> {
        let n = evolution.number_of_rates();
        let steps = evolution.number_of_steps();
        ensure!(initial_rates.len() == n, "{} initial rates for {n} forwards", initial_rates.len());
        ensure!(displacements.len() == n, "{} displacements for {n} forwards", displacements.len());
        ensure!(volatilities.len() == n, "{} volatilities for {n} forwards", volatilities.len());
        ensure!(
            correlations.rows() == n && correlations.cols() == n,
            "correlation matrix is {}×{}, {n}×{n} required",
            correlations.rows(),
            correlations.cols()
        );
        ensure!(factors >= 1 && factors <= n, "{factors} factors for {n} forwards");
        ensure!(
            n <= factors * steps,
            "{n} forwards exceed {factors} factors times {steps} steps"
        );
        for (i, (&f, &d)) in initial_rates.iter().zip(&displacements).enumerate() {
            ensure!(f + d > 0.0, "displaced forward {i} ({}) not positive", f + d);
        }

        let mut pseudo_roots = Vec::with_capacity(steps);
        let mut explained_min: Real = 1.0;
        for k in 0..steps {
            let std_dev: Vec<Real> = (0..n)
                .map(|i| {
                    let start = if k > 0 { evolution.effective_stop_time(k - 1, i) } else { 0.0 };
                    volatilities[i] * (evolution.effective_stop_time(k, i) - start).sqrt()
                })
                .collect();
            let covariance =
                Matrix::from_fn(n, n, |i, j| std_dev[i] * correlations[(i, j)] * std_dev[j]);
            let (root, explained) =
                rank_reduced_sqrt(&covariance, factors, 1.0, SalvagingAlgorithm::Spectral)?;
            explained_min = explained_min.min(explained);
            pseudo_roots.push(root);
        }
        debug!(rates = n, steps, factors, explained_min, "flat-vol market model built");

        Ok(Self {
            initial_rates,
            displacements,
            evolution,
            number_of_factors: factors,
            pseudo_roots,
        })
    }
}

impl MarketModel for FlatVol {
    fn initial_rates(&self) -> &[Rate] {
        &self.initial_rates
    }

    fn displacements(&self) -> &[Spread] {
        &self.displacements
    }

    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn number_of_factors(&self) -> usize {
        self.number_of_factors
    }

    fn pseudo_root(&self, step: usize) -> &Matrix {
        &self.pseudo_roots[step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rate_times() -> Vec<Time> {
        vec![0.5, 1.0, 1.5, 2.0, 2.5]
    }

    fn model(factors: usize) -> FlatVol {
        let times = rate_times();
        let correlations = exponential_forward_correlation(&times, 0.5, 0.8).unwrap();
        let evolution = EvolutionDescription::new(times, Vec::new(), Vec::new()).unwrap();
        FlatVol::new(
            &[0.2, 0.18, 0.16, 0.15],
            &correlations,
            evolution,
            factors,
            vec![0.05; 4],
            vec![0.0; 4],
        )
        .unwrap()
    }

    #[test]
    fn correlation_decays_towards_the_long_term_level() {
        let rho = exponential_forward_correlation(&rate_times(), 0.5, 0.8).unwrap();
        assert_eq!(rho.rows(), 4);
        assert_eq!(rho[(2, 2)], 1.0);
        assert_abs_diff_eq!(rho[(0, 1)], 0.5 + 0.5 * (-0.4_f64).exp(), epsilon = 1e-15);
        assert!(rho[(0, 3)] < rho[(0, 1)] && rho[(0, 3)] > 0.5);
        assert!(exponential_forward_correlation(&rate_times(), 1.5, 0.8).is_err());
    }

    #[test]
    fn full_factor_model_accumulates_the_black_variance() {
        let m = model(4);
        assert_eq!(m.number_of_steps(), 4);
        assert_eq!(m.pseudo_root(0).cols(), 4);
        // forward i has been alive for T_i at its fixing
        let total = m.total_covariance(3);
        let vols = [0.2, 0.18, 0.16, 0.15];
        for (i, t) in [0.5, 1.0, 1.5, 2.0].into_iter().enumerate() {
            assert_abs_diff_eq!(total[(i, i)], vols[i] * vols[i] * t, epsilon = 1e-12);
        }
        // a dead forward stops diffusing
        assert_abs_diff_eq!(m.covariance(2)[(0, 0)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn reduced_factor_roots_keep_the_variances() {
        let m = model(2);
        let c = m.covariance(0);
        assert_eq!(m.pseudo_root(0).cols(), 2);
        assert_abs_diff_eq!(c[(3, 3)], 0.15 * 0.15 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_inconsistent_inputs() {
        let times = rate_times();
        let correlations = exponential_forward_correlation(&times, 0.5, 0.8).unwrap();
        let evolution = EvolutionDescription::new(times, Vec::new(), Vec::new()).unwrap();
        let flat = |vols: &[Real], factors: usize, initial: Real| {
            FlatVol::new(
                vols,
                &correlations,
                evolution.clone(),
                factors,
                vec![initial; 4],
                vec![0.0; 4],
            )
        };
        assert!(flat(&[0.2; 3], 2, 0.05).is_err());
        assert!(flat(&[0.2; 4], 5, 0.05).is_err());
        assert!(flat(&[0.2; 4], 2, -0.05).is_err());
    }
}
