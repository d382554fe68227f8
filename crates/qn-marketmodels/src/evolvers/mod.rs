//! Evolvers: step a market model's forwards along its evolution times.
//!
//! Both evolvers work on `ln(F_i + d_i)`, which over step `k` moves by
//!
//! ```text
//! μ_i(F) − ½ Σ_r A_k(i, r)² + Σ_r A_k(i, r) z_r
//! ```
//!
//! with `μ` from [`LmmDriftCalculator`] under the step's numeraire. Forwards
//! that have fixed are frozen at their last value.

mod lognormal_fwd_rate_euler;
mod lognormal_fwd_rate_pc;

pub use lognormal_fwd_rate_euler::LogNormalFwdRateEuler;
pub use lognormal_fwd_rate_pc::LogNormalFwdRatePc;

use crate::brownian_generator::{BrownianGenerator, BrownianGeneratorFactory};
use crate::curve_state::{CurveState, LmmCurveState};
use crate::drift_calculator::LmmDriftCalculator;
use crate::evolution_description::check_compatibility;
use crate::market_model::MarketModel;
use qn_core::{ensure, errors::Result, Rate, Real, Spread};
use std::sync::Arc;
use tracing::debug;

/// Simulates the curve of a market model step by step.
pub trait MarketModelEvolver: std::fmt::Debug + Send {
    /// Numeraire bond of each step.
    fn numeraires(&self) -> &[usize];

    /// Reset to the initial curve and draw a new path; returns the path's
    /// importance weight.
    fn start_new_path(&mut self) -> Real;

    /// Evolve the curve over the current step; returns the step's
    /// importance weight.
    fn advance_step(&mut self) -> Real;

    /// Index of the next step to evolve.
    fn current_step(&self) -> usize;

    /// Curve reached after the last step.
    fn current_state(&self) -> &dyn CurveState;

    /// Start later paths from the forwards of `state`.
    fn set_initial_state(&mut self, state: &dyn CurveState) -> Result<()>;
}

/// State shared by the lognormal forward-rate evolvers.
#[derive(Debug)]
pub(crate) struct LogNormalFwdRateCore {
    model: Arc<dyn MarketModel>,
    numeraires: Vec<usize>,
    initial_step: usize,
    generator: Box<dyn BrownianGenerator>,
    displacements: Vec<Spread>,
    // −½ diag(A Aᵀ) per step
    fixed_drifts: Vec<Vec<Real>>,
    calculators: Vec<LmmDriftCalculator>,
    alive: Vec<usize>,
    forwards: Vec<Rate>,
    log_forwards: Vec<Real>,
    initial_forwards: Vec<Rate>,
    initial_log_forwards: Vec<Real>,
    initial_drifts: Vec<Real>,
    drifts1: Vec<Real>,
    drifts2: Vec<Real>,
    brownians: Vec<Real>,
    curve_state: LmmCurveState,
    current_step: usize,
}

impl LogNormalFwdRateCore {
    pub(crate) fn new(
        model: Arc<dyn MarketModel>,
        factory: &dyn BrownianGeneratorFactory,
        numeraires: Vec<usize>,
        initial_step: usize,
    ) -> Result<Self> {
        let evolution = model.evolution();
        let n = model.number_of_rates();
        let factors = model.number_of_factors();
        let steps = model.number_of_steps();
        check_compatibility(evolution, &numeraires)?;
        ensure!(initial_step < steps, "initial step {initial_step} out of range for {steps} steps");

        let displacements = model.displacements().to_vec();
        let alive = evolution.first_alive_rate().to_vec();
        let mut fixed_drifts = Vec::with_capacity(steps);
        let mut calculators = Vec::with_capacity(steps);
        for k in 0..steps {
            let a = model.pseudo_root(k);
            ensure!(
                a.rows() == n && a.cols() == factors,
                "step {k}: pseudo-root is {}×{}, {n}×{factors} required",
                a.rows(),
                a.cols()
            );
            fixed_drifts.push(
                (0..n)
                    .map(|i| -0.5 * (0..factors).map(|r| a[(i, r)] * a[(i, r)]).sum::<Real>())
                    .collect(),
            );
            calculators.push(LmmDriftCalculator::new(
                a,
                &displacements,
                evolution.rate_taus(),
                numeraires[k],
                alive[k],
            )?);
        }

        let curve_state = LmmCurveState::new(evolution.rate_times().to_vec())?;
        let generator = factory.create(factors, steps - initial_step);
        let initial_rates = model.initial_rates().to_vec();
        debug!(rates = n, factors, steps, initial_step, "lognormal forward-rate evolver built");

        let mut core = Self {
            model,
            numeraires,
            initial_step,
            generator,
            displacements,
            fixed_drifts,
            calculators,
            alive,
            forwards: vec![0.0; n],
            log_forwards: vec![0.0; n],
            initial_forwards: vec![0.0; n],
            initial_log_forwards: vec![0.0; n],
            initial_drifts: vec![0.0; n],
            drifts1: vec![0.0; n],
            drifts2: vec![0.0; n],
            brownians: vec![0.0; factors],
            curve_state,
            current_step: initial_step,
        };
        core.set_forwards(&initial_rates)?;
        Ok(core)
    }

    fn set_forwards(&mut self, forwards: &[Rate]) -> Result<()> {
        let n = self.forwards.len();
        ensure!(forwards.len() == n, "{} forwards for {n} rates", forwards.len());
        for (i, (&f, &d)) in forwards.iter().zip(&self.displacements).enumerate() {
            ensure!(f + d > 0.0, "displaced forward {i} ({}) not positive", f + d);
        }
        self.initial_forwards.copy_from_slice(forwards);
        let displaced = forwards.iter().zip(&self.displacements);
        for (l, (&f, &d)) in self.initial_log_forwards.iter_mut().zip(displaced) {
            *l = (f + d).ln();
        }
        self.calculators[self.initial_step].compute(forwards, &mut self.initial_drifts);
        Ok(())
    }

    pub(crate) fn numeraires(&self) -> &[usize] {
        &self.numeraires
    }

    pub(crate) fn current_step(&self) -> usize {
        self.current_step
    }

    pub(crate) fn curve_state(&self) -> &LmmCurveState {
        &self.curve_state
    }

    pub(crate) fn set_initial_state(&mut self, state: &dyn CurveState) -> Result<()> {
        self.set_forwards(state.forward_rates())
    }

    pub(crate) fn start_new_path(&mut self) -> Real {
        self.current_step = self.initial_step;
        self.forwards.copy_from_slice(&self.initial_forwards);
        self.log_forwards.copy_from_slice(&self.initial_log_forwards);
        self.curve_state.update_forward_rates(&self.forwards, 0);
        self.generator.next_path()
    }

    /// Evolve over the current step. With `corrector` the drift is the
    /// average of the drifts at the start and at the predicted end.
    pub(crate) fn advance_step(&mut self, corrector: bool) -> Real {
        let step = self.current_step;
        debug_assert!(step < self.calculators.len(), "evolution already finished");
        if step > self.initial_step {
            self.calculators[step].compute(&self.forwards, &mut self.drifts1);
        } else {
            self.drifts1.copy_from_slice(&self.initial_drifts);
        }

        let weight = self.generator.next_step(&mut self.brownians);
        let a = self.model.pseudo_root(step);
        let fixed = &self.fixed_drifts[step];
        let n = self.forwards.len();
        for i in self.alive[step]..n {
            let diffusion: Real =
                self.brownians.iter().enumerate().map(|(r, z)| a[(i, r)] * z).sum();
            self.log_forwards[i] += self.drifts1[i] + fixed[i] + diffusion;
            self.forwards[i] = self.log_forwards[i].exp() - self.displacements[i];
        }

        if corrector {
            self.calculators[step].compute(&self.forwards, &mut self.drifts2);
            for i in self.alive[step]..n {
                self.log_forwards[i] += 0.5 * (self.drifts2[i] - self.drifts1[i]);
                self.forwards[i] = self.log_forwards[i].exp() - self.displacements[i];
            }
        }

        self.curve_state.update_forward_rates(&self.forwards, 0);
        self.current_step += 1;
        weight
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::evolution_description::EvolutionDescription;
    use crate::market_model::{exponential_forward_correlation, FlatVol};
    use qn_core::Time;
    use std::sync::Arc;

    pub(crate) fn rate_times() -> Vec<Time> {
        vec![0.5, 1.0, 1.5, 2.0, 2.5]
    }

    pub(crate) fn flat_vol(factors: usize) -> Arc<FlatVol> {
        let times = rate_times();
        let correlations = exponential_forward_correlation(&times, 0.5, 0.8).unwrap();
        let evolution = EvolutionDescription::new(times, Vec::new(), Vec::new()).unwrap();
        Arc::new(
            FlatVol::new(
                &[0.2, 0.18, 0.16, 0.15],
                &correlations,
                evolution,
                factors,
                vec![0.05; 4],
                vec![0.0; 4],
            )
            .unwrap(),
        )
    }
}
