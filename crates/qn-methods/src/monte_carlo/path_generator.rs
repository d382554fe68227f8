use super::path::{MultiPath, Path, Sample};
use crate::lattice::TimeGrid;
use qn_core::{ensure, errors::Result, Real};
use qn_math::{Array, GaussianSequenceGenerator};
use qn_processes::{StochasticProcess, StochasticProcess1D};
use std::sync::Arc;

/// Source of weighted samples for a [`MonteCarloModel`](super::MonteCarloModel).
pub trait SampleGenerator {
    /// Type of the generated samples.
    type Item;

    /// Draw a new sample.
    fn next(&mut self) -> Sample<Self::Item>;

    /// The antithetic of the last sample drawn by [`next`](Self::next).
    fn antithetic(&mut self) -> Sample<Self::Item>;
}

// ─── PathGenerator ────────────────────────────────────────────────────────────

/// Paths of a scalar process, one Gaussian draw per time step.
#[derive(Debug)]
pub struct PathGenerator {
    process: Arc<dyn StochasticProcess1D>,
    time_grid: Arc<TimeGrid>,
    generator: GaussianSequenceGenerator,
}

impl PathGenerator {
    /// Generator for `process` on `time_grid`, seeded with `seed`.
    pub fn new(
        process: Arc<dyn StochasticProcess1D>,
        time_grid: TimeGrid,
        seed: u64,
    ) -> Result<Self> {
        ensure!(time_grid.steps() > 0, "path generator needs at least one time step");
        let generator = GaussianSequenceGenerator::new(time_grid.steps(), seed, false);
        Ok(Self {
            process,
            time_grid: Arc::new(time_grid),
            generator,
        })
    }

    /// The simulation grid.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    fn build(&self, sign: Real) -> Sample<Path> {
        let dw = self.generator.last_sequence();
        let mut path = Path::new(Arc::clone(&self.time_grid));
        path[0] = self.process.x0();
        for i in 1..path.len() {
            let t = self.time_grid.time(i - 1);
            let dt = self.time_grid.dt(i - 1);
            path[i] = self.process.evolve_1d(t, path[i - 1], dt, sign * dw[i - 1]);
        }
        Sample {
            value: path,
            weight: 1.0,
        }
    }
}

impl SampleGenerator for PathGenerator {
    type Item = Path;

    fn next(&mut self) -> Sample<Path> {
        self.generator.next_sequence();
        self.build(1.0)
    }

    fn antithetic(&mut self) -> Sample<Path> {
        self.build(-1.0)
    }
}

// ─── MultiPathGenerator ───────────────────────────────────────────────────────

/// Paths of a multi-dimensional process, `factors` Gaussian draws per step
/// fed to the process's own `evolve`.
#[derive(Debug)]
pub struct MultiPathGenerator {
    process: Arc<dyn StochasticProcess>,
    time_grid: Arc<TimeGrid>,
    generator: GaussianSequenceGenerator,
}

impl MultiPathGenerator {
    /// Generator for `process` on `time_grid`, seeded with `seed`.
    pub fn new(
        process: Arc<dyn StochasticProcess>,
        time_grid: TimeGrid,
        seed: u64,
    ) -> Result<Self> {
        ensure!(time_grid.steps() > 0, "path generator needs at least one time step");
        let dimension = process.factors() * time_grid.steps();
        let generator = GaussianSequenceGenerator::new(dimension, seed, false);
        Ok(Self {
            process,
            time_grid: Arc::new(time_grid),
            generator,
        })
    }

    fn build(&self, sign: Real) -> Sample<MultiPath> {
        let factors = self.process.factors();
        let sequence = self.generator.last_sequence();
        let mut path = MultiPath::new(self.process.size(), Arc::clone(&self.time_grid));

        let mut state = self.process.initial_values();
        for (j, &x) in state.iter().enumerate() {
            path[j][0] = x;
        }
        for i in 1..self.time_grid.size() {
            let t = self.time_grid.time(i - 1);
            let dt = self.time_grid.dt(i - 1);
            let draws = &sequence[(i - 1) * factors..i * factors];
            let dw = Array::from_fn(factors, |k| sign * draws[k]);
            state = self.process.evolve(t, &state, dt, &dw);
            for (j, &x) in state.iter().enumerate() {
                path[j][i] = x;
            }
        }
        Sample {
            value: path,
            weight: 1.0,
        }
    }
}

impl SampleGenerator for MultiPathGenerator {
    type Item = MultiPath;

    fn next(&mut self) -> Sample<MultiPath> {
        self.generator.next_sequence();
        self.build(1.0)
    }

    fn antithetic(&mut self) -> Sample<MultiPath> {
        self.build(-1.0)
    }
}
