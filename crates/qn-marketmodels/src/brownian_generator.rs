//! Gaussian increments for market-model evolvers, one vector of factors per
//! step.

use qn_core::Real;
use qn_math::GaussianSequenceGenerator;

/// Source of independent standard normal factor draws.
pub trait BrownianGenerator: std::fmt::Debug + Send {
    /// Fill `output` with the draws of the next step; returns the
    /// importance weight.
    fn next_step(&mut self, output: &mut [Real]) -> Real;

    /// Start a new path; returns the importance weight.
    fn next_path(&mut self) -> Real;

    /// Draws per step.
    fn number_of_factors(&self) -> usize;

    /// Steps per path.
    fn number_of_steps(&self) -> usize;
}

/// Creates a generator sized for an evolver.
pub trait BrownianGeneratorFactory: std::fmt::Debug + Send + Sync {
    /// Generator of `factors` draws over `steps` steps.
    fn create(&self, factors: usize, steps: usize) -> Box<dyn BrownianGenerator>;
}

/// Mersenne-Twister Gaussian draws. A whole path is drawn at once and
/// handed out step by step.
#[derive(Debug, Clone)]
pub struct MtBrownianGenerator {
    factors: usize,
    steps: usize,
    generator: GaussianSequenceGenerator,
    path: Vec<Real>,
    last_step: usize,
}

impl MtBrownianGenerator {
    /// Generator seeded with `seed`; with `antithetic` every second path
    /// mirrors the previous one.
    pub fn new(factors: usize, steps: usize, seed: u64, antithetic: bool) -> Self {
        Self {
            factors,
            steps,
            generator: GaussianSequenceGenerator::new(factors * steps, seed, antithetic),
            path: vec![0.0; factors * steps],
            last_step: 0,
        }
    }
}

impl BrownianGenerator for MtBrownianGenerator {
    fn next_step(&mut self, output: &mut [Real]) -> Real {
        debug_assert!(self.last_step < self.steps, "path exhausted");
        let start = self.last_step * self.factors;
        output[..self.factors].copy_from_slice(&self.path[start..start + self.factors]);
        self.last_step += 1;
        1.0
    }

    fn next_path(&mut self) -> Real {
        self.path.copy_from_slice(self.generator.next_sequence());
        self.last_step = 0;
        1.0
    }

    fn number_of_factors(&self) -> usize {
        self.factors
    }

    fn number_of_steps(&self) -> usize {
        self.steps
    }
}

/// Factory of [`MtBrownianGenerator`]s sharing one seed.
#[derive(Debug, Clone, Copy)]
pub struct MtBrownianGeneratorFactory {
    seed: u64,
    antithetic: bool,
}

impl MtBrownianGeneratorFactory {
    /// Factory for generators seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed, antithetic: false }
    }

    /// Factory for antithetic generators.
    pub fn antithetic(seed: u64) -> Self {
        Self { seed, antithetic: true }
    }
}

impl BrownianGeneratorFactory for MtBrownianGeneratorFactory {
    fn create(&self, factors: usize, steps: usize) -> Box<dyn BrownianGenerator> {
        Box::new(MtBrownianGenerator::new(factors, steps, self.seed, self.antithetic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_math::Statistics;

    #[test]
    fn steps_hand_out_a_standard_normal_path() {
        let mut generator = MtBrownianGeneratorFactory::new(7).create(3, 4);
        assert_eq!(generator.number_of_factors(), 3);
        let mut stats = Statistics::new();
        let mut draws = [0.0; 3];
        for _ in 0..2000 {
            assert_eq!(generator.next_path(), 1.0);
            for _ in 0..4 {
                generator.next_step(&mut draws);
                draws.iter().for_each(|&z| stats.add(z));
            }
        }
        assert_eq!(stats.samples(), 24_000);
        assert_abs_diff_eq!(stats.mean().unwrap(), 0.0, epsilon = 0.03);
        assert_abs_diff_eq!(stats.variance().unwrap(), 1.0, epsilon = 0.04);
    }

    #[test]
    fn antithetic_paths_mirror() {
        let mut generator = MtBrownianGeneratorFactory::antithetic(11).create(2, 2);
        let (mut a, mut b) = ([0.0; 2], [0.0; 2]);
        generator.next_path();
        generator.next_step(&mut a);
        generator.next_path();
        generator.next_step(&mut b);
        assert_eq!(a[0], -b[0]);
        assert_eq!(a[1], -b[1]);
    }
}
