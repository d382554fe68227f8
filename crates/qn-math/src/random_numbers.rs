//! Random number generators.
//!
//! # Overview
//!
//! - [`MersenneTwisterUniformRng`]: MT19937-64 uniforms on the open
//!   interval `(0, 1)`; it also implements [`rand::RngCore`] so it can drive
//!   `rand_distr` samplers.
//! - [`GaussianRng`]: standard normal deviates, by default through the
//!   inverse cumulative normal so that one uniform maps to one Gaussian.
//! - [`GaussianSequenceGenerator`]: `dimension`-sized Gaussian draws with
//!   optional antithetic reflection of every other sequence.

use crate::distributions::inverse_cumulative_normal;
use qn_core::{Real, Size};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use rand_mt::Mt19937GenRand64;

/// Uniform generator based on the 64-bit Mersenne Twister.
#[derive(Clone)]
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl std::fmt::Debug for MersenneTwisterUniformRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MersenneTwisterUniformRng").finish_non_exhaustive()
    }
}

impl MersenneTwisterUniformRng {
    /// Create a generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Next uniform deviate in the open interval `(0, 1)`.
    pub fn next_real(&mut self) -> Real {
        // 53 random bits, shifted off zero by half a unit
        ((self.rng.next_u64() >> 11) as Real + 0.5) / (1u64 << 53) as Real
    }
}

impl RngCore for MersenneTwisterUniformRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.fill_bytes(dest);
        Ok(())
    }
}

/// How uniforms are turned into Gaussian deviates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GaussianMethod {
    /// Inverse cumulative normal, one uniform per deviate.
    #[default]
    InverseCumulative,
    /// `rand_distr`'s ziggurat sampler.
    Ziggurat,
}

/// Standard normal deviates.
#[derive(Debug, Clone)]
pub struct GaussianRng {
    uniform: MersenneTwisterUniformRng,
    method: GaussianMethod,
}

impl GaussianRng {
    /// Inverse-cumulative Gaussian generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_method(seed, GaussianMethod::InverseCumulative)
    }

    /// Gaussian generator using `method`.
    pub fn with_method(seed: u64, method: GaussianMethod) -> Self {
        Self {
            uniform: MersenneTwisterUniformRng::new(seed),
            method,
        }
    }

    /// Next standard normal deviate.
    pub fn next_real(&mut self) -> Real {
        match self.method {
            GaussianMethod::InverseCumulative => {
                inverse_cumulative_normal(self.uniform.next_real())
            }
            GaussianMethod::Ziggurat => StandardNormal.sample(&mut self.uniform),
        }
    }
}

/// Sequences of independent standard normals.
///
/// With antithetic sampling enabled, every second call returns the negation
/// of the previous sequence.
#[derive(Debug, Clone)]
pub struct GaussianSequenceGenerator {
    rng: GaussianRng,
    sequence: Vec<Real>,
    antithetic: bool,
    next_is_antithetic: bool,
}

impl GaussianSequenceGenerator {
    /// Generator of `dimension`-sized sequences.
    pub fn new(dimension: Size, seed: u64, antithetic: bool) -> Self {
        Self::with_rng(dimension, GaussianRng::new(seed), antithetic)
    }

    /// Generator drawing from an existing Gaussian source.
    pub fn with_rng(dimension: Size, rng: GaussianRng, antithetic: bool) -> Self {
        Self {
            rng,
            sequence: vec![0.0; dimension],
            antithetic,
            next_is_antithetic: false,
        }
    }

    /// Length of each sequence.
    pub fn dimension(&self) -> Size {
        self.sequence.len()
    }

    /// Draw the next sequence.
    pub fn next_sequence(&mut self) -> &[Real] {
        if self.next_is_antithetic {
            self.sequence.iter_mut().for_each(|z| *z = -*z);
        } else {
            for z in self.sequence.iter_mut() {
                *z = self.rng.next_real();
            }
        }
        if self.antithetic {
            self.next_is_antithetic = !self.next_is_antithetic;
        }
        &self.sequence
    }

    /// The most recently drawn sequence.
    pub fn last_sequence(&self) -> &[Real] {
        &self.sequence
    }
}
