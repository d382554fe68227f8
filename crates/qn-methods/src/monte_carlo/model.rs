use super::path::{MultiPath, Path};
use super::path_generator::SampleGenerator;
use qn_core::{ensure, errors::Result, Real};
use qn_math::Statistics;
use tracing::debug;

/// Payoff of a simulated path, already discounted to time zero.
pub trait PathPricer<P = Path>: Send + Sync {
    /// Value of `path`.
    fn value(&self, path: &P) -> Real;
}

/// Pricer of multi-dimensional paths.
pub trait MultiPathPricer: PathPricer<MultiPath> {}

impl<T: PathPricer<MultiPath>> MultiPathPricer for T {}

impl<P, F> PathPricer<P> for F
where
    F: Fn(&P) -> Real + Send + Sync,
{
    fn value(&self, path: &P) -> Real {
        self(path)
    }
}

/// A control variate: a pricer for a related payoff and its exact value.
struct ControlVariate<P> {
    pricer: Box<dyn PathPricer<P>>,
    value: Real,
}

/// Draws paths, prices them and accumulates the results.
pub struct MonteCarloModel<G: SampleGenerator, P> {
    generator: G,
    pricer: P,
    statistics: Statistics,
    antithetic: bool,
    control_variate: Option<ControlVariate<G::Item>>,
}

impl<G, P> MonteCarloModel<G, P>
where
    G: SampleGenerator,
    P: PathPricer<G::Item>,
{
    /// Model pricing paths from `generator` with `pricer`. With `antithetic`
    /// each sample is the average over a path and its antithetic.
    pub fn new(generator: G, pricer: P, antithetic: bool) -> Self {
        Self {
            generator,
            pricer,
            statistics: Statistics::new(),
            antithetic,
            control_variate: None,
        }
    }

    /// Correct each sample by `value − cv_pricer(path)`, where `value` is the
    /// known expectation of the control payoff.
    pub fn with_control_variate(
        mut self,
        cv_pricer: Box<dyn PathPricer<G::Item>>,
        value: Real,
    ) -> Self {
        self.control_variate = Some(ControlVariate {
            pricer: cv_pricer,
            value,
        });
        self
    }

    fn price(&self, path: &G::Item) -> Real {
        let price = self.pricer.value(path);
        match &self.control_variate {
            Some(cv) => price + cv.value - cv.pricer.value(path),
            None => price,
        }
    }

    /// Simulate `samples` more samples.
    pub fn add_samples(&mut self, samples: usize) {
        for _ in 0..samples {
            let sample = self.generator.next();
            let mut price = self.price(&sample.value);
            if self.antithetic {
                let mirror = self.generator.antithetic();
                price = 0.5 * (price + self.price(&mirror.value));
            }
            self.statistics.add_weighted(price, sample.weight);
        }
    }

    /// Simulate until the error estimate drops below `tolerance`, doubling
    /// the sample count each round, but never beyond `max_samples`.
    pub fn add_samples_to_tolerance(
        &mut self,
        tolerance: Real,
        min_samples: usize,
        max_samples: usize,
    ) -> Result<()> {
        ensure!(tolerance > 0.0, "tolerance must be positive, got {tolerance}");
        ensure!(min_samples > 1, "at least two samples are needed for an error estimate");
        let mut next = min_samples.saturating_sub(self.statistics.samples());
        loop {
            self.add_samples(next);
            let samples = self.statistics.samples();
            let error = self.statistics.error_estimate().unwrap_or(Real::INFINITY);
            if error <= tolerance {
                debug!(samples, error, "Monte Carlo tolerance reached");
                return Ok(());
            }
            ensure!(
                samples < max_samples,
                "error estimate {error} above tolerance {tolerance} after {samples} samples"
            );
            next = samples.min(max_samples - samples);
        }
    }

    /// Accumulated statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Drop all accumulated samples.
    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    /// The path pricer.
    pub fn pricer(&self) -> &P {
        &self.pricer
    }

    /// Mutable access to the path pricer, e.g. to switch it from calibration
    /// to pricing.
    pub fn pricer_mut(&mut self) -> &mut P {
        &mut self.pricer
    }
}

impl<G: SampleGenerator, P> std::fmt::Debug for MonteCarloModel<G, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonteCarloModel")
            .field("statistics", &self.statistics)
            .field("antithetic", &self.antithetic)
            .field("control_variate", &self.control_variate.as_ref().map(|cv| cv.value))
            .finish_non_exhaustive()
    }
}
