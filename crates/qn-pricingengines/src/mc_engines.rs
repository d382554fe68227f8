//! Monte Carlo engines for vanilla options.

use crate::config::{EngineConfig, McConfig};
use crate::instruments::VanillaOptionArgs;
use crate::results::{OptionResults, PricingEngine};
use qn_core::{ensure, errors::Result, fail, ExerciseType, Real, Size};
use qn_math::Statistics;
use qn_methods::monte_carlo::{
    AmericanPathPricer, LongstaffSchwartzPathPricer, MonteCarloModel, MultiPath,
    MultiPathGenerator, Path, PathGenerator,
};
use qn_methods::TimeGrid;
use qn_processes::{GeneralizedBlackScholesProcess, HestonProcess};
use std::sync::Arc;
use tracing::debug;

const REGRESSION_ORDER: Size = 2;

fn european_maturity(args: &VanillaOptionArgs) -> Result<Real> {
    ensure!(
        args.exercise.exercise_type() == ExerciseType::European,
        "not a European option"
    );
    let maturity = args.exercise.last_time();
    ensure!(maturity > 0.0, "option already expired");
    Ok(maturity)
}

fn results(statistics: &Statistics) -> Result<OptionResults> {
    let Some(value) = statistics.mean() else {
        fail!("no Monte Carlo samples drawn");
    };
    Ok(OptionResults {
        error_estimate: statistics.error_estimate(),
        ..OptionResults::from_value(value)
    })
}

// ── Black-Scholes, European ──────────────────────────────────────────────────

/// European options by simulating the spot to maturity.
#[derive(Debug, Clone)]
pub struct McEuropeanEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
    settings: McConfig,
    tolerance: Option<(Real, Size)>,
}

impl McEuropeanEngine {
    /// Engine drawing `settings.samples` paths.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>, settings: McConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            process,
            settings,
            tolerance: None,
        })
    }

    /// Engine with the simulation settings of `config.mc`.
    pub fn from_config(
        process: Arc<GeneralizedBlackScholesProcess>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(process, config.mc)
    }

    /// Keep doubling the sample count, starting from `settings.samples`,
    /// until the error estimate is below `tolerance`; fail beyond
    /// `max_samples`.
    pub fn with_tolerance(mut self, tolerance: Real, max_samples: Size) -> Result<Self> {
        ensure!(tolerance > 0.0, "tolerance must be positive, got {tolerance}");
        ensure!(
            max_samples >= self.settings.samples,
            "max_samples {max_samples} below the initial {}",
            self.settings.samples
        );
        self.tolerance = Some((tolerance, max_samples));
        Ok(self)
    }
}

impl PricingEngine<VanillaOptionArgs> for McEuropeanEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        let maturity = european_maturity(args)?;
        let grid = TimeGrid::new(maturity, self.settings.time_steps(maturity))?;
        let generator = PathGenerator::new(self.process.clone(), grid, self.settings.seed)?;
        let payoff = args.plain_payoff();
        let discount = self.process.risk_free_rate().discount(maturity);
        let pricer = move |path: &Path| discount * payoff.value(path.back());

        let mut model = MonteCarloModel::new(generator, pricer, self.settings.antithetic);
        match self.tolerance {
            Some((tolerance, max_samples)) => {
                model.add_samples_to_tolerance(tolerance, self.settings.samples, max_samples)?
            }
            None => model.add_samples(self.settings.samples),
        }
        debug!(samples = model.statistics().samples(), maturity, "mc european");
        results(model.statistics())
    }
}

// ── Black-Scholes, American ──────────────────────────────────────────────────

/// American options by Longstaff-Schwartz regression.
///
/// The first `calibration_samples` paths fit the continuation values; the
/// estimate uses a fresh set of `samples` paths and so carries a small low
/// bias.
#[derive(Debug, Clone)]
pub struct McAmericanEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
    settings: McConfig,
    polynomial_order: Size,
}

impl McAmericanEngine {
    /// Engine regressing on monomials up to order 2 and the payoff.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>, settings: McConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            process,
            settings,
            polynomial_order: REGRESSION_ORDER,
        })
    }

    /// Engine with the simulation settings of `config.mc`.
    pub fn from_config(
        process: Arc<GeneralizedBlackScholesProcess>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(process, config.mc)
    }

    /// Regress on monomials up to `order`.
    pub fn with_polynomial_order(mut self, order: Size) -> Self {
        self.polynomial_order = order;
        self
    }
}

impl PricingEngine<VanillaOptionArgs> for McAmericanEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        ensure!(
            args.exercise.exercise_type() == ExerciseType::American,
            "not an American option"
        );
        let maturity = args.exercise.last_time();
        ensure!(maturity > 0.0, "option already expired");
        let grid = TimeGrid::new(maturity, self.settings.time_steps(maturity))?;

        let exercise =
            AmericanPathPricer::new(args.plain_payoff(), args.strike(), self.polynomial_order)?;
        let curve = self.process.risk_free_rate();
        let pricer = LongstaffSchwartzPathPricer::new(&grid, Box::new(exercise), curve.as_ref())?;
        let generator = PathGenerator::new(self.process.clone(), grid, self.settings.seed)?;

        let mut model = MonteCarloModel::new(generator, pricer, self.settings.antithetic);
        model.add_samples(self.settings.calibration_samples);
        model.pricer_mut().calibrate()?;
        model.reset_statistics();
        model.add_samples(self.settings.samples);
        debug!(
            calibration = self.settings.calibration_samples,
            samples = self.settings.samples,
            "mc american"
        );
        results(model.statistics())
    }
}

// ── Heston, European ─────────────────────────────────────────────────────────

/// European options by simulating spot and variance jointly.
#[derive(Debug, Clone)]
pub struct McHestonEuropeanEngine {
    process: Arc<HestonProcess>,
    settings: McConfig,
}

impl McHestonEuropeanEngine {
    /// Engine drawing `settings.samples` paths.
    pub fn new(process: Arc<HestonProcess>, settings: McConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self { process, settings })
    }

    /// Engine with the simulation settings of `config.mc`.
    pub fn from_config(process: Arc<HestonProcess>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Self::new(process, config.mc)
    }
}

impl PricingEngine<VanillaOptionArgs> for McHestonEuropeanEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        let maturity = european_maturity(args)?;
        let grid = TimeGrid::new(maturity, self.settings.time_steps(maturity))?;
        let generator = MultiPathGenerator::new(self.process.clone(), grid, self.settings.seed)?;
        let payoff = args.plain_payoff();
        let discount = self.process.risk_free_rate().discount(maturity);
        let pricer = move |path: &MultiPath| discount * payoff.value(path[0].back());

        let mut model = MonteCarloModel::new(generator, pricer, self.settings.antithetic);
        model.add_samples(self.settings.samples);
        debug!(samples = self.settings.samples, maturity, "mc heston european");
        results(model.statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::black_scholes_price;
    use qn_core::{Exercise, OptionType};
    use qn_termstructures::{BlackConstantVol, FlatForward, YieldTermStructure};

    fn process(spot: Real, r: Real, q: Real, vol: Real) -> Arc<GeneralizedBlackScholesProcess> {
        Arc::new(GeneralizedBlackScholesProcess::new(
            spot,
            Arc::new(FlatForward::new(r)),
            Arc::new(FlatForward::new(q)),
            Arc::new(BlackConstantVol::new(vol)),
        ))
    }

    fn settings(samples: Size) -> McConfig {
        McConfig {
            samples,
            time_steps_per_year: 1,
            ..McConfig::default()
        }
    }

    #[test]
    fn european_call_within_three_standard_errors() {
        let engine =
            McEuropeanEngine::new(process(100.0, 0.05, 0.02, 0.2), settings(20_000)).unwrap();
        let args =
            VanillaOptionArgs::vanilla(OptionType::Call, 105.0, Exercise::european(1.0).unwrap())
                .unwrap();
        let mc = engine.calculate(&args).unwrap();
        let exact = black_scholes_price(OptionType::Call, 100.0, 105.0, 0.05, 0.02, 0.2, 1.0).value;
        let error = mc.error_estimate.unwrap();
        assert!(error > 0.0 && error < 0.1, "error estimate {error}");
        assert!((mc.value - exact).abs() < 3.0 * error, "{} vs {exact} ± {error}", mc.value);
    }

    #[test]
    fn tolerance_drives_the_sample_count() {
        let engine = McEuropeanEngine::new(process(100.0, 0.05, 0.0, 0.2), settings(1_000))
            .unwrap()
            .with_tolerance(0.05, 1 << 20)
            .unwrap();
        let args =
            VanillaOptionArgs::vanilla(OptionType::Put, 100.0, Exercise::european(1.0).unwrap())
                .unwrap();
        assert!(engine.calculate(&args).unwrap().error_estimate.unwrap() <= 0.05);
    }

    #[test]
    fn american_put_by_regression() {
        // S = 36, K = 40, r = 6%, σ = 20%, T = 1: American put ≈ 4.478
        let engine = McAmericanEngine::new(
            process(36.0, 0.06, 0.0, 0.2),
            McConfig {
                samples: 16_384,
                ..McConfig::default()
            },
        )
        .unwrap();
        let args =
            VanillaOptionArgs::vanilla(OptionType::Put, 40.0, Exercise::american(0.0, 1.0).unwrap())
                .unwrap();
        let value = engine.calculate(&args).unwrap().value;
        let european = black_scholes_price(OptionType::Put, 36.0, 40.0, 0.06, 0.0, 0.2, 1.0).value;
        assert!(value > european, "{value} vs european {european}");
        assert!((value - 4.478).abs() < 0.1, "{value}");
    }

    #[test]
    fn heston_with_constant_variance_is_black_scholes() {
        let r: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.03));
        let q: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.0));
        let heston = Arc::new(HestonProcess::new(r, q, 100.0, 0.04, 1.0, 0.04, 1e-4, 0.0).unwrap());
        let engine = McHestonEuropeanEngine::new(
            heston,
            McConfig {
                samples: 20_000,
                time_steps_per_year: 20,
                ..McConfig::default()
            },
        )
        .unwrap();
        let args =
            VanillaOptionArgs::vanilla(OptionType::Call, 100.0, Exercise::european(1.0).unwrap())
                .unwrap();
        let mc = engine.calculate(&args).unwrap();
        let exact = black_scholes_price(OptionType::Call, 100.0, 100.0, 0.03, 0.0, 0.2, 1.0).value;
        assert!((mc.value - exact).abs() < 3.0 * mc.error_estimate.unwrap() + 0.02);
    }

    #[test]
    fn wrong_exercise_is_rejected() {
        let p = process(100.0, 0.05, 0.0, 0.2);
        let american = VanillaOptionArgs::vanilla(
            OptionType::Put,
            100.0,
            Exercise::american(0.0, 1.0).unwrap(),
        )
        .unwrap();
        let european =
            VanillaOptionArgs::vanilla(OptionType::Put, 100.0, Exercise::european(1.0).unwrap())
                .unwrap();
        let european_engine = McEuropeanEngine::new(p.clone(), settings(10)).unwrap();
        assert!(european_engine.calculate(&american).is_err());
        assert!(McAmericanEngine::new(p, settings(10)).unwrap().calculate(&european).is_err());
    }
}
