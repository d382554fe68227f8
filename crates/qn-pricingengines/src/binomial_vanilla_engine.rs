//! Binomial-tree engine for vanilla options.

use crate::analytic::black_scholes_theta;
use crate::config::EngineConfig;
use crate::instruments::VanillaOptionArgs;
use crate::results::{OptionResults, PricingEngine};
use qn_core::{ensure, errors::Result, Size};
use qn_methods::lattice::{
    BinomialTree, BinomialType, BlackScholesLattice, DiscretizedAsset, DiscretizedVanillaOption,
    Lattice,
};
use qn_processes::GeneralizedBlackScholesProcess;
use std::sync::Arc;
use tracing::debug;

/// European, American and Bermudan options rolled back on a recombining
/// binomial tree.
///
/// Delta and gamma come from the nodes of the first two steps; theta from
/// the Black-Scholes equation.
#[derive(Debug, Clone)]
pub struct BinomialVanillaEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
    kind: BinomialType,
    time_steps: Size,
}

impl BinomialVanillaEngine {
    /// Engine with a `kind` tree of `time_steps` steps (at least 2).
    pub fn new(
        process: Arc<GeneralizedBlackScholesProcess>,
        kind: BinomialType,
        time_steps: Size,
    ) -> Result<Self> {
        ensure!(time_steps >= 2, "at least two time steps required, got {time_steps}");
        Ok(Self {
            process,
            kind,
            time_steps,
        })
    }

    /// Engine with the tree settings of `config.tree`.
    pub fn from_config(
        process: Arc<GeneralizedBlackScholesProcess>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(process, config.tree.binomial, config.tree.time_steps)
    }
}

impl PricingEngine<VanillaOptionArgs> for BinomialVanillaEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        let maturity = args.exercise.last_time();
        ensure!(maturity > 0.0, "option already expired");
        let strike = args.strike();
        let rate = self.process.risk_free_rate().zero_rate(maturity);

        let tree = BinomialTree::new(self.kind, &self.process, maturity, self.time_steps, strike)?;
        let steps = tree.steps();
        let lattice = BlackScholesLattice::build(tree, rate, maturity, steps)?;
        debug!(kind = ?self.kind, steps, rate, "binomial vanilla");

        let mut option = DiscretizedVanillaOption::new(args.plain_payoff(), &args.exercise);
        option.initialize(&lattice, maturity)?;

        let grid = lattice.time_grid();
        let (t1, t2) = (grid.time(1), grid.time(2));

        option.rollback(&lattice, t2)?;
        let va2 = option.values().clone();
        let s2 = lattice.grid(t2)?;
        ensure!(va2.len() == 3, "expected three nodes after two steps, got {}", va2.len());

        option.rollback(&lattice, t1)?;
        let va1 = option.values().clone();
        let s1 = lattice.grid(t1)?;

        option.rollback(&lattice, 0.0)?;
        let value = option.values()[0];

        let delta = (va1[1] - va1[0]) / (s1[1] - s1[0]);
        let delta_up = (va2[2] - va2[1]) / (s2[2] - s2[1]);
        let delta_down = (va2[1] - va2[0]) / (s2[1] - s2[0]);
        let gamma = (delta_up - delta_down) / (0.5 * (s2[2] - s2[0]));
        let theta = black_scholes_theta(&self.process, maturity, strike, value, delta, gamma);

        Ok(OptionResults {
            value,
            delta: Some(delta),
            gamma: Some(gamma),
            theta: Some(theta),
            error_estimate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::black_scholes_price;
    use approx::assert_abs_diff_eq;
    use qn_core::{Exercise, OptionType};
    use qn_termstructures::{BlackConstantVol, FlatForward};

    fn process() -> Arc<GeneralizedBlackScholesProcess> {
        Arc::new(GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            Arc::new(BlackConstantVol::new(0.25)),
        ))
    }

    #[test]
    fn european_call_converges_with_greeks() {
        let engine =
            BinomialVanillaEngine::new(process(), BinomialType::LeisenReimer, 201).unwrap();
        let args =
            VanillaOptionArgs::vanilla(OptionType::Call, 95.0, Exercise::european(0.75).unwrap())
                .unwrap();
        let tree = engine.calculate(&args).unwrap();
        let exact = black_scholes_price(OptionType::Call, 100.0, 95.0, 0.05, 0.02, 0.25, 0.75);
        assert_abs_diff_eq!(tree.value, exact.value, epsilon = 1e-3);
        assert_abs_diff_eq!(tree.delta.unwrap(), exact.delta, epsilon = 1e-2);
        assert_abs_diff_eq!(tree.gamma.unwrap(), exact.gamma, epsilon = 2e-3);
        assert_abs_diff_eq!(tree.theta.unwrap(), exact.theta, epsilon = 0.2);
    }

    #[test]
    fn american_call_without_dividends_is_european() {
        let no_dividends = Arc::new(GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.0)),
            Arc::new(BlackConstantVol::new(0.25)),
        ));
        let engine =
            BinomialVanillaEngine::new(no_dividends, BinomialType::CoxRossRubinstein, 400).unwrap();
        let european =
            VanillaOptionArgs::vanilla(OptionType::Call, 100.0, Exercise::european(1.0).unwrap())
                .unwrap();
        let american = VanillaOptionArgs::vanilla(
            OptionType::Call,
            100.0,
            Exercise::american(0.0, 1.0).unwrap(),
        )
        .unwrap();
        assert_abs_diff_eq!(
            engine.calculate(&american).unwrap().value,
            engine.calculate(&european).unwrap().value,
            epsilon = 1e-10
        );
    }

    #[test]
    fn bermudan_put_lies_between_european_and_american() {
        let engine =
            BinomialVanillaEngine::from_config(process(), &EngineConfig::default()).unwrap();
        let put = |exercise| VanillaOptionArgs::vanilla(OptionType::Put, 110.0, exercise).unwrap();
        let e = engine.calculate(&put(Exercise::european(1.0).unwrap())).unwrap().value;
        let b = engine
            .calculate(&put(Exercise::bermudan(vec![0.25, 0.5, 0.75, 1.0]).unwrap()))
            .unwrap()
            .value;
        let a = engine.calculate(&put(Exercise::american(0.0, 1.0).unwrap())).unwrap().value;
        assert!(e < b && b < a, "european {e}, bermudan {b}, american {a}");
    }

    #[test]
    fn single_step_tree_is_rejected() {
        assert!(BinomialVanillaEngine::new(process(), BinomialType::Tian, 1).is_err());
    }
}
