use super::{LogNormalFwdRateCore, MarketModelEvolver};
use crate::brownian_generator::BrownianGeneratorFactory;
use crate::curve_state::CurveState;
use crate::market_model::MarketModel;
use qn_core::{errors::Result, Real};
use std::sync::Arc;

/// Euler scheme in the log of the displaced forwards; the drift is
/// frozen at the start of each step.
#[derive(Debug)]
pub struct LogNormalFwdRateEuler {
    core: LogNormalFwdRateCore,
}

impl LogNormalFwdRateEuler {
    /// Evolver of `model` under the bonds `numeraires` (one per step),
    /// starting at `initial_step`.
    pub fn new(
        model: Arc<dyn MarketModel>,
        factory: &dyn BrownianGeneratorFactory,
        numeraires: Vec<usize>,
        initial_step: usize,
    ) -> Result<Self> {
        Ok(Self {
            core: LogNormalFwdRateCore::new(model, factory, numeraires, initial_step)?,
        })
    }
}

impl MarketModelEvolver for LogNormalFwdRateEuler {
    fn numeraires(&self) -> &[usize] {
        self.core.numeraires()
    }

    fn start_new_path(&mut self) -> Real {
        self.core.start_new_path()
    }

    fn advance_step(&mut self) -> Real {
        self.core.advance_step(false)
    }

    fn current_step(&self) -> usize {
        self.core.current_step()
    }

    fn current_state(&self) -> &dyn CurveState {
        self.core.curve_state()
    }

    fn set_initial_state(&mut self, state: &dyn CurveState) -> Result<()> {
        self.core.set_initial_state(state)
    }
}
