use super::{multi_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use qn_core::{ensure, errors::Result, Payoff, Real, Time};
use std::sync::Arc;

/// Caplets or floorlets, one per forward: at `T_i` the `i`-th pays
/// `payoff_i(F_i) α_i` at its payment time.
#[derive(Debug, Clone)]
pub struct MultiStepOptionlets {
    evolution: EvolutionDescription,
    accruals: Vec<Real>,
    payment_times: Vec<Time>,
    payoffs: Vec<Arc<dyn Payoff>>,
    current_index: usize,
}

impl MultiStepOptionlets {
    /// Optionlets on the forwards of `rate_times`.
    pub fn new(
        rate_times: Vec<Time>,
        accruals: Vec<Real>,
        payment_times: Vec<Time>,
        payoffs: Vec<Arc<dyn Payoff>>,
    ) -> Result<Self> {
        let evolution = multi_step_evolution(&rate_times, &payment_times, |i| (i, i + 1))?;
        let n = evolution.number_of_rates();
        ensure!(accruals.len() == n, "{} accruals for {n} rates", accruals.len());
        ensure!(payoffs.len() == n, "{} payoffs for {n} rates", payoffs.len());
        Ok(Self {
            evolution,
            accruals,
            payment_times,
            payoffs,
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepOptionlets {
    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn possible_cash_flow_times(&self) -> &[Time] {
        &self.payment_times
    }

    fn number_of_products(&self) -> usize {
        self.payoffs.len()
    }

    fn max_number_of_cash_flows_per_product_per_step(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.current_index = 0;
    }

    fn next_time_step(
        &mut self,
        state: &dyn CurveState,
        number_cash_flows_this_step: &mut [usize],
        cash_flows: &mut [Vec<CashFlow>],
    ) -> bool {
        let i = self.current_index;
        let payoff = self.payoffs[i].value(state.forward_rate(i));
        number_cash_flows_this_step.fill(0);
        if payoff > 0.0 {
            number_cash_flows_this_step[i] = 1;
            cash_flows[i][0] = CashFlow {
                time_index: i,
                amount: payoff * self.accruals[i],
            };
        }
        self.current_index += 1;
        self.current_index == self.payoffs.len()
    }
}
