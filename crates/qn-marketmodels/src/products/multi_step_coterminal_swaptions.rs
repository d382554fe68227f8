use super::{multi_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use qn_core::{errors::Result, ensure, Payoff, Time};
use std::sync::Arc;

/// European swaptions into the coterminal swaps: at `T_i` the `i`-th pays
/// `payoff_i(S_i) A_i`, with `S_i` the swap rate over `[T_i, T_n]` and `A_i`
/// its annuity in units of the bond maturing at `T_i`.
#[derive(Debug, Clone)]
pub struct MultiStepCoterminalSwaptions {
    evolution: EvolutionDescription,
    payment_times: Vec<Time>,
    payoffs: Vec<Arc<dyn Payoff>>,
    current_index: usize,
}

impl MultiStepCoterminalSwaptions {
    /// Swaptions expiring at each rate time but the last.
    pub fn new(
        rate_times: Vec<Time>,
        payment_times: Vec<Time>,
        payoffs: Vec<Arc<dyn Payoff>>,
    ) -> Result<Self> {
        let n = rate_times.len().saturating_sub(1);
        let evolution = multi_step_evolution(&rate_times, &payment_times, |i| (i, n))?;
        ensure!(payoffs.len() == n, "{} payoffs for {n} swaptions", payoffs.len());
        Ok(Self {
            evolution,
            payment_times,
            payoffs,
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepCoterminalSwaptions {
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
        let swap_rate = state.coterminal_swap_rate(i);
        let annuity = state.coterminal_swap_annuity(i, i);
        let payoff = self.payoffs[i].value(swap_rate);
        number_cash_flows_this_step.fill(0);
        if payoff > 0.0 {
            number_cash_flows_this_step[i] = 1;
            cash_flows[i][0] = CashFlow {
                time_index: i,
                amount: payoff * annuity,
            };
        }
        self.current_index += 1;
        self.current_index == self.payoffs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_state::LmmCurveState;
    use qn_core::{OptionType, PlainVanillaPayoff};

    #[test]
    fn pays_the_swaption_in_bonds_of_the_expiry() {
        let times = vec![0.5, 1.0, 1.5, 2.0];
        let payoff = PlainVanillaPayoff::new(OptionType::Call, 0.03).unwrap();
        let payoffs: Vec<Arc<dyn Payoff>> =
            (0..3).map(|_| Arc::new(payoff) as Arc<dyn Payoff>).collect();
        let mut product =
            MultiStepCoterminalSwaptions::new(times.clone(), times[..3].to_vec(), payoffs).unwrap();
        assert_eq!(product.evolution().relevance_rates(), &[(0, 3), (1, 3), (2, 3)]);

        let mut state = LmmCurveState::new(times).unwrap();
        state.set_on_forward_rates(&[0.04; 3], 0).unwrap();
        let mut counts = [0; 3];
        let mut flows = vec![vec![CashFlow::default()]; 3];
        assert!(!product.next_time_step(&state, &mut counts, &mut flows));
        let d = 1.0 / 1.02;
        let annuity = 0.5 * (d + d * d + d * d * d);
        assert_eq!(counts, [1, 0, 0]);
        assert!((flows[0][0].amount - 0.01 * annuity).abs() < 1e-15);
    }
}
