use super::{multi_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use qn_core::{ensure, errors::Result, Rate, Real, Time};

/// Forward-rate agreements, one per forward: at `T_i` the `i`-th pays
/// `(F_i − K_i) α_i` at its payment time.
#[derive(Debug, Clone)]
pub struct MultiStepForwards {
    evolution: EvolutionDescription,
    accruals: Vec<Real>,
    payment_times: Vec<Time>,
    strikes: Vec<Rate>,
    current_index: usize,
}

impl MultiStepForwards {
    /// FRAs on the forwards of `rate_times`.
    pub fn new(
        rate_times: Vec<Time>,
        accruals: Vec<Real>,
        payment_times: Vec<Time>,
        strikes: Vec<Rate>,
    ) -> Result<Self> {
        let evolution = multi_step_evolution(&rate_times, &payment_times, |i| (i, i + 1))?;
        let n = evolution.number_of_rates();
        ensure!(accruals.len() == n, "{} accruals for {n} rates", accruals.len());
        ensure!(strikes.len() == n, "{} strikes for {n} rates", strikes.len());
        Ok(Self {
            evolution,
            accruals,
            payment_times,
            strikes,
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepForwards {
    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn possible_cash_flow_times(&self) -> &[Time] {
        &self.payment_times
    }

    fn number_of_products(&self) -> usize {
        self.strikes.len()
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
        let forward = state.forward_rate(i);
        number_cash_flows_this_step.fill(0);
        number_cash_flows_this_step[i] = 1;
        cash_flows[i][0] = CashFlow {
            time_index: i,
            amount: (forward - self.strikes[i]) * self.accruals[i],
        };
        self.current_index += 1;
        self.current_index == self.strikes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_state::LmmCurveState;

    #[test]
    fn pays_one_fra_per_step() {
        let times = vec![0.5, 1.0, 1.5];
        let mut product =
            MultiStepForwards::new(times.clone(), vec![0.5; 2], vec![1.0, 1.5], vec![0.04; 2])
                .unwrap();
        assert_eq!(product.number_of_products(), 2);
        assert_eq!(product.suggested_numeraires(), vec![1, 2]);
        assert_eq!(product.evolution().relevance_rates(), &[(0, 1), (1, 2)]);

        let mut state = LmmCurveState::new(times).unwrap();
        state.set_on_forward_rates(&[0.05, 0.03], 0).unwrap();
        let mut counts = [9; 2];
        let mut flows = vec![vec![CashFlow::default()]; 2];
        assert!(!product.next_time_step(&state, &mut counts, &mut flows));
        assert_eq!(counts, [1, 0]);
        assert!((flows[0][0].amount - 0.005).abs() < 1e-15);
        assert!(product.next_time_step(&state, &mut counts, &mut flows));
        assert_eq!(counts, [0, 1]);
        assert_eq!(flows[1][0].time_index, 1);
        assert!((flows[1][0].amount + 0.005).abs() < 1e-15);
        product.reset();
        assert!(!product.next_time_step(&state, &mut counts, &mut flows));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let times = || vec![0.5, 1.0, 1.5];
        let short_accruals =
            MultiStepForwards::new(times(), vec![0.5], vec![1.0, 1.5], vec![0.04; 2]);
        assert!(short_accruals.is_err());
        let unordered_payments =
            MultiStepForwards::new(times(), vec![0.5; 2], vec![1.5, 1.0], vec![0.04; 2]);
        assert!(unordered_payments.is_err());
    }
}
