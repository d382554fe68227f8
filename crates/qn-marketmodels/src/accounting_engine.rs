//! Path-wise valuation of market-model products.
//!
//! Cash flows are converted into units of the current numeraire bond as
//! they occur and accumulated; when the numeraire changes between steps
//! the holdings are rolled into the new bond. The value of a path is the
//! final holding times the initial value of the first numeraire.

use crate::curve_state::CurveState;
use crate::evolution_description::check_compatibility;
use crate::evolvers::MarketModelEvolver;
use crate::products::{CashFlow, MarketModelMultiProduct};
use qn_core::{ensure, errors::Result, Real, Time};
use qn_math::SequenceStatistics;
use tracing::debug;

/// Discounts a payment at an arbitrary time to a numeraire bond by
/// geometric interpolation between the neighbouring rate times.
///
/// A payment strictly between two rate times is bracketed by the rate
/// time at or before it and the next one, so the interpolation weight
/// stays in `[0, 1]` inside the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketModelDiscounter {
    before: usize,
    before_weight: Real,
}

impl MarketModelDiscounter {
    /// Discounter of a payment at `payment_time`; payments past the last
    /// rate time are extrapolated from the last period.
    pub fn new(payment_time: Time, rate_times: &[Time]) -> Result<Self> {
        ensure!(rate_times.len() >= 2, "at least two rate times required");
        let last = rate_times.len() - 2;
        let before = rate_times
            .partition_point(|&t| t <= payment_time)
            .saturating_sub(1)
            .min(last);
        let tau = rate_times[before + 1] - rate_times[before];
        Ok(Self {
            before,
            before_weight: 1.0 - (payment_time - rate_times[before]) / tau,
        })
    }

    /// Value of a unit payment in units of the bond `numeraire`.
    pub fn numeraire_bonds(&self, state: &dyn CurveState, numeraire: usize) -> Real {
        let pre = state.discount_ratio(self.before, numeraire);
        if self.before_weight == 1.0 {
            return pre;
        }
        let post = state.discount_ratio(self.before + 1, numeraire);
        if self.before_weight == 0.0 {
            return post;
        }
        pre.powf(self.before_weight) * post.powf(1.0 - self.before_weight)
    }
}

/// Prices a product along the paths of an evolver.
#[derive(Debug)]
pub struct AccountingEngine<E, P> {
    evolver: E,
    product: P,
    initial_numeraire_value: Real,
    discounters: Vec<MarketModelDiscounter>,
    numeraires_held: Vec<Real>,
    number_cash_flows_this_step: Vec<usize>,
    cash_flows_generated: Vec<Vec<CashFlow>>,
}

impl<E, P> AccountingEngine<E, P>
where
    E: MarketModelEvolver,
    P: MarketModelMultiProduct,
{
    /// Engine valuing `product` with `evolver`; `initial_numeraire_value`
    /// is today's price of the numeraire bond of the first step.
    pub fn new(evolver: E, product: P, initial_numeraire_value: Real) -> Result<Self> {
        ensure!(
            initial_numeraire_value > 0.0,
            "initial numeraire value ({initial_numeraire_value}) not positive"
        );
        let evolution = product.evolution();
        check_compatibility(evolution, evolver.numeraires())?;
        let rate_times = evolution.rate_times();
        let discounters = product
            .possible_cash_flow_times()
            .iter()
            .map(|&t| MarketModelDiscounter::new(t, rate_times))
            .collect::<Result<Vec<_>>>()?;
        let products = product.number_of_products();
        let max_flows = product.max_number_of_cash_flows_per_product_per_step();
        debug!(products, cash_flow_times = discounters.len(), "accounting engine built");
        Ok(Self {
            evolver,
            product,
            initial_numeraire_value,
            discounters,
            numeraires_held: vec![0.0; products],
            number_cash_flows_this_step: vec![0; products],
            cash_flows_generated: vec![vec![CashFlow::default(); max_flows]; products],
        })
    }

    /// Value every product along one path into `values`; returns the path
    /// weight.
    pub fn single_path_values(&mut self, values: &mut [Real]) -> Real {
        self.numeraires_held.fill(0.0);
        let mut weight = self.evolver.start_new_path();
        self.product.reset();
        let mut principal_in_numeraire_portfolio = 1.0;

        loop {
            let this_step = self.evolver.current_step();
            weight *= self.evolver.advance_step();
            let state = self.evolver.current_state();
            let done = self.product.next_time_step(
                state,
                &mut self.number_cash_flows_this_step,
                &mut self.cash_flows_generated,
            );
            let numeraire = self.evolver.numeraires()[this_step];

            for ((held, flows), &count) in self
                .numeraires_held
                .iter_mut()
                .zip(&self.cash_flows_generated)
                .zip(&self.number_cash_flows_this_step)
            {
                for flow in &flows[..count] {
                    let bonds = self.discounters[flow.time_index].numeraire_bonds(state, numeraire);
                    *held += flow.amount * bonds / principal_in_numeraire_portfolio;
                }
            }

            if done {
                break;
            }
            let next_numeraire = self.evolver.numeraires()[this_step + 1];
            if next_numeraire != numeraire {
                principal_in_numeraire_portfolio *= state.discount_ratio(numeraire, next_numeraire);
            }
        }

        for (v, held) in values.iter_mut().zip(&self.numeraires_held) {
            *v = held * self.initial_numeraire_value;
        }
        weight
    }

    /// Add `paths` weighted path values to `stats`.
    pub fn multiple_path_values(
        &mut self,
        stats: &mut SequenceStatistics,
        paths: usize,
    ) -> Result<()> {
        let products = self.product.number_of_products();
        ensure!(
            stats.dimension() == products,
            "statistics of dimension {} for {products} products",
            stats.dimension()
        );
        let mut values = vec![0.0; products];
        for _ in 0..paths {
            let weight = self.single_path_values(&mut values);
            stats.add(&values, weight);
        }
        debug!(paths, total = stats.samples(), "market-model paths simulated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_state::LmmCurveState;
    use approx::assert_abs_diff_eq;

    #[test]
    fn discounter_interpolates_geometrically() {
        let times = [0.5, 1.0, 1.5];
        let mut state = LmmCurveState::new(times.to_vec()).unwrap();
        state.set_on_forward_rates(&[0.04, 0.06], 0).unwrap();

        let on_grid = MarketModelDiscounter::new(1.0, &times).unwrap();
        assert_abs_diff_eq!(on_grid.numeraire_bonds(&state, 2), 1.03, epsilon = 1e-14);
        let last = MarketModelDiscounter::new(1.5, &times).unwrap();
        assert_abs_diff_eq!(last.numeraire_bonds(&state, 2), 1.0, epsilon = 1e-14);

        let mid = MarketModelDiscounter::new(1.25, &times).unwrap();
        assert_abs_diff_eq!(mid.numeraire_bonds(&state, 2), 1.03_f64.sqrt(), epsilon = 1e-14);
        let early = MarketModelDiscounter::new(0.0, &times).unwrap();
        assert!(early.numeraire_bonds(&state, 0) > 1.0);
    }
}
