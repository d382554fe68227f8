//! Products priced by simulation: on every evolution step a product looks
//! at the curve and emits cash flows.

mod multi_step_coterminal_swaptions;
mod multi_step_forwards;
mod multi_step_optionlets;

pub use multi_step_coterminal_swaptions::MultiStepCoterminalSwaptions;
pub use multi_step_forwards::MultiStepForwards;
pub use multi_step_optionlets::MultiStepOptionlets;

use crate::curve_state::CurveState;
use crate::evolution_description::{check_increasing_times, EvolutionDescription};
use qn_core::{ensure, errors::Result, Real, Time};

/// Amount paid at `possible_cash_flow_times()[time_index]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CashFlow {
    /// Index into the product's cash-flow times.
    pub time_index: usize,
    /// Amount paid.
    pub amount: Real,
}

/// A set of products evolved together along one simulated curve.
pub trait MarketModelMultiProduct: std::fmt::Debug + Send {
    /// Numeraires the product prices best under; bond `k + 1` at step `k`
    /// unless overridden.
    fn suggested_numeraires(&self) -> Vec<usize> {
        (1..=self.evolution().number_of_steps()).collect()
    }

    /// Grids the product needs.
    fn evolution(&self) -> &EvolutionDescription;

    /// Every time at which a cash flow can occur.
    fn possible_cash_flow_times(&self) -> &[Time];

    /// Number of products.
    fn number_of_products(&self) -> usize;

    /// Upper bound on the cash flows a product emits in one step.
    fn max_number_of_cash_flows_per_product_per_step(&self) -> usize;

    /// Prepare for a new path.
    fn reset(&mut self);

    /// Emit the cash flows of the step just evolved into `cash_flows`,
    /// recording how many each product paid; returns whether the product
    /// is finished.
    fn next_time_step(
        &mut self,
        state: &dyn CurveState,
        number_cash_flows_this_step: &mut [usize],
        cash_flows: &mut [Vec<CashFlow>],
    ) -> bool;
}

/// Grids of a product with one product fixing at each rate time but the
/// last, needing forwards `first_relevant(i)..end` at step `i`.
fn multi_step_evolution(
    rate_times: &[Time],
    payment_times: &[Time],
    relevance: impl Fn(usize) -> (usize, usize),
) -> Result<EvolutionDescription> {
    ensure!(rate_times.len() >= 2, "at least two rate times required");
    let n = rate_times.len() - 1;
    ensure!(
        payment_times.len() == n,
        "{} payment times for {n} rates",
        payment_times.len()
    );
    check_increasing_times(payment_times)?;
    EvolutionDescription::new(
        rate_times.to_vec(),
        rate_times[..n].to_vec(),
        (0..n).map(relevance).collect(),
    )
}
