//! Swaps priced by discounting their coupons on a single curve.

use crate::instruments::SwapArgs;
use crate::results::{PricingEngine, PricingResults};
use qn_core::{ensure, errors::Result, Real};
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Discounted cash flows of a vanilla swap.
///
/// $$\text{NPV} = \phi \left(\sum_j N (P(s_j) - P(e_j)) + N s \tau_j P(e_j)
///   - \sum_i c_i P(t_i)\right)$$
///
/// with `φ = +1` for a payer swap. Floating coupons that reset before the
/// reference time are paid as their known amounts. Payments before the
/// reference time are ignored.
#[derive(Debug, Clone)]
pub struct DiscountingSwapEngine {
    discount_curve: Arc<dyn YieldTermStructure>,
}

impl DiscountingSwapEngine {
    /// Engine forecasting and discounting on `discount_curve`.
    pub fn new(discount_curve: Arc<dyn YieldTermStructure>) -> Self {
        Self { discount_curve }
    }
}

impl PricingEngine<SwapArgs> for DiscountingSwapEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &SwapArgs) -> Result<PricingResults> {
        let legs = &args.legs;
        legs.validate()?;
        let curve = &self.discount_curve;

        let mut fixed_npv = 0.0;
        let mut annuity = 0.0;
        for i in 0..legs.fixed_coupons.len() {
            let pay = legs.fixed_pay_times[i];
            if pay > 0.0 {
                let df = curve.discount(pay);
                fixed_npv += legs.fixed_coupons[i] * df;
                annuity += legs.nominal * (pay - legs.fixed_reset_times[i]) * df;
            }
        }

        let mut floating_npv = 0.0;
        for i in 0..legs.floating_reset_times.len() {
            let (reset, pay) = (legs.floating_reset_times[i], legs.floating_pay_times[i]);
            if pay <= 0.0 {
                continue;
            }
            let df = curve.discount(pay);
            floating_npv += if reset >= 0.0 {
                let spread = legs.floating_spreads[i] * legs.floating_accrual_times[i];
                legs.nominal * (curve.discount(reset) - df + spread * df)
            } else {
                legs.floating_coupons[i] * df
            };
        }

        ensure!(annuity > 0.0, "no fixed coupons left to pay");
        let npv = args.swap_type.sign() * (floating_npv - fixed_npv);
        Ok(PricingResults::from_npv(npv)
            .with_result("fixed_leg_npv", fixed_npv)
            .with_result("floating_leg_npv", floating_npv)
            .with_result("fixed_leg_bps", annuity * 1e-4)
            .with_result("fair_rate", floating_npv / annuity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::SwaptionArgs;
    use approx::assert_abs_diff_eq;
    use qn_core::Exercise;
    use qn_methods::lattice::SwapType;
    use qn_termstructures::FlatForward;

    fn swap(swap_type: SwapType, fixed_rate: Real) -> SwapArgs {
        let exercise = Exercise::european(1.0).unwrap();
        SwaptionArgs::regular(swap_type, 100.0, fixed_rate, 1.0, 5.0, 1.0, 0.5, exercise)
            .unwrap()
            .underlying()
            .unwrap()
    }

    #[test]
    fn fair_rate_swap_is_worth_nothing() {
        let engine = DiscountingSwapEngine::new(Arc::new(FlatForward::new(0.04)));
        let fair =
            engine.calculate(&swap(SwapType::Payer, 0.03)).unwrap().result("fair_rate").unwrap();
        // continuous 4% is 4.081% annually compounded
        assert_abs_diff_eq!(fair, 0.04_f64.exp() - 1.0, epsilon = 1e-12);
        let at_par = engine.calculate(&swap(SwapType::Payer, fair)).unwrap();
        assert_abs_diff_eq!(at_par.npv, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn payer_and_receiver_offset() {
        let engine = DiscountingSwapEngine::new(Arc::new(FlatForward::new(0.04)));
        let payer = engine.calculate(&swap(SwapType::Payer, 0.05)).unwrap().npv;
        let receiver = engine.calculate(&swap(SwapType::Receiver, 0.05)).unwrap().npv;
        assert!(receiver > 0.0);
        assert_abs_diff_eq!(payer, -receiver, epsilon = 1e-12);
    }
}
