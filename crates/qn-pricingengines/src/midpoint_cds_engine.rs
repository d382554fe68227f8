//! Credit default swaps with defaults assumed at the middle of each
//! premium period.

use crate::instruments::{CdsArgs, ProtectionSide};
use crate::results::PricingEngine;
use qn_core::{ensure, errors::Result, Rate, Real};
use qn_termstructures::{DefaultProbabilityTermStructure, YieldTermStructure};
use std::sync::Arc;
use tracing::debug;

/// Leg values of a credit default swap, signed from the holder's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdsResults {
    /// Sum of the three legs.
    pub npv: Real,
    /// Running spread at which the swap is worth nothing.
    pub fair_spread: Rate,
    /// Protection payments.
    pub default_leg_npv: Real,
    /// Premiums paid on survival.
    pub coupon_leg_npv: Real,
    /// Premium accrued up to default.
    pub accrual_rebate_npv: Real,
    /// Change of the premium legs for a one basis point higher spread.
    pub coupon_leg_bps: Real,
}

/// Midpoint engine.
///
/// A default in period `i` is assumed at `(max(s_i, 0) + e_i) / 2`. The
/// loss `(1 − R) N` is discounted from there, or from the payment time when
/// protection is settled at period end. Periods paid on or before today
/// are skipped.
#[derive(Debug, Clone)]
pub struct MidPointCdsEngine {
    probability: Arc<dyn DefaultProbabilityTermStructure>,
    discount_curve: Arc<dyn YieldTermStructure>,
}

impl MidPointCdsEngine {
    /// Engine on the given default and discount curves.
    pub fn new(
        probability: Arc<dyn DefaultProbabilityTermStructure>,
        discount_curve: Arc<dyn YieldTermStructure>,
    ) -> Self {
        Self {
            probability,
            discount_curve,
        }
    }
}

impl PricingEngine<CdsArgs> for MidPointCdsEngine {
    type Results = CdsResults;

    fn calculate(&self, args: &CdsArgs) -> Result<CdsResults> {
        args.validate()?;
        let claim = (1.0 - args.recovery_rate) * args.nominal;

        let mut default_leg = 0.0;
        let mut risky_annuity = 0.0;
        let mut rebate_annuity = 0.0;
        for i in 0..args.payment_times.len() {
            let pay = args.payment_times[i];
            if pay <= 0.0 {
                continue;
            }
            let start = args.accrual_start_times[i];
            let end = args.accrual_end_times[i];
            let effective_start = start.max(0.0);
            let df_pay = self.discount_curve.discount(pay);

            let survival = self.probability.survival_probability(pay);
            risky_annuity += args.nominal * args.accrual(i) * survival * df_pay;

            if end <= effective_start {
                continue;
            }
            let default_time = 0.5 * (effective_start + end);
            let df_default = if args.pays_at_default_time {
                self.discount_curve.discount(default_time)
            } else {
                df_pay
            };
            let p = self.probability.default_probability_between(effective_start, end);
            default_leg += claim * p * df_default;
            if args.settles_accrual {
                rebate_annuity += args.nominal * (default_time - start) * p * df_default;
            }
        }

        let premium_annuity = risky_annuity + rebate_annuity;
        ensure!(premium_annuity > 0.0, "no premium left to pay");
        let (protection_sign, premium_sign) = match args.side {
            ProtectionSide::Buyer => (1.0, -1.0),
            ProtectionSide::Seller => (-1.0, 1.0),
        };
        let default_leg_npv = protection_sign * default_leg;
        let coupon_leg_npv = premium_sign * args.spread * risky_annuity;
        let accrual_rebate_npv = premium_sign * args.spread * rebate_annuity;
        debug!(default_leg, premium_annuity, side = ?args.side, "midpoint cds");

        Ok(CdsResults {
            npv: default_leg_npv + coupon_leg_npv + accrual_rebate_npv,
            fair_spread: default_leg / premium_annuity,
            default_leg_npv,
            coupon_leg_npv,
            accrual_rebate_npv,
            coupon_leg_bps: premium_sign * premium_annuity * 1e-4,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qn_termstructures::{FlatForward, FlatHazardRate};

    fn engine(hazard: Real) -> MidPointCdsEngine {
        MidPointCdsEngine::new(
            Arc::new(FlatHazardRate::new(hazard).unwrap()),
            Arc::new(FlatForward::new(0.03)),
        )
    }

    fn cds(side: ProtectionSide, spread: Rate) -> CdsArgs {
        CdsArgs::regular(side, 1_000_000.0, spread, 0.4, 0.0, 5.0, 0.25).unwrap()
    }

    #[test]
    fn fair_spread_follows_the_credit_triangle() {
        let results = engine(0.02).calculate(&cds(ProtectionSide::Buyer, 0.01)).unwrap();
        assert_abs_diff_eq!(results.fair_spread, 0.02 * 0.6, epsilon = 5e-5);
        // spread below fair: protection is cheap for the buyer
        assert!(results.npv > 0.0);
    }

    #[test]
    fn swap_at_fair_spread_is_worth_nothing() {
        let e = engine(0.015);
        let fair = e.calculate(&cds(ProtectionSide::Seller, 0.005)).unwrap().fair_spread;
        let at_par = e.calculate(&cds(ProtectionSide::Seller, fair)).unwrap();
        assert_abs_diff_eq!(at_par.npv, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn buyer_and_seller_offset() {
        let e = engine(0.02);
        let buyer = e.calculate(&cds(ProtectionSide::Buyer, 0.015)).unwrap();
        let seller = e.calculate(&cds(ProtectionSide::Seller, 0.015)).unwrap();
        assert_abs_diff_eq!(buyer.npv, -seller.npv, epsilon = 1e-8);
        assert_abs_diff_eq!(buyer.coupon_leg_bps, -seller.coupon_leg_bps, epsilon = 1e-10);
        assert!(buyer.default_leg_npv > 0.0 && buyer.coupon_leg_npv < 0.0);
    }

    #[test]
    fn without_default_risk_only_premiums_remain() {
        let riskless = MidPointCdsEngine::new(
            Arc::new(FlatHazardRate::new(0.0).unwrap()),
            Arc::new(FlatForward::new(0.03)),
        );
        let r = riskless.calculate(&cds(ProtectionSide::Seller, 0.01)).unwrap();
        assert_eq!(r.default_leg_npv, 0.0);
        assert_eq!(r.accrual_rebate_npv, 0.0);
        let annuity: Real = (1..=20).map(|k| 0.25 * (-0.03 * 0.25 * k as Real).exp()).sum();
        assert_abs_diff_eq!(r.npv, 1_000_000.0 * 0.01 * annuity, epsilon = 1e-6);
    }

    #[test]
    fn elapsed_periods_are_skipped() {
        let mut seasoned = cds(ProtectionSide::Buyer, 0.01);
        for t in seasoned
            .accrual_start_times
            .iter_mut()
            .chain(seasoned.accrual_end_times.iter_mut())
            .chain(seasoned.payment_times.iter_mut())
        {
            *t -= 1.0;
        }
        let full = engine(0.02).calculate(&cds(ProtectionSide::Buyer, 0.01)).unwrap();
        let remaining = engine(0.02).calculate(&seasoned).unwrap();
        assert!(remaining.default_leg_npv < full.default_leg_npv);
        assert!(remaining.fair_spread > 0.0);
    }
}
