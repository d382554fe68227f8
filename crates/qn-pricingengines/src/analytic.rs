//! Closed-form references: Black-Scholes-Merton with greeks for European
//! options and Black's formula for caplets and floorlets.
//!
//! The numerical engines are tested against these.

use crate::instruments::{CapFloorArgs, VanillaOptionArgs};
use crate::results::{OptionResults, PricingEngine, PricingResults};
use qn_core::{ensure, errors::Result, ExerciseType, OptionType, Rate, Real, Time, Volatility};
use qn_math::{black_formula, normal_cdf, normal_pdf};
use qn_methods::lattice::CapFloorType;
use qn_processes::GeneralizedBlackScholesProcess;
use qn_termstructures::YieldTermStructure;
use std::sync::Arc;
use tracing::debug;

/// Price and sensitivities of a European option.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlackScholesGreeks {
    /// Present value.
    pub value: Real,
    /// `∂V/∂S`.
    pub delta: Real,
    /// `∂²V/∂S²`.
    pub gamma: Real,
    /// `∂V/∂σ`, per unit of volatility.
    pub vega: Real,
    /// `∂V/∂t`, per year.
    pub theta: Real,
    /// `∂V/∂r`, per unit of rate.
    pub rho: Real,
}

/// Black-Scholes-Merton price with greeks for continuously compounded
/// `risk_free_rate` and `dividend_yield`.
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
///
/// Expired options are worth their intrinsic value; a vanishing variance
/// gives the discounted intrinsic value of the forward.
pub fn black_scholes_price(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Rate,
    dividend_yield: Rate,
    volatility: Volatility,
    time_to_expiry: Time,
) -> BlackScholesGreeks {
    let phi = option_type.sign();
    let t = time_to_expiry;
    if t <= 0.0 {
        let value = (phi * (spot - strike)).max(0.0);
        let delta = if value > 0.0 { phi } else { 0.0 };
        return BlackScholesGreeks {
            value,
            delta,
            ..BlackScholesGreeks::default()
        };
    }

    let (r, q, sigma) = (risk_free_rate, dividend_yield, volatility);
    let sqrt_t = t.sqrt();
    let std_dev = sigma * sqrt_t;
    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();
    let forward = spot * ((r - q) * t).exp();

    let (d1, d2) = if std_dev > 1e-15 {
        let d1 = ((spot / strike).ln() + (r - q + 0.5 * sigma * sigma) * t) / std_dev;
        (d1, d1 - std_dev)
    } else {
        let big = if forward > strike { 1e15 } else { -1e15 };
        (big, big)
    };

    let nd1 = normal_cdf(phi * d1);
    let nd2 = normal_cdf(phi * d2);
    let npd1 = normal_pdf(d1);
    let (gamma, vega, decay) = if std_dev > 1e-15 {
        (
            df_q * npd1 / (spot * std_dev),
            spot * df_q * npd1 * sqrt_t,
            -(spot * df_q * npd1 * sigma) / (2.0 * sqrt_t),
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    BlackScholesGreeks {
        value: phi * (spot * df_q * nd1 - strike * df_r * nd2),
        delta: phi * df_q * nd1,
        gamma,
        vega,
        theta: decay - phi * r * strike * df_r * nd2 + phi * q * spot * df_q * nd1,
        rho: phi * strike * t * df_r * nd2,
    }
}

/// Theta implied by the Black-Scholes PDE from value, delta and gamma.
pub fn black_scholes_theta(
    process: &GeneralizedBlackScholesProcess,
    maturity: Time,
    strike: Real,
    value: Real,
    delta: Real,
    gamma: Real,
) -> Real {
    let r = process.risk_free_rate().zero_rate(maturity);
    let q = process.dividend_yield().zero_rate(maturity);
    let vol = process.black_volatility().black_vol(maturity, strike);
    let s = process.spot();
    r * value - (r - q) * s * delta - 0.5 * vol * vol * s * s * gamma
}

/// European vanilla options under Black-Scholes-Merton.
#[derive(Debug, Clone)]
pub struct AnalyticEuropeanEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
}

impl AnalyticEuropeanEngine {
    /// Engine on `process`.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>) -> Self {
        Self { process }
    }
}

impl PricingEngine<VanillaOptionArgs> for AnalyticEuropeanEngine {
    type Results = OptionResults;

    fn calculate(&self, args: &VanillaOptionArgs) -> Result<OptionResults> {
        ensure!(
            args.exercise.exercise_type() == ExerciseType::European,
            "not a European option"
        );
        ensure!(args.payoff.name() == "Vanilla", "{} payoff not supported", args.payoff.name());
        let t = args.exercise.last_time();
        let strike = args.strike();
        let greeks = black_scholes_price(
            args.option_type(),
            self.process.spot(),
            strike,
            self.process.risk_free_rate().zero_rate(t),
            self.process.dividend_yield().zero_rate(t),
            self.process.black_volatility().black_vol(t, strike),
            t,
        );
        Ok(OptionResults {
            value: greeks.value,
            delta: Some(greeks.delta),
            gamma: Some(greeks.gamma),
            theta: Some(greeks.theta),
            error_estimate: None,
        })
    }
}

// ── Caplets ──────────────────────────────────────────────────────────────────

/// Black price of a caplet (call) or floorlet (put) on `forward` fixing at
/// `fixing_time` and paid with `discount` over an accrual `accrual`.
pub fn black_caplet(
    option_type: OptionType,
    forward: Rate,
    strike: Rate,
    volatility: Volatility,
    fixing_time: Time,
    accrual: Time,
    discount: Real,
) -> Real {
    let std_dev = volatility * fixing_time.max(0.0).sqrt();
    accrual * black_formula(option_type, strike, forward, std_dev, discount)
}

/// Caps, floors and collars with a flat Black volatility.
#[derive(Debug, Clone)]
pub struct BlackCapFloorEngine {
    curve: Arc<dyn YieldTermStructure>,
    volatility: Volatility,
}

impl BlackCapFloorEngine {
    /// Engine forecasting and discounting on `curve`.
    pub fn new(curve: Arc<dyn YieldTermStructure>, volatility: Volatility) -> Result<Self> {
        ensure!(volatility >= 0.0, "negative volatility {volatility}");
        Ok(Self { curve, volatility })
    }

    fn optionlet(
        &self,
        args: &CapFloorArgs,
        i: usize,
        option_type: OptionType,
        strike: Rate,
    ) -> Real {
        let p = &args.periods;
        let (start, end, tau) = (p.start_times[i], p.end_times[i], p.accrual_times[i]);
        let forward = (self.curve.discount(start) / self.curve.discount(end) - 1.0) / tau;
        let gearing = p.gearings[i];
        p.nominals[i]
            * gearing
            * black_caplet(
                option_type,
                forward,
                strike / gearing,
                self.volatility,
                start,
                tau,
                self.curve.discount(end),
            )
    }
}

impl PricingEngine<CapFloorArgs> for BlackCapFloorEngine {
    type Results = PricingResults;

    fn calculate(&self, args: &CapFloorArgs) -> Result<PricingResults> {
        ensure!(!args.is_empty(), "no cap/floor periods given");
        let mut cap = 0.0;
        let mut floor = 0.0;
        for i in 0..args.len() {
            if args.kind != CapFloorType::Floor {
                cap += self.optionlet(args, i, OptionType::Call, args.periods.cap_rates[i]);
            }
            if args.kind != CapFloorType::Cap {
                floor += self.optionlet(args, i, OptionType::Put, args.periods.floor_rates[i]);
            }
        }
        debug!(kind = ?args.kind, cap, floor, "black cap/floor");
        let npv = match args.kind {
            CapFloorType::Cap => cap,
            CapFloorType::Floor => floor,
            CapFloorType::Collar => cap - floor,
        };
        Ok(PricingResults::from_npv(npv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use qn_core::Exercise;
    use qn_termstructures::{BlackConstantVol, FlatForward};

    #[test]
    fn call_price_and_greeks() {
        let g = black_scholes_price(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.20, 1.0);
        assert_abs_diff_eq!(g.value, 10.4506, epsilon = 1e-4);
        assert!(g.delta > 0.5 && g.delta < 0.8);
        assert!(g.gamma > 0.0 && g.vega > 0.0 && g.rho > 0.0);
        assert!(g.theta < 0.0);
    }

    #[test]
    fn put_call_parity_with_dividends() {
        let (s, k, r, q, sigma, t) = (100.0, 105.0, 0.08, 0.03, 0.25, 0.5);
        let call = black_scholes_price(OptionType::Call, s, k, r, q, sigma, t);
        let put = black_scholes_price(OptionType::Put, s, k, r, q, sigma, t);
        let forward_value = s * (-q * t).exp() - k * (-r * t).exp();
        assert_abs_diff_eq!(call.value - put.value, forward_value, epsilon = 1e-10);
        assert_abs_diff_eq!(call.delta - put.delta, (-q * t).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(call.gamma, put.gamma, epsilon = 1e-12);
    }

    #[test]
    fn greeks_match_finite_differences() {
        let price =
            |s: Real, t: Real| black_scholes_price(OptionType::Put, s, 95.0, 0.04, 0.01, 0.3, t);
        let g = price(100.0, 0.75);
        let h = 1e-3;
        let delta = (price(100.0 + h, 0.75).value - price(100.0 - h, 0.75).value) / (2.0 * h);
        let gamma = (price(100.0 + h, 0.75).value - 2.0 * g.value + price(100.0 - h, 0.75).value)
            / (h * h);
        // theta is the derivative in calendar time: −∂V/∂T
        let theta = -(price(100.0, 0.75 + h).value - price(100.0, 0.75 - h).value) / (2.0 * h);
        assert_abs_diff_eq!(g.delta, delta, epsilon = 1e-6);
        assert_abs_diff_eq!(g.gamma, gamma, epsilon = 1e-4);
        assert_abs_diff_eq!(g.theta, theta, epsilon = 1e-5);
    }

    #[test]
    fn zero_vol_and_expired_options_are_intrinsic() {
        let g = black_scholes_price(OptionType::Call, 100.0, 95.0, 0.05, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(g.value, 100.0 - 95.0 * (-0.05_f64).exp(), epsilon = 1e-12);
        let expired = black_scholes_price(OptionType::Put, 90.0, 100.0, 0.05, 0.0, 0.2, 0.0);
        assert_eq!(expired.value, 10.0);
        assert_eq!(expired.delta, -1.0);
    }

    #[test]
    fn engine_reads_the_process_and_theta_matches_the_pde() {
        let process = Arc::new(GeneralizedBlackScholesProcess::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            Arc::new(BlackConstantVol::new(0.25)),
        ));
        let engine = AnalyticEuropeanEngine::new(Arc::clone(&process));
        let args =
            VanillaOptionArgs::vanilla(OptionType::Call, 110.0, Exercise::european(2.0).unwrap())
                .unwrap();
        let results = engine.calculate(&args).unwrap();
        let direct = black_scholes_price(OptionType::Call, 100.0, 110.0, 0.05, 0.02, 0.25, 2.0);
        assert_abs_diff_eq!(results.value, direct.value, epsilon = 1e-12);
        let (delta, gamma) = (results.delta.unwrap(), results.gamma.unwrap());
        let theta = black_scholes_theta(&process, 2.0, 110.0, results.value, delta, gamma);
        assert_abs_diff_eq!(results.theta.unwrap(), theta, epsilon = 1e-10);

        let american = VanillaOptionArgs::vanilla(
            OptionType::Call,
            110.0,
            Exercise::american(0.0, 2.0).unwrap(),
        )
        .unwrap();
        assert!(engine.calculate(&american).is_err());
    }

    #[test]
    fn collar_is_cap_minus_floor() {
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.05));
        let engine = BlackCapFloorEngine::new(curve, 0.2).unwrap();
        let npv = |kind| {
            let args =
                CapFloorArgs::regular(kind, 100.0, 0.5, 3.0, 0.5, Some(0.05), Some(0.04)).unwrap();
            engine.calculate(&args).unwrap().npv
        };
        let (cap, floor, collar) =
            (npv(CapFloorType::Cap), npv(CapFloorType::Floor), npv(CapFloorType::Collar));
        assert!(cap > floor && floor > 0.0);
        assert_abs_diff_eq!(collar, cap - floor, epsilon = 1e-12);
    }

    #[test]
    fn at_the_money_cap_minus_floor_is_a_swap() {
        // cap − floor at the same strike pays the forward minus the strike
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.05));
        let engine = BlackCapFloorEngine::new(Arc::clone(&curve), 0.3).unwrap();
        let k = 0.045;
        let cap =
            CapFloorArgs::regular(CapFloorType::Cap, 1.0, 1.0, 4.0, 0.5, Some(k), None).unwrap();
        let floor =
            CapFloorArgs::regular(CapFloorType::Floor, 1.0, 1.0, 4.0, 0.5, None, Some(k)).unwrap();
        let swap: Real = cap
            .periods
            .start_times
            .iter()
            .zip(&cap.periods.end_times)
            .map(|(&s, &e)| curve.discount(s) - curve.discount(e) - k * (e - s) * curve.discount(e))
            .sum();
        let diff = engine.calculate(&cap).unwrap().npv - engine.calculate(&floor).unwrap().npv;
        assert_abs_diff_eq!(diff, swap, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn put_call_parity_holds(
            spot in 50.0f64..150.0,
            strike in 50.0f64..150.0,
            r in -0.02f64..0.10,
            q in 0.0f64..0.06,
            vol in 0.05f64..0.8,
            t in 0.05f64..5.0,
        ) {
            let call = black_scholes_price(OptionType::Call, spot, strike, r, q, vol, t);
            let put = black_scholes_price(OptionType::Put, spot, strike, r, q, vol, t);
            let forward_value = spot * (-q * t).exp() - strike * (-r * t).exp();
            prop_assert!((call.value - put.value - forward_value).abs() < 1e-9);
            prop_assert!((call.gamma - put.gamma).abs() < 1e-12);
            prop_assert!((call.delta - put.delta - (-q * t).exp()).abs() < 1e-12);
        }
    }
}
