//! Argument structs describing the instruments the engines price.
//!
//! Schedules are given as times in years from the reference time; accrual
//! fractions default to the distance between consecutive schedule times.

use qn_core::{
    ensure, errors::Result, Exercise, OptionType, Payoff, PlainVanillaPayoff, Rate, Real, Spread,
    StrikedPayoff, Time,
};
use qn_methods::lattice::{CapFloorPeriods, CapFloorType, SwapLegs, SwapType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Vanilla options ──────────────────────────────────────────────────────────

/// Option on a single underlying with a striked payoff.
#[derive(Debug, Clone)]
pub struct VanillaOptionArgs {
    /// Payoff at exercise.
    pub payoff: Arc<dyn StrikedPayoff>,
    /// Exercise schedule.
    pub exercise: Exercise,
}

impl VanillaOptionArgs {
    /// Option with `payoff` and `exercise`.
    pub fn new(payoff: Arc<dyn StrikedPayoff>, exercise: Exercise) -> Self {
        Self { payoff, exercise }
    }

    /// Plain call or put.
    pub fn vanilla(option_type: OptionType, strike: Real, exercise: Exercise) -> Result<Self> {
        Ok(Self::new(Arc::new(PlainVanillaPayoff::new(option_type, strike)?), exercise))
    }

    /// The strike.
    pub fn strike(&self) -> Real {
        self.payoff.strike()
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.payoff.option_type()
    }

    /// The payoff seen as a plain [`Payoff`].
    pub fn plain_payoff(&self) -> Arc<dyn Payoff> {
        Arc::new(StrikedAsPlain(Arc::clone(&self.payoff)))
    }
}

#[derive(Debug)]
struct StrikedAsPlain(Arc<dyn StrikedPayoff>);

impl Payoff for StrikedAsPlain {
    fn value(&self, price: Real) -> Real {
        self.0.value(price)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

// ── Regular schedules ────────────────────────────────────────────────────────

/// `start, start + period, …, end`; a short last period absorbs the rest.
fn regular_schedule(start: Time, end: Time, period: Time) -> Result<Vec<Time>> {
    ensure!(start >= 0.0, "negative start time {start}");
    ensure!(end > start, "end time {end} not after start time {start}");
    ensure!(period > 0.0, "non-positive period {period}");
    let mut times = vec![start];
    let mut i = 1;
    loop {
        let t = start + i as Time * period;
        if t >= end || qn_core::same_time(t, end) {
            times.push(end);
            return Ok(times);
        }
        times.push(t);
        i += 1;
    }
}

// ── Swaps ────────────────────────────────────────────────────────────────────

/// Fixed-for-floating swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapArgs {
    /// Payer or receiver of the fixed leg.
    pub swap_type: SwapType,
    /// Coupon schedules and amounts.
    pub legs: SwapLegs,
}

// ── Swaptions ────────────────────────────────────────────────────────────────

/// Option to enter a fixed-for-floating swap.
///
/// Exercising at `t` enters the coupons that reset at or after `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwaptionArgs {
    /// Payer or receiver of the fixed leg.
    pub swap_type: SwapType,
    /// Notional of both legs.
    pub nominal: Real,
    /// Fixed coupon rate.
    pub fixed_rate: Rate,
    /// Accrual start of each fixed coupon.
    pub fixed_reset_times: Vec<Time>,
    /// Payment of each fixed coupon.
    pub fixed_pay_times: Vec<Time>,
    /// Fixing of each floating coupon.
    pub floating_reset_times: Vec<Time>,
    /// Payment of each floating coupon.
    pub floating_pay_times: Vec<Time>,
    /// Spread over the floating index.
    pub floating_spread: Spread,
    /// Exercise schedule.
    pub exercise: Exercise,
}

impl SwaptionArgs {
    /// Swaption on a swap from `start` to `end` with regular fixed and
    /// floating periods.
    #[allow(clippy::too_many_arguments)]
    pub fn regular(
        swap_type: SwapType,
        nominal: Real,
        fixed_rate: Rate,
        start: Time,
        end: Time,
        fixed_period: Time,
        floating_period: Time,
        exercise: Exercise,
    ) -> Result<Self> {
        let fixed = regular_schedule(start, end, fixed_period)?;
        let floating = regular_schedule(start, end, floating_period)?;
        Ok(Self {
            swap_type,
            nominal,
            fixed_rate,
            fixed_reset_times: fixed[..fixed.len() - 1].to_vec(),
            fixed_pay_times: fixed[1..].to_vec(),
            floating_reset_times: floating[..floating.len() - 1].to_vec(),
            floating_pay_times: floating[1..].to_vec(),
            floating_spread: 0.0,
            exercise,
        })
    }

    /// The underlying swap's legs.
    pub fn legs(&self) -> Result<SwapLegs> {
        ensure!(
            self.fixed_reset_times.len() == self.fixed_pay_times.len(),
            "{} fixed resets for {} fixed payments",
            self.fixed_reset_times.len(),
            self.fixed_pay_times.len()
        );
        ensure!(
            self.floating_reset_times.len() == self.floating_pay_times.len(),
            "{} floating resets for {} floating payments",
            self.floating_reset_times.len(),
            self.floating_pay_times.len()
        );
        let floating_accrual_times: Vec<Time> = self
            .floating_reset_times
            .iter()
            .zip(&self.floating_pay_times)
            .map(|(r, p)| p - r)
            .collect();
        let legs = SwapLegs {
            nominal: self.nominal,
            fixed_reset_times: self.fixed_reset_times.clone(),
            fixed_pay_times: self.fixed_pay_times.clone(),
            fixed_coupons: self
                .fixed_reset_times
                .iter()
                .zip(&self.fixed_pay_times)
                .map(|(r, p)| self.nominal * self.fixed_rate * (p - r))
                .collect(),
            floating_reset_times: self.floating_reset_times.clone(),
            floating_pay_times: self.floating_pay_times.clone(),
            floating_spreads: vec![self.floating_spread; floating_accrual_times.len()],
            floating_coupons: Vec::new(),
            floating_accrual_times,
        };
        legs.validate()?;
        Ok(legs)
    }

    /// The underlying swap.
    pub fn underlying(&self) -> Result<SwapArgs> {
        Ok(SwapArgs {
            swap_type: self.swap_type,
            legs: self.legs()?,
        })
    }

    /// Maturity of the underlying swap.
    pub fn end_time(&self) -> Time {
        self.fixed_pay_times
            .iter()
            .chain(&self.floating_pay_times)
            .copied()
            .fold(0.0, Time::max)
    }
}

// ── Caps and floors ──────────────────────────────────────────────────────────

/// Cap, floor or collar on a floating rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapFloorArgs {
    /// Instrument kind.
    pub kind: CapFloorType,
    /// Optionlet schedule and strikes.
    pub periods: CapFloorPeriods,
}

impl CapFloorArgs {
    /// Instrument of `kind` with optionlets over `[start, end]` every
    /// `period`. Caps need `cap_rate`, floors `floor_rate`, collars both.
    pub fn regular(
        kind: CapFloorType,
        nominal: Real,
        start: Time,
        end: Time,
        period: Time,
        cap_rate: Option<Rate>,
        floor_rate: Option<Rate>,
    ) -> Result<Self> {
        let needs_cap = matches!(kind, CapFloorType::Cap | CapFloorType::Collar);
        let needs_floor = matches!(kind, CapFloorType::Floor | CapFloorType::Collar);
        ensure!(!needs_cap || cap_rate.is_some(), "{kind:?} without a cap rate");
        ensure!(!needs_floor || floor_rate.is_some(), "{kind:?} without a floor rate");
        let schedule = regular_schedule(start, end, period)?;
        let n = schedule.len() - 1;
        Ok(Self {
            kind,
            periods: CapFloorPeriods {
                start_times: schedule[..n].to_vec(),
                end_times: schedule[1..].to_vec(),
                accrual_times: schedule.windows(2).map(|w| w[1] - w[0]).collect(),
                nominals: vec![nominal; n],
                gearings: vec![1.0; n],
                cap_rates: if needs_cap {
                    vec![cap_rate.unwrap_or_default(); n]
                } else {
                    Vec::new()
                },
                floor_rates: if needs_floor {
                    vec![floor_rate.unwrap_or_default(); n]
                } else {
                    Vec::new()
                },
            },
        })
    }

    /// Number of optionlets.
    pub fn len(&self) -> usize {
        self.periods.start_times.len()
    }

    /// `true` without optionlets.
    pub fn is_empty(&self) -> bool {
        self.periods.start_times.is_empty()
    }
}

// ── Credit default swaps ─────────────────────────────────────────────────────

/// Side of a credit default swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionSide {
    /// Pays the premium, receives the loss.
    Buyer,
    /// Receives the premium, pays the loss.
    Seller,
}

/// Credit default swap with a running premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdsArgs {
    /// Protection buyer or seller.
    pub side: ProtectionSide,
    /// Notional.
    pub nominal: Real,
    /// Running premium per year.
    pub spread: Rate,
    /// Fraction of the notional recovered on default.
    pub recovery_rate: Real,
    /// Accrual start of each premium period.
    pub accrual_start_times: Vec<Time>,
    /// Accrual end of each premium period.
    pub accrual_end_times: Vec<Time>,
    /// Payment of each premium.
    pub payment_times: Vec<Time>,
    /// Whether the premium accrued up to default is paid.
    pub settles_accrual: bool,
    /// Whether the loss is paid at default rather than at the end of the
    /// period.
    pub pays_at_default_time: bool,
}

impl CdsArgs {
    /// Running CDS over `[start, end]` with premiums paid every `period` at
    /// the end of each accrual period.
    pub fn regular(
        side: ProtectionSide,
        nominal: Real,
        spread: Rate,
        recovery_rate: Real,
        start: Time,
        end: Time,
        period: Time,
    ) -> Result<Self> {
        let schedule = regular_schedule(start, end, period)?;
        let n = schedule.len() - 1;
        let args = Self {
            side,
            nominal,
            spread,
            recovery_rate,
            accrual_start_times: schedule[..n].to_vec(),
            accrual_end_times: schedule[1..].to_vec(),
            payment_times: schedule[1..].to_vec(),
            settles_accrual: true,
            pays_at_default_time: true,
        };
        args.validate()?;
        Ok(args)
    }

    /// Fails on inconsistent schedules or a recovery outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let n = self.accrual_start_times.len();
        ensure!(n > 0, "no premium periods given");
        ensure!(
            self.accrual_end_times.len() == n && self.payment_times.len() == n,
            "premium schedule sizes differ: {n} starts, {} ends, {} payments",
            self.accrual_end_times.len(),
            self.payment_times.len()
        );
        ensure!(
            (0.0..1.0).contains(&self.recovery_rate),
            "recovery rate {} outside [0, 1)",
            self.recovery_rate
        );
        for i in 0..n {
            ensure!(
                self.accrual_end_times[i] > self.accrual_start_times[i],
                "premium period {i} is empty"
            );
        }
        Ok(())
    }

    /// Accrual fraction of period `i`.
    pub fn accrual(&self, i: usize) -> Time {
        self.accrual_end_times[i] - self.accrual_start_times[i]
    }
}
