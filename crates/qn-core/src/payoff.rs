//! Option payoffs.
//!
//! A payoff maps the value of the underlying at exercise to a cash amount.
//! Finite-difference inner-value calculators, lattice options and Monte
//! Carlo path pricers all evaluate payoffs through the [`Payoff`] trait.

use crate::{ensure, Real, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// +1 for a call, −1 for a put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// A payoff as a function of the underlying price.
pub trait Payoff: fmt::Debug + Send + Sync {
    /// Payoff for underlying value `price`.
    fn value(&self, price: Real) -> Real;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// A payoff with a strike and a call/put flag.
pub trait StrikedPayoff: Payoff {
    /// The strike.
    fn strike(&self) -> Real;

    /// Call or put.
    fn option_type(&self) -> OptionType;
}

// ── Plain vanilla ─────────────────────────────────────────────────────────────

/// `max(φ(S − K), 0)` with `φ = ±1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainVanillaPayoff {
    option_type: OptionType,
    strike: Real,
}

impl PlainVanillaPayoff {
    /// Create a vanilla payoff; the strike must be non-negative.
    pub fn new(option_type: OptionType, strike: Real) -> Result<Self> {
        ensure!(strike >= 0.0, "negative strike given: {strike}");
        Ok(Self {
            option_type,
            strike,
        })
    }
}

impl Payoff for PlainVanillaPayoff {
    fn value(&self, price: Real) -> Real {
        (self.option_type.sign() * (price - self.strike)).max(0.0)
    }

    fn name(&self) -> &'static str {
        "Vanilla"
    }
}

impl StrikedPayoff for PlainVanillaPayoff {
    fn strike(&self) -> Real {
        self.strike
    }

    fn option_type(&self) -> OptionType {
        self.option_type
    }
}

// ── Digital payoffs ───────────────────────────────────────────────────────────

/// Pays a fixed cash amount when the option ends in the money.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashOrNothingPayoff {
    option_type: OptionType,
    strike: Real,
    cash: Real,
}

impl CashOrNothingPayoff {
    /// Create a cash-or-nothing payoff.
    pub fn new(option_type: OptionType, strike: Real, cash: Real) -> Result<Self> {
        ensure!(strike >= 0.0, "negative strike given: {strike}");
        Ok(Self {
            option_type,
            strike,
            cash,
        })
    }

    /// The cash amount paid in the money.
    pub fn cash(&self) -> Real {
        self.cash
    }
}

impl Payoff for CashOrNothingPayoff {
    fn value(&self, price: Real) -> Real {
        if self.option_type.sign() * (price - self.strike) > 0.0 {
            self.cash
        } else {
            0.0
        }
    }

    fn name(&self) -> &'static str {
        "CashOrNothing"
    }
}

impl StrikedPayoff for CashOrNothingPayoff {
    fn strike(&self) -> Real {
        self.strike
    }

    fn option_type(&self) -> OptionType {
        self.option_type
    }
}

/// Pays the underlying when the option ends in the money.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetOrNothingPayoff {
    option_type: OptionType,
    strike: Real,
}

impl AssetOrNothingPayoff {
    /// Create an asset-or-nothing payoff.
    pub fn new(option_type: OptionType, strike: Real) -> Result<Self> {
        ensure!(strike >= 0.0, "negative strike given: {strike}");
        Ok(Self {
            option_type,
            strike,
        })
    }
}

impl Payoff for AssetOrNothingPayoff {
    fn value(&self, price: Real) -> Real {
        if self.option_type.sign() * (price - self.strike) > 0.0 {
            price
        } else {
            0.0
        }
    }

    fn name(&self) -> &'static str {
        "AssetOrNothing"
    }
}

impl StrikedPayoff for AssetOrNothingPayoff {
    fn strike(&self) -> Real {
        self.strike
    }

    fn option_type(&self) -> OptionType {
        self.option_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_call_and_put() {
        let call = PlainVanillaPayoff::new(OptionType::Call, 100.0).unwrap();
        let put = PlainVanillaPayoff::new(OptionType::Put, 100.0).unwrap();
        assert_eq!(call.value(110.0), 10.0);
        assert_eq!(call.value(90.0), 0.0);
        assert_eq!(put.value(90.0), 10.0);
        assert_eq!(put.value(110.0), 0.0);
    }

    #[test]
    fn negative_strike_rejected() {
        assert!(PlainVanillaPayoff::new(OptionType::Call, -1.0).is_err());
    }

    #[test]
    fn digital_payoffs() {
        let cash = CashOrNothingPayoff::new(OptionType::Call, 100.0, 5.0).unwrap();
        assert_eq!(cash.value(101.0), 5.0);
        assert_eq!(cash.value(100.0), 0.0);
        let asset = AssetOrNothingPayoff::new(OptionType::Put, 100.0).unwrap();
        assert_eq!(asset.value(80.0), 80.0);
        assert_eq!(asset.value(120.0), 0.0);
    }

    #[test]
    fn parity_of_digitals_and_vanilla() {
        let k = 95.0;
        let vanilla = PlainVanillaPayoff::new(OptionType::Call, k).unwrap();
        let asset = AssetOrNothingPayoff::new(OptionType::Call, k).unwrap();
        let cash = CashOrNothingPayoff::new(OptionType::Call, k, k).unwrap();
        for s in [50.0, 94.0, 96.0, 150.0] {
            assert!((vanilla.value(s) - (asset.value(s) - cash.value(s))).abs() < 1e-12);
        }
    }
}
