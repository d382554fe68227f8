//! The engine interface and what engines return.

use qn_core::{errors::Result, Real};
use std::collections::BTreeMap;

/// Prices an instrument described by `Args`.
pub trait PricingEngine<Args>: std::fmt::Debug + Send + Sync {
    /// What the engine computes.
    type Results;

    /// Price the instrument described by `args`.
    fn calculate(&self, args: &Args) -> Result<Self::Results>;
}

/// Value of an option with whatever sensitivities the engine provides.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionResults {
    /// Present value.
    pub value: Real,
    /// `∂V/∂S`.
    pub delta: Option<Real>,
    /// `∂²V/∂S²`.
    pub gamma: Option<Real>,
    /// `∂V/∂t`, per year.
    pub theta: Option<Real>,
    /// Standard error of a simulated value.
    pub error_estimate: Option<Real>,
}

impl OptionResults {
    /// Results carrying only a value.
    pub fn from_value(value: Real) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

/// Net present value plus named by-products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Standard error of a simulated value.
    pub error_estimate: Option<Real>,
    /// Additional named results.
    pub additional_results: BTreeMap<String, Real>,
}

impl PricingResults {
    /// Results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            ..Self::default()
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// A named result, if the engine produced it.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_results_builder() {
        let r = PricingResults::from_npv(42.0).with_result("fair_spread", 0.01);
        assert_eq!(r.npv, 42.0);
        assert_eq!(r.result("fair_spread"), Some(0.01));
        assert_eq!(r.result("delta"), None);
        assert!(r.error_estimate.is_none());
    }
}
