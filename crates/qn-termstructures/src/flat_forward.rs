//! `FlatForward`, a flat continuously-compounded yield curve.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use qn_core::{DiscountFactor, Rate, Time};

/// Yield curve with the same continuously-compounded rate at every
/// maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    rate: Rate,
}

impl FlatForward {
    /// Flat curve at continuously-compounded `rate`.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// The flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl TermStructure for FlatForward {}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn instantaneous_forward(&self, _t: Time) -> Rate {
        self.rate
    }
}
