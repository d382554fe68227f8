//! `ZeroSpreadedTermStructure`, a base curve shifted by a constant
//! continuously-compounded zero spread.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use qn_core::{DiscountFactor, Rate, Spread, Time};
use std::sync::Arc;

/// `z(t) = z_base(t) + spread`.
#[derive(Debug, Clone)]
pub struct ZeroSpreadedTermStructure {
    base: Arc<dyn YieldTermStructure>,
    spread: Spread,
}

impl ZeroSpreadedTermStructure {
    /// Shift `base` by `spread`.
    pub fn new(base: Arc<dyn YieldTermStructure>, spread: Spread) -> Self {
        Self { base, spread }
    }

    /// The spread.
    pub fn spread(&self) -> Spread {
        self.spread
    }
}

impl TermStructure for ZeroSpreadedTermStructure {
    fn max_time(&self) -> Time {
        self.base.max_time()
    }
}

impl YieldTermStructure for ZeroSpreadedTermStructure {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.base.discount(t) * (-self.spread * t).exp()
    }

    fn instantaneous_forward(&self, t: Time) -> Rate {
        self.base.instantaneous_forward(t) + self.spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatForward;
    use approx::assert_abs_diff_eq;

    #[test]
    fn spread_adds_to_zero_rates() {
        let base: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.03));
        let c = ZeroSpreadedTermStructure::new(base, 0.01);
        assert_abs_diff_eq!(c.zero_rate(4.0), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(c.instantaneous_forward(2.0), 0.04, epsilon = 1e-12);
    }
}
