//! `YieldTermStructure`, interest-rate curves.
//!
//! A yield curve provides three related quantities:
//!
//! * **discount factor** `P(0, t)`;
//! * **zero rate**, continuously compounded, `-ln P(0, t) / t`;
//! * **forward rates**, both over a period and instantaneous.

use crate::term_structure::TermStructure;
use qn_core::{DiscountFactor, Rate, Time};

/// Step used for finite-difference instantaneous forwards.
pub(crate) const DT: Time = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Implementors provide at least one of
/// [`discount_impl`](YieldTermStructure::discount_impl) and
/// [`zero_rate_impl`](YieldTermStructure::zero_rate_impl); the other is
/// derived from it.
pub trait YieldTermStructure: TermStructure {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Discount factor for time `t`. Default: from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.zero_rate_impl(t) * t).exp()
    }

    /// Continuously-compounded zero rate for time `t`.
    /// Default: from `discount_impl`, with the short-end limit at `t = 0`.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        let t = if t == 0.0 { DT } else { t };
        -self.discount_impl(t).ln() / t
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor `P(0, t)`.
    fn discount(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            1.0
        } else {
            self.discount_impl(t)
        }
    }

    /// Continuously-compounded zero rate for maturity `t`.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`; the
    /// instantaneous forward if the two times coincide.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if (t2 - t1).abs() < f64::EPSILON {
            return self.instantaneous_forward(t1);
        }
        (self.discount(t1) / self.discount(t2)).ln() / (t2 - t1)
    }

    /// Simply-compounded forward rate between `t1` and `t2`:
    /// `(P(t1)/P(t2) − 1) / (t2 − t1)`.
    fn simple_forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if (t2 - t1).abs() < f64::EPSILON {
            return self.instantaneous_forward(t1);
        }
        (self.discount(t1) / self.discount(t2) - 1.0) / (t2 - t1)
    }

    /// Instantaneous forward rate `f(0, t) = −∂ ln P(0, t) / ∂t`.
    fn instantaneous_forward(&self, t: Time) -> Rate {
        let t1 = (t - 0.5 * DT).max(0.0);
        let t2 = t1 + DT;
        (self.discount(t1).ln() - self.discount(t2).ln()) / DT
    }
}
