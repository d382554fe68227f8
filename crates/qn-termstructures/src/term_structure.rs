//! `TermStructure`, the base trait of all curves.

use qn_core::Time;

/// Base trait for all term structures.
///
/// Time is measured in years from the reference time `0`.
pub trait TermStructure: std::fmt::Debug + Send + Sync {
    /// The latest time for which the curve is defined without
    /// extrapolation.
    fn max_time(&self) -> Time {
        Time::INFINITY
    }

    /// Return `true` if `t` lies in `[0, max_time]`.
    fn check_range(&self, t: Time) -> bool {
        t >= 0.0 && t <= self.max_time()
    }
}
