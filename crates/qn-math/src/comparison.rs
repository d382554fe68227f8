//! Floating-point comparison utilities.

use num_traits::{Float, NumCast};

/// Return `true` if `x` and `y` agree to within `n` units of relative
/// machine precision (the "close" criterion with `n = 42`).
#[inline]
pub fn close<T: Float>(x: T, y: T) -> bool {
    close_n(x, y, 42)
}

/// Like [`close`] with an explicit multiplier.
pub fn close_n<T: Float>(x: T, y: T, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = T::epsilon() * <T as NumCast>::from(n).unwrap_or_else(T::one);
    if x == T::zero() || y == T::zero() {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() && diff <= tolerance * y.abs()
}

/// Weaker comparison: either relative bound suffices.
#[inline]
pub fn close_enough<T: Float>(x: T, y: T) -> bool {
    close_enough_n(x, y, 42)
}

/// Like [`close_enough`] with an explicit multiplier.
pub fn close_enough_n<T: Float>(x: T, y: T, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = T::epsilon() * <T as NumCast>::from(n).unwrap_or_else(T::one);
    if x == T::zero() || y == T::zero() {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() || diff <= tolerance * y.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0_f64, 1.0 + 10.0 * f64::EPSILON));
        assert!(!close(1.0_f64, 1.0 + 1e-9));
        assert!(close(0.0_f64, 0.0));
    }

    #[test]
    fn close_enough_single_precision() {
        assert!(close_enough(1.0_f32, 1.0 + f32::EPSILON));
        assert!(!close_enough(1.0_f32, 1.001));
    }
}
