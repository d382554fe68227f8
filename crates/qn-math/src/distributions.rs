//! Normal distribution and the Black formula.
//!
//! The cumulative distribution goes through the `statrs` complementary
//! error function, which keeps full relative accuracy in the far left
//! tail. The inverse uses Acklam's rational approximation followed by one
//! Newton step, giving close to machine precision on `(0, 1)`.

use qn_core::{OptionType, Real};
use statrs::function::erf::erfc;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// The standard normal probability density `φ(x) = exp(-x²/2) / √(2π)`.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution `Φ(x)`.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Inverse of the standard normal cumulative distribution.
///
/// Returns `-∞` for `p <= 0` and `+∞` for `p >= 1`.
pub fn inverse_cumulative_normal(p: Real) -> Real {
    if p <= 0.0 {
        return Real::NEG_INFINITY;
    }
    if p >= 1.0 {
        return Real::INFINITY;
    }
    let x = acklam(p);
    // one Newton step on Φ(x) − p
    let e = normal_cdf(x) - p;
    let d = normal_pdf(x);
    if d > 0.0 {
        x - e / d
    } else {
        x
    }
}

fn acklam(p: Real) -> Real {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e+01,
        2.209_460_984_245_205e+02,
        -2.759_285_104_469_687e+02,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e+01,
        2.506_628_277_459_239e+00,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e+01,
        1.615_858_368_580_409e+02,
        -1.556_989_798_598_866e+02,
        6.680_131_188_771_972e+01,
        -1.328_068_155_288_572e+01,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-03,
        -3.223_964_580_411_365e-01,
        -2.400_758_277_161_838e+00,
        -2.549_732_539_343_734e+00,
        4.374_664_141_464_968e+00,
        2.938_163_982_698_783e+00,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-03,
        3.224_671_290_700_398e-01,
        2.445_134_137_142_996e+00,
        3.754_408_661_907_416e+00,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

// ── Black formula ─────────────────────────────────────────────────────────────

/// Black (1976) price of an option on a lognormal forward.
///
/// `std_dev` is the total standard deviation `σ√T` of the log forward and
/// `discount` the discount factor to the payment time. A zero standard
/// deviation returns the discounted intrinsic value.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Real {
    let phi = option_type.sign();
    if std_dev <= 0.0 || strike <= 0.0 {
        return discount * (phi * (forward - strike)).max(0.0);
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    discount * phi * (forward * normal_cdf(phi * d1) - strike * normal_cdf(phi * d2))
}

/// Black formula for a displaced-diffusion forward: the forward and strike
/// are shifted by `displacement` before applying [`black_formula`].
pub fn displaced_black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
    displacement: Real,
) -> Real {
    black_formula(
        option_type,
        strike + displacement,
        forward + displacement,
        std_dev,
        discount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn pdf_and_cdf_reference_values() {
        assert_abs_diff_eq!(normal_pdf(0.0), 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-14);
        assert_abs_diff_eq!(normal_cdf(-2.0), 0.022_750_131_948_179_2, epsilon = 1e-14);
    }

    #[test]
    fn inverse_round_trip() {
        for p in [1e-10, 1e-4, 0.01, 0.1, 0.5, 0.75, 0.99, 1.0 - 1e-8] {
            let x = inverse_cumulative_normal(p);
            assert!(
                ((normal_cdf(x) - p) / p).abs() < 1e-12,
                "round trip failed for p = {p}"
            );
        }
        assert_eq!(inverse_cumulative_normal(0.0), Real::NEG_INFINITY);
    }

    #[test]
    fn black_put_call_parity() {
        let (k, f, sd, df) = (100.0, 105.0, 0.2, 0.95);
        let c = black_formula(OptionType::Call, k, f, sd, df);
        let p = black_formula(OptionType::Put, k, f, sd, df);
        assert_abs_diff_eq!(c - p, df * (f - k), epsilon = 1e-12);
    }

    #[test]
    fn black_zero_vol_is_intrinsic() {
        assert_abs_diff_eq!(
            black_formula(OptionType::Call, 90.0, 100.0, 0.0, 0.5),
            5.0,
            epsilon = 1e-15
        );
    }

    proptest! {
        #[test]
        fn cdf_is_symmetric_and_increasing(x in -8.0f64..8.0, dx in 1e-3f64..1.0) {
            prop_assert!((normal_cdf(x) + normal_cdf(-x) - 1.0).abs() < 1e-13);
            prop_assert!(normal_cdf(x + dx) >= normal_cdf(x));
        }
    }
}
