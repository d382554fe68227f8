//! 1-D root-finding solvers.
//!
//! [`brent`] and [`bisection`] need a bracket with a sign change.
//! [`brent_from_guess`] first grows a bracket around a guess, which is how
//! the short-rate tree fitting calls it.

use qn_core::{
    errors::{Error, Result},
    Real,
};

const MAX_EVALUATIONS: usize = 100;
const DEFAULT_ACCURACY: Real = 1.0e-11;
const GROWTH_FACTOR: Real = 1.6;

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method for a root of `f` in `[x_min, x_max]`.
///
/// Combines bisection, secant and inverse quadratic interpolation. The
/// function values at the bracket ends must have opposite signs.
pub fn brent<F>(f: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let fa = f(x_min);
    let fb = f(x_max);
    brent_bracketed(&f, x_min, fa, x_max, fb, accuracy)
}

fn brent_bracketed<F>(
    f: &F,
    x_min: Real,
    f_min: Real,
    x_max: Real,
    f_max: Real,
    accuracy: Real,
) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let (mut a, mut b) = (x_min, x_max);
    let (mut fa, mut fb) = (f_min, f_max);

    if fa * fb > 0.0 {
        return Err(Error::Precondition(format!(
            "root not bracketed: f({a}) = {fa}, f({b}) = {fb}"
        )));
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_EVALUATIONS {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * acc;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(xm) };
        fb = f(b);
    }
    Err(Error::Convergence(format!(
        "Brent solver: maximum number of function evaluations ({MAX_EVALUATIONS}) exceeded"
    )))
}

/// Brent's method started from `guess`: the bracket `[guess − step,
/// guess + step]` is grown geometrically until it contains a sign change.
pub fn brent_from_guess<F>(f: F, accuracy: Real, guess: Real, step: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let mut x_min = guess - step;
    let mut x_max = guess + step;
    let mut f_min = f(x_min);
    let mut f_max = f(x_max);
    for _ in 0..MAX_EVALUATIONS {
        if f_min * f_max <= 0.0 {
            return brent_bracketed(&f, x_min, f_min, x_max, f_max, accuracy);
        }
        if f_min.abs() < f_max.abs() {
            x_min += GROWTH_FACTOR * (x_min - x_max);
            f_min = f(x_min);
        } else {
            x_max += GROWTH_FACTOR * (x_max - x_min);
            f_max = f(x_max);
        }
    }
    Err(Error::Convergence(format!(
        "unable to bracket root in {MAX_EVALUATIONS} function evaluations \
         (last bracket [{x_min}, {x_max}])"
    )))
}

// ── Bisection ────────────────────────────────────────────────────────────────

/// Plain bisection on `[x_min, x_max]`.
pub fn bisection<F>(f: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let mut a = x_min;
    let mut b = x_max;
    let fa = f(a);
    let fb = f(b);

    if fa * fb > 0.0 {
        return Err(Error::Precondition(format!(
            "root not bracketed: f({a}) = {fa}, f({b}) = {fb}"
        )));
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    let rising = fa < 0.0;

    for _ in 0..200 {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 || 0.5 * (b - a).abs() < acc {
            return Ok(mid);
        }
        if (fm < 0.0) == rising {
            a = mid;
        } else {
            b = mid;
        }
    }
    Err(Error::Convergence(
        "bisection: maximum number of iterations exceeded".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn brent_finds_sqrt2() {
        let root = brent(|x| x * x - 2.0, 0.0, 2.0, 1e-12).unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-11);
    }

    #[test]
    fn brent_requires_bracket() {
        assert!(brent(|x| x * x + 1.0, -1.0, 1.0, 1e-10).is_err());
    }

    #[test]
    fn brent_from_guess_expands_bracket() {
        let root = brent_from_guess(|x| (x - 7.5).powi(3), 1e-10, 0.0, 0.01).unwrap();
        assert_abs_diff_eq!(root, 7.5, epsilon = 1e-6);
    }

    #[test]
    fn bisection_cosine() {
        let root = bisection(|x: Real| x.cos(), 0.0, 3.0, 1e-12).unwrap();
        assert_abs_diff_eq!(root, std::f64::consts::FRAC_PI_2, epsilon = 1e-11);
    }
}
