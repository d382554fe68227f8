//! 1-D and 2-D interpolation.
//!
//! # Overview
//!
//! - [`LinearInterpolation`] and [`LogLinearInterpolation`] for curves.
//! - [`NaturalCubicSpline`] with analytic first and second derivatives,
//!   used to read values and greeks off finite-difference grids.
//! - [`BicubicSpline`], a spline of splines on a rectangular grid.
//!
//! Evaluation outside `[x_min, x_max]` extrapolates with the first or last
//! segment; callers that must not extrapolate check `is_in_range`.

use qn_core::{ensure, errors::Result, Real};

mod bicubic;
mod cubic;

pub use bicubic::BicubicSpline;
pub use cubic::NaturalCubicSpline;

/// A 1D interpolation `f: R → R` through a set of known points.
pub trait Interpolation1D: std::fmt::Debug + Send + Sync {
    /// Value at `x`.
    fn value(&self, x: Real) -> Real;

    /// First derivative at `x`.
    fn derivative(&self, x: Real) -> Real;

    /// Second derivative at `x`.
    fn second_derivative(&self, x: Real) -> Real;

    /// Lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Index `i` of the segment `[xs[i], xs[i+1]]` containing `x`, clamped to
/// the first and last segments.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    xs.partition_point(|&xi| xi <= x) - 1
}

pub(crate) fn check_nodes(xs: &[Real], ys: &[Real], min_points: usize) -> Result<()> {
    ensure!(
        xs.len() >= min_points,
        "at least {min_points} points required, {} given",
        xs.len()
    );
    ensure!(
        xs.len() == ys.len(),
        "xs and ys must have the same length ({} vs {})",
        xs.len(),
        ys.len()
    );
    ensure!(
        xs.windows(2).all(|w| w[1] > w[0]),
        "xs must be strictly increasing"
    );
    Ok(())
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Piecewise-linear interpolation.
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Build from strictly increasing `xs` and matching `ys`.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        check_nodes(xs, ys, 2)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    fn slope(&self, i: usize) -> Real {
        (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }
}

impl Interpolation1D for LinearInterpolation {
    fn value(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        self.ys[i] + (x - self.xs[i]) * self.slope(i)
    }

    fn derivative(&self, x: Real) -> Real {
        self.slope(locate(&self.xs, x))
    }

    fn second_derivative(&self, _x: Real) -> Real {
        0.0
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

// ── Log-linear ────────────────────────────────────────────────────────────────

/// Linear interpolation of `ln y`; `y` must be positive.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolation {
    inner: LinearInterpolation,
}

impl LogLinearInterpolation {
    /// Build a log-linear interpolation.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ensure!(
            ys.iter().all(|&y| y > 0.0),
            "all y values must be positive for log-linear interpolation"
        );
        let log_ys: Vec<Real> = ys.iter().map(|&y| y.ln()).collect();
        Ok(Self {
            inner: LinearInterpolation::new(xs, &log_ys)?,
        })
    }
}

impl Interpolation1D for LogLinearInterpolation {
    fn value(&self, x: Real) -> Real {
        self.inner.value(x).exp()
    }

    fn derivative(&self, x: Real) -> Real {
        self.value(x) * self.inner.derivative(x)
    }

    fn second_derivative(&self, x: Real) -> Real {
        self.value(x) * self.inner.derivative(x).powi(2)
    }

    fn x_min(&self) -> Real {
        self.inner.x_min()
    }

    fn x_max(&self) -> Real {
        self.inner.x_max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_values_and_slopes() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert_abs_diff_eq!(interp.value(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.value(1.5), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.derivative(1.5), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.value(3.0), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn log_linear_is_exponential_between_nodes() {
        let interp = LogLinearInterpolation::new(&[0.0, 1.0], &[1.0, std::f64::consts::E]).unwrap();
        assert_abs_diff_eq!(interp.value(0.5), 0.5_f64.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(interp.derivative(0.5), 0.5_f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_unsorted_nodes() {
        assert!(LinearInterpolation::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
    }

    #[test]
    fn locate_segments() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&xs, -1.0), 0);
        assert_eq!(locate(&xs, 1.0), 1);
        assert_eq!(locate(&xs, 2.5), 2);
        assert_eq!(locate(&xs, 3.0), 2);
    }
}
