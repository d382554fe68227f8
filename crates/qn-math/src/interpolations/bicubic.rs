//! Bicubic spline on a rectangular grid.
//!
//! One natural spline per `y` row interpolates along `x`; at query time the
//! row results are themselves splined along `y`. Mixed and second
//! derivatives follow by differentiating either stage.

use qn_core::{ensure, errors::Result, Real};

use super::{check_nodes, Interpolation1D, NaturalCubicSpline};

/// Spline-of-splines interpolation of `z(x, y)`.
///
/// `z` is row-major with `x` running fastest: `z[j * nx + i] = f(xs[i], ys[j])`.
#[derive(Debug, Clone)]
pub struct BicubicSpline {
    xs: Vec<Real>,
    ys: Vec<Real>,
    rows: Vec<NaturalCubicSpline>,
}

impl BicubicSpline {
    /// Build the spline; both axes need at least two strictly increasing nodes.
    pub fn new(xs: &[Real], ys: &[Real], z: &[Real]) -> Result<Self> {
        let nx = xs.len();
        let ny = ys.len();
        ensure!(
            z.len() == nx * ny,
            "z has {} values, expected {nx}×{ny}",
            z.len()
        );
        check_nodes(ys, ys, 2)?;
        let rows = (0..ny)
            .map(|j| NaturalCubicSpline::new(xs, &z[j * nx..(j + 1) * nx]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            rows,
        })
    }

    fn column<F>(&self, f: F) -> NaturalCubicSpline
    where
        F: Fn(&NaturalCubicSpline) -> Real,
    {
        let values: Vec<Real> = self.rows.iter().map(f).collect();
        NaturalCubicSpline::from_checked_nodes(&self.ys, &values)
    }

    /// Value at `(x, y)`.
    pub fn value(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.value(x)).value(y)
    }

    /// `∂f/∂x` at `(x, y)`.
    pub fn derivative_x(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.derivative(x)).value(y)
    }

    /// `∂²f/∂x²` at `(x, y)`.
    pub fn second_derivative_x(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.second_derivative(x)).value(y)
    }

    /// `∂f/∂y` at `(x, y)`.
    pub fn derivative_y(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.value(x)).derivative(y)
    }

    /// `∂²f/∂y²` at `(x, y)`.
    pub fn second_derivative_y(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.value(x)).second_derivative(y)
    }

    /// `∂²f/∂x∂y` at `(x, y)`.
    pub fn derivative_xy(&self, x: Real, y: Real) -> Real {
        self.column(|r| r.derivative(x)).derivative(y)
    }

    /// Return `true` if `(x, y)` lies inside the grid.
    pub fn is_in_range(&self, x: Real, y: Real) -> bool {
        x >= self.xs[0]
            && x <= self.xs[self.xs.len() - 1]
            && y >= self.ys[0]
            && y <= self.ys[self.ys.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bilinear_surface_is_exact() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 0.5, 1.0];
        let mut z = Vec::new();
        for y in ys {
            for x in xs {
                z.push(1.0 + 2.0 * x - y + 0.5 * x * y);
            }
        }
        let s = BicubicSpline::new(&xs, &ys, &z).unwrap();
        let (x, y) = (1.7, 0.3);
        assert_abs_diff_eq!(s.value(x, y), 1.0 + 2.0 * x - y + 0.5 * x * y, epsilon = 1e-12);
        assert_abs_diff_eq!(s.derivative_x(x, y), 2.0 + 0.5 * y, epsilon = 1e-12);
        assert_abs_diff_eq!(s.derivative_y(x, y), -1.0 + 0.5 * x, epsilon = 1e-12);
        assert_abs_diff_eq!(s.derivative_xy(x, y), 0.5, epsilon = 1e-12);
        assert!(s.is_in_range(x, y));
        assert!(!s.is_in_range(3.5, y));
    }

    #[test]
    fn rejects_wrong_size() {
        assert!(BicubicSpline::new(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
