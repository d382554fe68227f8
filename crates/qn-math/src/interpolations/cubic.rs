//! Natural cubic spline.

use qn_core::{errors::Result, Real};

use super::{check_nodes, locate, Interpolation1D};

/// C² cubic spline with zero second derivative at both ends.
///
/// The node second derivatives `M_i` come from the usual tridiagonal
/// system, solved by forward elimination and back substitution.
#[derive(Debug, Clone)]
pub struct NaturalCubicSpline {
    xs: Vec<Real>,
    ys: Vec<Real>,
    m: Vec<Real>,
}

impl NaturalCubicSpline {
    /// Build a natural spline through `(xs, ys)`; needs at least 2 points.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        check_nodes(xs, ys, 2)?;
        Ok(Self::from_checked_nodes(xs, ys))
    }

    /// Build from nodes already known to be valid.
    pub(super) fn from_checked_nodes(xs: &[Real], ys: &[Real]) -> Self {
        let n = xs.len();
        let mut m = vec![0.0; n];
        if n > 2 {
            let h: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
            // interior unknowns M_1 .. M_{n-2}
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut upper = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for j in 0..k {
                let i = j + 1;
                diag[j] = (h[i - 1] + h[i]) / 3.0;
                upper[j] = h[i] / 6.0;
                rhs[j] = (ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1];
            }
            // lower[j] = h[j] / 6 couples M_j with M_{j+1}
            for j in 1..k {
                let w = (h[j] / 6.0) / diag[j - 1];
                diag[j] -= w * upper[j - 1];
                rhs[j] -= w * rhs[j - 1];
            }
            m[k] = rhs[k - 1] / diag[k - 1];
            for j in (0..k - 1).rev() {
                m[j + 1] = (rhs[j] - upper[j] * m[j + 2]) / diag[j];
            }
        }
        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        }
    }

    fn segment(&self, x: Real) -> (usize, Real, Real, Real) {
        let i = locate(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        (i, h, a, b)
    }
}

impl Interpolation1D for NaturalCubicSpline {
    fn value(&self, x: Real) -> Real {
        let (i, h, a, b) = self.segment(x);
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }

    fn derivative(&self, x: Real) -> Real {
        let (i, h, a, b) = self.segment(x);
        (self.ys[i + 1] - self.ys[i]) / h - (3.0 * a * a - 1.0) / 6.0 * h * self.m[i]
            + (3.0 * b * b - 1.0) / 6.0 * h * self.m[i + 1]
    }

    fn second_derivative(&self, x: Real) -> Real {
        let (i, _, a, b) = self.segment(x);
        a * self.m[i] + b * self.m[i + 1]
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn passes_through_nodes() {
        let xs = [0.0, 0.5, 1.5, 2.0, 3.0];
        let ys = [1.0, -1.0, 2.0, 0.5, 0.0];
        let s = NaturalCubicSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(s.value(*x), *y, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(s.second_derivative(0.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.second_derivative(3.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn reproduces_linear_data() {
        let xs = [0.0, 1.0, 3.0, 4.0];
        let ys: Vec<Real> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let s = NaturalCubicSpline::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(s.value(2.2), 3.4, epsilon = 1e-12);
        assert_abs_diff_eq!(s.derivative(2.2), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn smooth_function_derivatives() {
        let xs: Vec<Real> = (0..=100).map(|i| i as Real * 0.05).collect();
        let ys: Vec<Real> = xs.iter().map(|x| x.sin()).collect();
        let s = NaturalCubicSpline::new(&xs, &ys).unwrap();
        let x = 2.37;
        assert_abs_diff_eq!(s.value(x), x.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(s.derivative(x), x.cos(), epsilon = 1e-4);
        assert_abs_diff_eq!(s.second_derivative(x), -x.sin(), epsilon = 1e-2);
    }
}
