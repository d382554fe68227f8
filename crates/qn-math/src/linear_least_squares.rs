//! General linear least-squares regression.
//!
//! Fits `y ≈ Σ_j β_j φ_j(x)` through an SVD of the design matrix, with
//! small singular values discarded. Longstaff-Schwartz pricing regresses
//! continuation values on polynomial basis functions this way.

use crate::array::Array;
use crate::matrix::Matrix;
use qn_core::{ensure, errors::Result, Real};

/// Result of a linear least-squares fit.
#[derive(Debug, Clone)]
pub struct LinearLeastSquaresRegression {
    coefficients: Array,
    residuals: Array,
}

impl LinearLeastSquaresRegression {
    /// Fit `y` on `basis` functions evaluated at the points `x`.
    pub fn new<X, F>(x: &[X], y: &[Real], basis: &[F]) -> Result<Self>
    where
        F: Fn(&X) -> Real,
    {
        ensure!(
            x.len() == y.len(),
            "x and y must have the same length ({} vs {})",
            x.len(),
            y.len()
        );
        let a = Matrix::from_fn(x.len(), basis.len(), |i, j| basis[j](&x[i]));
        Self::from_design_matrix(&a, y)
    }

    /// Fit given a pre-built `n × m` design matrix.
    pub fn from_design_matrix(a: &Matrix, y: &[Real]) -> Result<Self> {
        let (n, m) = (a.rows(), a.cols());
        ensure!(m > 0, "no basis functions given");
        ensure!(y.len() == n, "y has {} entries, design matrix {} rows", y.len(), n);
        ensure!(n >= m, "{m} basis functions but only {n} observations");

        let svd = a.inner().clone().svd(true, true);
        let max_sv = svd.singular_values.iter().copied().fold(0.0, Real::max);
        let eps = n.max(m) as Real * f64::EPSILON * max_sv;
        let rhs = nalgebra::DVector::from_column_slice(y);
        let beta = svd
            .solve(&rhs, eps)
            .map_err(|e| qn_core::Error::Runtime(format!("least-squares solve failed: {e}")))?;
        let coefficients = Array::from(beta);
        let fitted = a.mul_vec(&coefficients);
        let residuals = Array::from_slice(y) - fitted;
        Ok(Self {
            coefficients,
            residuals,
        })
    }

    /// Fitted coefficients, one per basis function.
    pub fn coefficients(&self) -> &Array {
        &self.coefficients
    }

    /// Residuals `y − A β`.
    pub fn residuals(&self) -> &Array {
        &self.residuals
    }
}
