//! Decompositions and matrix square roots.
//!
//! Market models need a pseudo-root `A` of each step's covariance
//! (`A Aᵀ ≈ C`), possibly with fewer columns than rows. The spectral
//! routines here sort eigenvalues in decreasing order so that truncating
//! columns keeps the principal components.

use crate::array::Array;
use crate::matrix::Matrix;
use qn_core::{ensure, errors::Error, errors::Result, Real};

/// How to repair a matrix that is not positive semi-definite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalvagingAlgorithm {
    /// Fail on negative eigenvalues.
    None,
    /// Floor negative eigenvalues at zero and renormalise the rows of the
    /// root to the original diagonal.
    #[default]
    Spectral,
}

/// Cholesky decomposition of a symmetric positive-definite matrix.
///
/// Returns the lower-triangular factor `L` such that `A = L Lᵀ`.
pub fn cholesky_decomposition(m: &Matrix) -> Result<Matrix> {
    ensure!(m.is_square(), "matrix must be square, got {}×{}", m.rows(), m.cols());
    match m.inner().clone().cholesky() {
        Some(chol) => Ok(Matrix::from(chol.l())),
        None => Err(Error::Runtime(
            "Cholesky decomposition failed: matrix is not positive definite".into(),
        )),
    }
}

/// Eigen-decomposition of a symmetric matrix.
///
/// Eigenvalues are returned in decreasing order; column `j` of the second
/// result is the eigenvector of eigenvalue `j`.
pub fn symmetric_eigen(m: &Matrix) -> Result<(Array, Matrix)> {
    ensure!(m.is_square(), "matrix must be square, got {}×{}", m.rows(), m.cols());
    let n = m.rows();
    let eigen = m.inner().clone().symmetric_eigen();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    let values = Array::from_fn(n, |j| eigen.eigenvalues[order[j]]);
    let vectors = Matrix::from_fn(n, n, |i, j| eigen.eigenvectors[(i, order[j])]);
    Ok((values, vectors))
}

fn salvage(eigenvalues: &mut Array, salvaging: SalvagingAlgorithm) -> Result<()> {
    let n = eigenvalues.size();
    match salvaging {
        SalvagingAlgorithm::None => {
            ensure!(
                n == 0 || eigenvalues[n - 1] >= -1e-16,
                "negative eigenvalue(s) ({:e})",
                eigenvalues[n - 1]
            );
        }
        SalvagingAlgorithm::Spectral => eigenvalues.apply_mut(|e| *e = e.max(0.0)),
    }
    Ok(())
}

/// Rescale each row of `pseudo` so that `(pseudo pseudoᵀ)_ii = m_ii`.
fn normalize_pseudo_root(m: &Matrix, pseudo: &mut Matrix) {
    for i in 0..pseudo.rows() {
        let norm: Real = (0..pseudo.cols()).map(|j| pseudo[(i, j)].powi(2)).sum();
        if norm > 0.0 {
            let adj = (m[(i, i)] / norm).sqrt();
            for j in 0..pseudo.cols() {
                pseudo[(i, j)] *= adj;
            }
        }
    }
}

/// Spectral pseudo square root `S` with `S Sᵀ ≈ m`.
pub fn pseudo_sqrt(m: &Matrix, salvaging: SalvagingAlgorithm) -> Result<Matrix> {
    let (mut values, vectors) = symmetric_eigen(m)?;
    salvage(&mut values, salvaging)?;
    let n = values.size();
    let mut root = Matrix::from_fn(n, n, |i, j| vectors[(i, j)] * values[j].max(0.0).sqrt());
    if salvaging == SalvagingAlgorithm::Spectral {
        normalize_pseudo_root(m, &mut root);
    }
    Ok(root)
}

/// Rank-reduced pseudo square root.
///
/// Keeps the smallest number of principal components whose eigenvalues
/// add up to at least `component_retained_percentage` of the trace (and at
/// least one), capped at `max_rank`. Returns the `n × k` root, with rows
/// renormalised to the diagonal of `m`, and the fraction of variance the
/// retained components explain before renormalisation.
pub fn rank_reduced_sqrt(
    m: &Matrix,
    max_rank: usize,
    component_retained_percentage: Real,
    salvaging: SalvagingAlgorithm,
) -> Result<(Matrix, Real)> {
    ensure!(
        component_retained_percentage > 0.0,
        "no eigenvalues retained"
    );
    ensure!(
        component_retained_percentage <= 1.0,
        "percentage to be retained > 100%"
    );
    ensure!(max_rank >= 1, "max rank required < 1");

    let (mut values, vectors) = symmetric_eigen(m)?;
    salvage(&mut values, salvaging)?;
    let n = values.size();
    let total = values.sum();

    let mut enough = component_retained_percentage * total;
    if component_retained_percentage == 1.0 {
        // rounding might otherwise discard the last factor
        enough *= 1.1;
    }
    let mut components = values[0];
    let mut retained = 1;
    while components < enough && retained < n {
        components += values[retained];
        retained += 1;
    }
    let retained = retained.min(max_rank);
    let explained: Real = (0..retained).map(|j| values[j]).sum();

    let mut root = Matrix::from_fn(n, retained, |i, j| vectors[(i, j)] * values[j].sqrt());
    normalize_pseudo_root(m, &mut root);
    let fraction = if total > 0.0 { explained / total } else { 1.0 };
    Ok((root, fraction))
}

/// Covariance `C_ij = σ_i ρ_ij σ_j`.
pub fn get_covariance(volatilities: &[Real], correlation: &Matrix) -> Result<Matrix> {
    let n = volatilities.len();
    ensure!(
        correlation.rows() == n && correlation.cols() == n,
        "correlation matrix must be {n}×{n}, got {}×{}",
        correlation.rows(),
        correlation.cols()
    );
    Ok(Matrix::from_fn(n, n, |i, j| {
        volatilities[i] * correlation[(i, j)] * volatilities[j]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn correlation(n: usize, beta: Real) -> Matrix {
        Matrix::from_fn(n, n, |i, j| (-beta * (i as Real - j as Real).abs()).exp())
    }

    #[test]
    fn cholesky_reconstructs() {
        let m = Matrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 10.0]);
        let l = cholesky_decomposition(&m).unwrap();
        let back = &l * &l.transpose();
        assert!(back.max_abs_diff(&m) < 1e-12);
        let bad = Matrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, 1.0]);
        assert!(cholesky_decomposition(&bad).is_err());
    }

    #[test]
    fn eigenvalues_decreasing() {
        let m = Matrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 1.0]);
        let (values, vectors) = symmetric_eigen(&m).unwrap();
        assert_eq!(values.as_slice(), &[5.0, 2.0, 1.0]);
        assert_abs_diff_eq!(vectors[(1, 0)].abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pseudo_sqrt_reconstructs_correlation() {
        let m = correlation(5, 0.1);
        let s = pseudo_sqrt(&m, SalvagingAlgorithm::None).unwrap();
        assert!((&s * &s.transpose()).max_abs_diff(&m) < 1e-10);
    }

    #[test]
    fn full_rank_reduction_is_exact() {
        let m = correlation(4, 0.3);
        let (root, fraction) = rank_reduced_sqrt(&m, 4, 1.0, SalvagingAlgorithm::None).unwrap();
        assert_eq!(root.cols(), 4);
        assert_abs_diff_eq!(fraction, 1.0, epsilon = 1e-12);
        assert!((&root * &root.transpose()).max_abs_diff(&m) < 1e-10);
    }

    #[test]
    fn reduced_root_keeps_unit_diagonal() {
        let m = correlation(6, 0.05);
        let (root, fraction) = rank_reduced_sqrt(&m, 2, 1.0, SalvagingAlgorithm::Spectral).unwrap();
        assert_eq!(root.cols(), 2);
        assert!(fraction > 0.9 && fraction < 1.0);
        let back = &root * &root.transpose();
        for i in 0..6 {
            assert_abs_diff_eq!(back[(i, i)], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn covariance_from_vols() {
        let corr = Matrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let cov = get_covariance(&[0.2, 0.3], &corr).unwrap();
        assert_abs_diff_eq!(cov[(0, 1)], 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(cov[(1, 1)], 0.09, epsilon = 1e-15);
    }
}
