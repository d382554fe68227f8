//! Krylov solvers for linear operators given as closures.
//!
//! Finite-difference operators are never assembled as matrices; the solver
//! only needs `x ↦ A x` and, optionally, an approximate inverse `r ↦ M⁻¹ r`.

use crate::array::Array;
use qn_core::{
    errors::{Error, Result},
    Real, Size,
};

/// Outcome of a converged iterative solve.
#[derive(Debug, Clone)]
pub struct BiCGStabResult {
    /// The solution.
    pub x: Array,
    /// Number of iterations performed.
    pub iterations: Size,
    /// Final relative residual `‖b − A x‖ / ‖b‖`.
    pub error: Real,
}

/// Solve `A x = b` with the preconditioned BiCGStab method.
///
/// Stops once the relative residual drops below `rel_tol`. Fails with
/// [`Error::Convergence`] after `max_iter` iterations or on breakdown.
pub fn bicgstab<A>(
    a: A,
    b: &Array,
    x0: Option<&Array>,
    rel_tol: Real,
    max_iter: Size,
    preconditioner: Option<&dyn Fn(&Array) -> Array>,
) -> Result<BiCGStabResult>
where
    A: Fn(&Array) -> Array,
{
    let n = b.size();
    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Ok(BiCGStabResult {
            x: Array::zeros(n),
            iterations: 0,
            error: 0.0,
        });
    }
    let precond = |r: &Array| match preconditioner {
        Some(m) => m(r),
        None => r.clone(),
    };

    let mut x = x0.cloned().unwrap_or_else(|| Array::zeros(n));
    let mut r = b - &a(&x);
    let r_tld = r.clone();
    let mut p = Array::zeros(n);
    let mut v = Array::zeros(n);
    let (mut omega, mut rho_tld, mut alpha) = (1.0, 1.0, 0.0);
    let mut error = r.norm() / b_norm;

    let mut i = 0;
    while i < max_iter && error >= rel_tol {
        let rho = r_tld.dot(&r);
        if rho == 0.0 || omega == 0.0 {
            break;
        }
        if i > 0 {
            let beta = (rho / rho_tld) * (alpha / omega);
            p.axpy(-omega, &v);
            p = &r + &(p * beta);
        } else {
            p = r.clone();
        }
        let p_tld = precond(&p);
        v = a(&p_tld);
        alpha = rho / r_tld.dot(&v);
        let s = &r - &(&v * alpha);
        if s.norm() < rel_tol * b_norm {
            x.axpy(alpha, &p_tld);
            error = s.norm() / b_norm;
            i += 1;
            break;
        }
        let s_tld = precond(&s);
        let t = a(&s_tld);
        omega = t.dot(&s) / t.dot(&t);
        x.axpy(alpha, &p_tld);
        x.axpy(omega, &s_tld);
        r = &s - &(&t * omega);
        error = r.norm() / b_norm;
        rho_tld = rho;
        i += 1;
    }

    if error >= rel_tol {
        return Err(Error::Convergence(format!(
            "BiCGStab: relative residual {error:e} after {i} iterations"
        )));
    }
    Ok(BiCGStabResult {
        x,
        iterations: i,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // tridiagonal (-1, 4, -1) applied without assembling a matrix
    fn apply(x: &Array) -> Array {
        let n = x.size();
        Array::from_fn(n, |i| {
            let mut y = 4.0 * x[i];
            if i > 0 {
                y -= x[i - 1];
            }
            if i + 1 < n {
                y -= x[i + 1];
            }
            y
        })
    }

    #[test]
    fn solves_diagonally_dominant_system() {
        let expected = Array::from_fn(20, |i| (i as Real * 0.3).sin());
        let b = apply(&expected);
        let res = bicgstab(apply, &b, None, 1e-12, 100, None).unwrap();
        for i in 0..20 {
            assert_abs_diff_eq!(res.x[i], expected[i], epsilon = 1e-9);
        }
        assert!(res.error < 1e-12);
    }

    #[test]
    fn jacobi_preconditioner_converges() {
        let b = Array::from_element(10, 1.0);
        let jacobi = |r: &Array| r / 4.0;
        let res = bicgstab(apply, &b, None, 1e-10, 100, Some(&jacobi)).unwrap();
        let back = apply(&res.x);
        assert!((&back - &b).norm() < 1e-9);
    }

    #[test]
    fn zero_rhs_gives_zero() {
        let res = bicgstab(apply, &Array::zeros(5), None, 1e-10, 10, None).unwrap();
        assert_eq!(res.iterations, 0);
        assert_eq!(res.x.norm(), 0.0);
    }

    #[test]
    fn too_few_iterations_fail() {
        let b = Array::from_fn(50, |i| i as Real);
        assert!(bicgstab(apply, &b, None, 1e-14, 1, None).is_err());
    }
}
