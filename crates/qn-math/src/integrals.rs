//! Simpson integration by successive trapezoid refinement.

use qn_core::{
    errors::{Error, Result},
    Real,
};

/// Integral of `f` over `[a, b]` with Simpson's rule.
///
/// Each iteration halves the trapezoid step; the Simpson estimate is the
/// Richardson extrapolation of two successive trapezoid sums. Converged
/// when two successive estimates differ by at most `accuracy`, after at
/// least five refinements.
pub fn simpson<F>(f: F, a: Real, b: Real, accuracy: Real, max_iterations: usize) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    if a == b {
        return Ok(0.0);
    }
    let mut n = 1usize;
    let mut trapezoid = 0.5 * (b - a) * (f(a) + f(b));
    let mut estimate = trapezoid;
    for i in 1..=max_iterations {
        // add the midpoints of the current intervals
        let dx = (b - a) / n as Real;
        let midpoints: Real = (0..n).map(|k| f(a + (k as Real + 0.5) * dx)).sum();
        let refined = 0.5 * (trapezoid + dx * midpoints);
        let next = (4.0 * refined - trapezoid) / 3.0;
        if (next - estimate).abs() <= accuracy && i > 5 {
            return Ok(next);
        }
        estimate = next;
        trapezoid = refined;
        n *= 2;
    }
    Err(Error::Convergence(format!(
        "simpson integration did not reach accuracy {accuracy} in {max_iterations} iterations"
    )))
}
