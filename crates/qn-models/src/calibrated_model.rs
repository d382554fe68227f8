//! Model parameters and the [`CalibratedModel`] interface.

use qn_core::{ensure, errors::Result, Real};
use std::fmt;
use std::sync::Arc;

// ── Constraints ──────────────────────────────────────────────────────────────

/// Admissible values of a parameter.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Whether every entry of `values` is admissible.
    fn test(&self, values: &[Real]) -> bool;
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _values: &[Real]) -> bool {
        true
    }
}

/// Strictly positive values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, values: &[Real]) -> bool {
        values.iter().all(|&v| v > 0.0)
    }
}

/// Values in `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    /// Lower bound, inclusive.
    pub lower: Real,
    /// Upper bound, inclusive.
    pub upper: Real,
}

impl BoundaryConstraint {
    /// Constraint to `[lower, upper]`.
    pub fn new(lower: Real, upper: Real) -> Self {
        Self { lower, upper }
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, values: &[Real]) -> bool {
        values.iter().all(|&v| v >= self.lower && v <= self.upper)
    }
}

// ── Parameter ────────────────────────────────────────────────────────────────

/// A calibratable model parameter: one or more values under a constraint.
#[derive(Debug, Clone)]
pub struct Parameter {
    values: Vec<Real>,
    constraint: Arc<dyn Constraint>,
}

impl Parameter {
    /// Parameter with initial `values`.
    pub fn new(values: Vec<Real>, constraint: impl Constraint + 'static) -> Self {
        Self {
            values,
            constraint: Arc::new(constraint),
        }
    }

    /// Scalar parameter without constraint.
    pub fn constant(value: Real) -> Self {
        Self::new(vec![value], NoConstraint)
    }

    /// Scalar value.
    pub fn value(&self) -> Real {
        self.values[0]
    }

    /// All values.
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    /// Number of values.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Replace the values, which must satisfy the constraint.
    pub fn set_values(&mut self, values: &[Real]) -> Result<()> {
        ensure!(
            values.len() == self.values.len(),
            "parameter takes {} values, {} given",
            self.values.len(),
            values.len()
        );
        ensure!(
            self.constraint.test(values),
            "values {values:?} violate constraint {:?}",
            self.constraint
        );
        self.values.copy_from_slice(values);
        Ok(())
    }

    /// Whether the current values satisfy the constraint.
    pub fn is_valid(&self) -> bool {
        self.constraint.test(&self.values)
    }

    /// The constraint.
    pub fn constraint(&self) -> &dyn Constraint {
        self.constraint.as_ref()
    }
}

// ── CalibratedModel ──────────────────────────────────────────────────────────

/// A model described by a list of [`Parameter`]s.
pub trait CalibratedModel: fmt::Debug + Send + Sync {
    /// The parameters, in the model's canonical order.
    fn params(&self) -> &[Parameter];

    /// Set all parameter values from a flat vector, in the order of
    /// [`params`](Self::params).
    fn set_params(&mut self, values: &[Real]) -> Result<()>;

    /// All parameter values as one flat vector.
    fn flat_params(&self) -> Vec<Real> {
        self.params()
            .iter()
            .flat_map(|p| p.values().iter().copied())
            .collect()
    }
}

/// Apply `values` to `params` in order, checking the total length.
pub(crate) fn assign_flat(params: &mut [Parameter], values: &[Real]) -> Result<()> {
    let expected: usize = params.iter().map(Parameter::size).sum();
    ensure!(
        values.len() == expected,
        "model takes {expected} parameter values, {} given",
        values.len()
    );
    let mut offset = 0;
    for p in params.iter() {
        let chunk = &values[offset..offset + p.size()];
        ensure!(
            p.constraint.test(chunk),
            "values {chunk:?} violate constraint {:?}",
            p.constraint
        );
        offset += p.size();
    }
    offset = 0;
    for p in params.iter_mut() {
        let n = p.size();
        p.values.copy_from_slice(&values[offset..offset + n]);
        offset += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints_are_enforced_on_update() {
        let mut p = Parameter::new(vec![0.1], PositiveConstraint);
        assert!(p.is_valid());
        assert!(p.set_values(&[-0.1]).is_err());
        assert_eq!(p.value(), 0.1);
        p.set_values(&[0.3]).unwrap();
        assert_eq!(p.value(), 0.3);

        let mut rho = Parameter::new(vec![0.0], BoundaryConstraint::new(-1.0, 1.0));
        assert!(rho.set_values(&[1.5]).is_err());
        assert!(rho.set_values(&[0.0, 0.1]).is_err());
        assert!(Parameter::constant(-5.0).is_valid());
    }

    #[test]
    fn flat_assignment_walks_parameters_in_order() {
        let mut params = vec![
            Parameter::new(vec![1.0], PositiveConstraint),
            Parameter::new(vec![2.0, 3.0], NoConstraint),
        ];
        assign_flat(&mut params, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(params[1].values(), &[5.0, 6.0]);
        assert!(assign_flat(&mut params, &[1.0]).is_err());
    }
}
