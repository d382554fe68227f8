//! Boundary conditions applied around every operator application and
//! every implicit solve.

use super::mesher_composite::FdmMesher;
use super::operators::FdmLinearOpComposite;
use qn_core::{Real, Size, Time};
use qn_math::Array;
use std::sync::Arc;

/// Hooks called by the schemes around operator applications and solves.
///
/// Every hook defaults to doing nothing.
pub trait BoundaryCondition: std::fmt::Debug + Send + Sync {
    /// Called at the start of each step with the time being stepped to.
    fn set_time(&mut self, _t: Time) {}

    /// Before `op` is applied to the values.
    fn apply_before_applying(&self, _op: &dyn FdmLinearOpComposite) {}

    /// After the operator has been applied; `values` is the result.
    fn apply_after_applying(&self, _values: &mut Array) {}

    /// Before an implicit solve with `op`; `rhs` is the right-hand side.
    fn apply_before_solving(&self, _op: &dyn FdmLinearOpComposite, _rhs: &mut Array) {}

    /// After an implicit solve; `values` is the solution.
    fn apply_after_solving(&self, _values: &mut Array) {}
}

/// Which end of a direction a boundary sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Smallest coordinate.
    Lower,
    /// Largest coordinate.
    Upper,
}

/// Fixes the values on one side of one direction to a constant.
#[derive(Debug, Clone)]
pub struct FdmDirichletBoundary {
    value: Real,
    indices: Vec<Size>,
    x_extreme: Real,
}

impl FdmDirichletBoundary {
    /// Dirichlet condition `V = value` on `side` of `direction`.
    pub fn new(mesher: Arc<dyn FdmMesher>, value: Real, direction: usize, side: Side) -> Self {
        let layout = mesher.layout();
        let edge = match side {
            Side::Lower => 0,
            Side::Upper => layout.dim()[direction] - 1,
        };
        let mut indices = Vec::new();
        let mut x_extreme = Real::NAN;
        for iter in layout.iter() {
            if iter.coordinates()[direction] == edge {
                if indices.is_empty() {
                    x_extreme = mesher.location(&iter, direction);
                }
                indices.push(iter.index());
            }
        }
        Self {
            value,
            indices,
            x_extreme,
        }
    }

    /// Grid coordinate of the boundary.
    pub fn x_extreme(&self) -> Real {
        self.x_extreme
    }

    /// The prescribed value.
    pub fn value(&self) -> Real {
        self.value
    }

    fn fix(&self, values: &mut Array) {
        for &i in &self.indices {
            values[i] = self.value;
        }
    }
}

impl BoundaryCondition for FdmDirichletBoundary {
    fn apply_after_applying(&self, values: &mut Array) {
        self.fix(values);
    }

    fn apply_before_solving(&self, _op: &dyn FdmLinearOpComposite, rhs: &mut Array) {
        self.fix(rhs);
    }

    fn apply_after_solving(&self, values: &mut Array) {
        self.fix(values);
    }
}

/// Ordered collection of boundary conditions, applied in insertion order.
#[derive(Debug, Default)]
pub struct FdmBoundaryConditionSet {
    conditions: Vec<Box<dyn BoundaryCondition>>,
}

impl FdmBoundaryConditionSet {
    /// Empty set: natural boundaries from the one-sided operator stencils.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `condition`.
    pub fn push(&mut self, condition: impl BoundaryCondition + 'static) {
        self.conditions.push(Box::new(condition));
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// `true` without conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Forward `set_time` to every condition.
    pub fn set_time(&mut self, t: Time) {
        self.conditions.iter_mut().for_each(|c| c.set_time(t));
    }

    /// Forward `apply_before_applying` to every condition.
    pub fn apply_before_applying(&self, op: &dyn FdmLinearOpComposite) {
        self.conditions.iter().for_each(|c| c.apply_before_applying(op));
    }

    /// Forward `apply_after_applying` to every condition.
    pub fn apply_after_applying(&self, values: &mut Array) {
        self.conditions.iter().for_each(|c| c.apply_after_applying(values));
    }

    /// Forward `apply_before_solving` to every condition.
    pub fn apply_before_solving(&self, op: &dyn FdmLinearOpComposite, rhs: &mut Array) {
        self.conditions.iter().for_each(|c| c.apply_before_solving(op, rhs));
    }

    /// Forward `apply_after_solving` to every condition.
    pub fn apply_after_solving(&self, values: &mut Array) {
        self.conditions.iter().for_each(|c| c.apply_after_solving(values));
    }
}

impl FromIterator<Box<dyn BoundaryCondition>> for FdmBoundaryConditionSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn BoundaryCondition>>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{FdmMesherComposite, Uniform1dMesher};

    #[test]
    fn dirichlet_fixes_one_edge_of_a_plane() {
        let mesher: Arc<dyn FdmMesher> = Arc::new(FdmMesherComposite::from_2d(
            Uniform1dMesher::new(0.0, 1.0, 4).unwrap(),
            Uniform1dMesher::new(-1.0, 1.0, 3).unwrap(),
        ));
        let mut set = FdmBoundaryConditionSet::new();
        let upper = FdmDirichletBoundary::new(Arc::clone(&mesher), 7.0, 1, Side::Upper);
        assert_eq!(upper.x_extreme(), 1.0);
        set.push(upper);
        set.push(FdmDirichletBoundary::new(Arc::clone(&mesher), -1.0, 0, Side::Lower));
        assert_eq!(set.len(), 2);

        let mut values = Array::zeros(12);
        set.apply_after_solving(&mut values);
        for it in mesher.layout().iter() {
            let c = it.coordinates();
            let expected = if c[0] == 0 {
                -1.0
            } else if c[1] == 2 {
                7.0
            } else {
                0.0
            };
            assert_eq!(values[it.index()], expected);
        }
    }
}
