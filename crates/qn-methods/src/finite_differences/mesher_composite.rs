//! Multi-dimensional meshers.

use super::layout::{FdmLinearOpIterator, FdmLinearOpLayout};
use super::meshers::Fdm1dMesher;
use qn_core::{ensure, errors::Result, Real};
use qn_math::Array;

/// Grid locations of a finite-difference problem.
pub trait FdmMesher: std::fmt::Debug + Send + Sync {
    /// Index layout of the grid.
    fn layout(&self) -> &FdmLinearOpLayout;

    /// Distance to the next point along `direction`.
    fn dplus(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real;

    /// Distance to the previous point along `direction`.
    fn dminus(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real;

    /// Coordinate along `direction` of the point at `iter`.
    fn location(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real;

    /// Coordinate along `direction` of every grid point, in index order.
    fn locations(&self, direction: usize) -> Array {
        let mut values = Array::zeros(self.layout().size());
        for iter in self.layout().iter() {
            values[iter.index()] = self.location(&iter, direction);
        }
        values
    }
}

/// Tensor product of one-dimensional meshers.
#[derive(Debug, Clone)]
pub struct FdmMesherComposite {
    layout: FdmLinearOpLayout,
    meshers: Vec<Fdm1dMesher>,
}

impl FdmMesherComposite {
    /// Product of `meshers`; the first one runs fastest in the layout.
    pub fn new(meshers: Vec<Fdm1dMesher>) -> Result<Self> {
        ensure!(!meshers.is_empty(), "at least one mesher required");
        let layout = FdmLinearOpLayout::new(meshers.iter().map(Fdm1dMesher::size).collect());
        Ok(Self { layout, meshers })
    }

    /// Single-direction mesher.
    pub fn from_1d(mesher: impl Into<Fdm1dMesher>) -> Self {
        let m = mesher.into();
        Self {
            layout: FdmLinearOpLayout::new(vec![m.size()]),
            meshers: vec![m],
        }
    }

    /// Two-direction mesher.
    pub fn from_2d(m1: impl Into<Fdm1dMesher>, m2: impl Into<Fdm1dMesher>) -> Self {
        let (m1, m2) = (m1.into(), m2.into());
        Self {
            layout: FdmLinearOpLayout::new(vec![m1.size(), m2.size()]),
            meshers: vec![m1, m2],
        }
    }

    /// The one-dimensional components.
    pub fn meshers(&self) -> &[Fdm1dMesher] {
        &self.meshers
    }
}

impl FdmMesher for FdmMesherComposite {
    fn layout(&self) -> &FdmLinearOpLayout {
        &self.layout
    }

    fn dplus(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real {
        self.meshers[direction].dplus(iter.coordinates()[direction])
    }

    fn dminus(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real {
        self.meshers[direction].dminus(iter.coordinates()[direction])
    }

    fn location(&self, iter: &FdmLinearOpIterator, direction: usize) -> Real {
        self.meshers[direction].location(iter.coordinates()[direction])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::meshers::Uniform1dMesher;

    #[test]
    fn locations_follow_the_layout() {
        let m = FdmMesherComposite::from_2d(
            Uniform1dMesher::new(0.0, 2.0, 3).unwrap(),
            Uniform1dMesher::new(10.0, 11.0, 2).unwrap(),
        );
        assert_eq!(m.layout().size(), 6);
        assert_eq!(m.locations(0).to_vec(), vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(m.locations(1).to_vec(), vec![10.0, 10.0, 10.0, 11.0, 11.0, 11.0]);
        let it = m.layout().iter().nth(4).unwrap();
        assert_eq!(m.dplus(&it, 0), 1.0);
        assert!(m.dplus(&it, 1).is_nan());
    }
}
