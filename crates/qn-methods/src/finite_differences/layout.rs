//! Index layout of a tensor-product grid.
//!
//! A grid with dimensions `dim = [n0, n1, …]` is stored flat with the first
//! direction running fastest: `index = Σ c_k · spacing_k` with
//! `spacing_0 = 1` and `spacing_k = spacing_{k−1} · n_{k−1}`.

use qn_core::Size;

/// Flat layout of a multi-dimensional grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdmLinearOpLayout {
    dim: Vec<Size>,
    spacing: Vec<Size>,
    size: Size,
}

impl FdmLinearOpLayout {
    /// Layout for a grid with the given number of points per direction.
    pub fn new(dim: Vec<Size>) -> Self {
        let mut spacing = Vec::with_capacity(dim.len());
        let mut stride = 1;
        for &n in &dim {
            spacing.push(stride);
            stride *= n;
        }
        Self {
            size: stride,
            dim,
            spacing,
        }
    }

    /// Number of points per direction.
    pub fn dim(&self) -> &[Size] {
        &self.dim
    }

    /// Index stride of each direction.
    pub fn spacing(&self) -> &[Size] {
        &self.spacing
    }

    /// Total number of grid points.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Flat index of `coordinates`.
    pub fn index(&self, coordinates: &[Size]) -> Size {
        coordinates
            .iter()
            .zip(&self.spacing)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Coordinates of the flat `index`.
    pub fn coordinates(&self, mut index: Size) -> Vec<Size> {
        let mut coordinates = vec![0; self.dim.len()];
        for k in (0..self.dim.len()).rev() {
            coordinates[k] = index / self.spacing[k];
            index %= self.spacing[k];
        }
        coordinates
    }

    /// Iterator over every grid point in index order.
    pub fn iter(&self) -> FdmLinearOpIterator {
        FdmLinearOpIterator::new(self.dim.clone())
    }

    fn shifted(&self, coordinate: Size, direction: usize, offset: isize) -> Size {
        let n = self.dim[direction] as isize;
        let mut c = coordinate as isize + offset;
        // mirror at the boundaries
        if c < 0 {
            c = -c;
        } else if c >= n {
            c = 2 * (n - 1) - c;
        }
        c.clamp(0, n - 1) as Size
    }

    /// Index of the point `offset` steps away along `direction`, reflected
    /// back into the grid at the boundaries.
    pub fn neighbourhood(
        &self,
        iter: &FdmLinearOpIterator,
        direction: usize,
        offset: isize,
    ) -> Size {
        let coordinates = iter.coordinates();
        let c = coordinates[direction];
        let shifted = self.shifted(c, direction, offset);
        iter.index() + shifted * self.spacing[direction] - c * self.spacing[direction]
    }

    /// Index of the point shifted along two directions at once.
    pub fn neighbourhood2(
        &self,
        iter: &FdmLinearOpIterator,
        d1: usize,
        o1: isize,
        d2: usize,
        o2: isize,
    ) -> Size {
        let coordinates = iter.coordinates();
        let c1 = coordinates[d1];
        let c2 = coordinates[d2];
        let s1 = self.shifted(c1, d1, o1);
        let s2 = self.shifted(c2, d2, o2);
        iter.index() + s1 * self.spacing[d1] + s2 * self.spacing[d2]
            - c1 * self.spacing[d1]
            - c2 * self.spacing[d2]
    }
}

impl<'a> IntoIterator for &'a FdmLinearOpLayout {
    type Item = FdmLinearOpIterator;
    type IntoIter = FdmLinearOpIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Position on a grid: flat index plus coordinates.
///
/// As an [`Iterator`] it yields its own position and then advances, so
/// `for it in layout.iter()` visits every grid point once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdmLinearOpIterator {
    index: Size,
    dim: Vec<Size>,
    coordinates: Vec<Size>,
    done: bool,
}

impl FdmLinearOpIterator {
    /// Iterator at the origin of a grid with dimensions `dim`.
    pub fn new(dim: Vec<Size>) -> Self {
        let done = dim.iter().any(|&n| n == 0);
        Self {
            index: 0,
            coordinates: vec![0; dim.len()],
            dim,
            done,
        }
    }

    /// Flat index.
    pub fn index(&self) -> Size {
        self.index
    }

    /// Grid coordinates.
    pub fn coordinates(&self) -> &[Size] {
        &self.coordinates
    }

    /// Move to the next grid point in index order.
    pub fn increment(&mut self) {
        self.index += 1;
        for k in 0..self.dim.len() {
            self.coordinates[k] += 1;
            if self.coordinates[k] < self.dim[k] {
                return;
            }
            self.coordinates[k] = 0;
        }
        self.done = true;
    }
}

impl Iterator for FdmLinearOpIterator {
    type Item = FdmLinearOpIterator;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.clone();
        self.increment();
        Some(current)
    }
}
