use crate::lattice::TimeGrid;
use qn_core::{Real, Time};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

// ─── Path ─────────────────────────────────────────────────────────────────────

/// One realisation of a scalar process on a time grid.
///
/// `values[i]` is the state at `time_grid.time(i)`; the first value is the
/// starting point of the process.
#[derive(Debug, Clone)]
pub struct Path {
    time_grid: Arc<TimeGrid>,
    values: Vec<Real>,
}

impl Path {
    /// A path of zeros on `time_grid`.
    pub fn new(time_grid: Arc<TimeGrid>) -> Self {
        let values = vec![0.0; time_grid.size()];
        Self { time_grid, values }
    }

    /// Number of points, including the starting point.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the path has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time of point `i`.
    pub fn time(&self, i: usize) -> Time {
        self.time_grid.time(i)
    }

    /// The underlying grid.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    /// Starting value.
    pub fn front(&self) -> Real {
        self.values[0]
    }

    /// Final value.
    pub fn back(&self) -> Real {
        self.values[self.values.len() - 1]
    }

    /// All values.
    pub fn values(&self) -> &[Real] {
        &self.values
    }
}

impl Index<usize> for Path {
    type Output = Real;

    fn index(&self, i: usize) -> &Real {
        &self.values[i]
    }
}

impl IndexMut<usize> for Path {
    fn index_mut(&mut self, i: usize) -> &mut Real {
        &mut self.values[i]
    }
}

// ─── MultiPath ────────────────────────────────────────────────────────────────

/// Correlated paths of the components of a multi-dimensional process, all
/// on the same grid.
#[derive(Debug, Clone)]
pub struct MultiPath {
    paths: Vec<Path>,
}

impl MultiPath {
    /// `assets` zero paths on `time_grid`.
    pub fn new(assets: usize, time_grid: Arc<TimeGrid>) -> Self {
        let paths = (0..assets).map(|_| Path::new(Arc::clone(&time_grid))).collect();
        Self { paths }
    }

    /// Number of components.
    pub fn asset_number(&self) -> usize {
        self.paths.len()
    }

    /// Number of points of each component path.
    pub fn path_size(&self) -> usize {
        self.paths.first().map_or(0, Path::len)
    }

    /// Iterate over the component paths.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }
}

impl Index<usize> for MultiPath {
    type Output = Path;

    fn index(&self, j: usize) -> &Path {
        &self.paths[j]
    }
}

impl IndexMut<usize> for MultiPath {
    fn index_mut(&mut self, j: usize) -> &mut Path {
        &mut self.paths[j]
    }
}

// ─── Sample ───────────────────────────────────────────────────────────────────

/// A drawn value together with its statistical weight.
#[derive(Debug, Clone)]
pub struct Sample<T> {
    /// The drawn value.
    pub value: T,
    /// Weight of the draw.
    pub weight: Real,
}
