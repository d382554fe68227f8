//! The `Tree` trait shared by recombining trees.

use qn_core::Real;

/// A recombining tree approximating a one-dimensional process.
///
/// Column `i` holds the nodes at time-step `i`; node `index` of column `i`
/// branches into `branches()` nodes of column `i + 1`.
pub trait Tree: std::fmt::Debug + Send + Sync {
    /// Number of columns (time steps + 1).
    fn columns(&self) -> usize;

    /// Number of nodes in column `i`.
    fn size(&self, i: usize) -> usize;

    /// Value of the underlying at node `(i, index)`.
    fn underlying(&self, i: usize, index: usize) -> Real;

    /// Node of column `i + 1` reached from `(i, index)` through `branch`.
    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize;

    /// Transition probability from `(i, index)` through `branch`.
    fn probability(&self, i: usize, index: usize, branch: usize) -> Real;

    /// Number of branches leaving every node.
    fn branches(&self) -> usize;
}
