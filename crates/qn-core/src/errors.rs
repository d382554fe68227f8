//! Error type for quantnum.
//!
//! Every fallible operation in the workspace returns [`Result`]. Input
//! validation goes through the [`ensure!`](crate::ensure) macro, internal
//! consistency checks after a computation through
//! [`ensure_post!`](crate::ensure_post), and unrecoverable numerical
//! failures through [`fail!`](crate::fail).

use thiserror::Error;

/// The error type used throughout quantnum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime failure.
    #[error("{0}")]
    Runtime(String),

    /// An input violated a documented precondition.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A computed result violated a postcondition.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// An argument was outside its admissible domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two containers that must agree in size do not.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The size that was required.
        expected: usize,
        /// The size that was supplied.
        found: usize,
    },

    /// An iterative algorithm failed to converge.
    #[error("no convergence: {0}")]
    Convergence(String),

    /// The requested feature is not available for these inputs.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Shorthand `Result` type used throughout quantnum.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return `Err(Error::Precondition(..))` unless `$cond` holds.
///
/// # Example
/// ```
/// use qn_core::ensure;
/// fn positive(x: f64) -> qn_core::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return `Err(Error::Postcondition(..))` unless `$cond` holds.
///
/// # Example
/// ```
/// use qn_core::ensure_post;
/// fn halve(x: f64) -> qn_core::Result<f64> {
///     let y = 0.5 * x;
///     ensure_post!(y.is_finite(), "result is not finite");
///     Ok(y)
/// }
/// assert!(halve(1.0).is_ok());
/// assert!(halve(f64::NAN).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return `Err(Error::Runtime(..))` immediately.
///
/// # Example
/// ```
/// use qn_core::fail;
/// fn never() -> qn_core::Result<()> {
///     fail!("unreachable state");
/// }
/// assert!(never().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

/// Check that a slice has the expected length.
pub fn check_size(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, found })
    }
}
