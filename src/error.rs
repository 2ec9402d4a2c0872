//! Error types for u-calculus.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by root finding, quadrature, differentiation and the
/// special-function kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An iterative or adaptive process exhausted its budget without
    /// meeting the requested tolerance.
    #[error("{operation} failed to converge within the iteration budget")]
    NonConvergence {
        /// The operation that gave up
        operation: &'static str,
    },

    /// An input violates a documented domain constraint.
    #[error("Argument '{arg}' = {value} is out of range: {reason}")]
    OutOfRange {
        /// The argument name
        arg: &'static str,
        /// The offending value
        value: f64,
        /// Description of the valid domain
        reason: &'static str,
    },

    /// Structurally malformed input (empty stencil, unsupported rule size, ...).
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    pub(crate) fn non_convergence(operation: &'static str) -> Self {
        Error::NonConvergence { operation }
    }

    pub(crate) fn invalid(arg: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
