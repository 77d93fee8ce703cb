//! Error types for playground-vector.

use thiserror::Error;

/// Result type for playground-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in playground-vector operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (e.g., empty, contains NaN).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Requested result count was zero.
    #[error("Invalid k: {0}, must be greater than 0")]
    InvalidK(usize),
}
