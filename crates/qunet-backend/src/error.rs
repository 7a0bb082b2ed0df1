//! Error types for dense tensor and backend operations

use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur in dense tensor and backend operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Flat data length does not match the requested shape
    #[error("Shape mismatch: {len} elements cannot form shape {dims:?}")]
    ShapeMismatch {
        /// Number of elements supplied
        len: usize,
        /// Requested dimensions
        dims: Vec<usize>,
    },

    /// Reshape would change the number of elements
    #[error("Reshape size mismatch: cannot reshape {from:?} into {to:?}")]
    ReshapeMismatch {
        /// Original dimensions
        from: Vec<usize>,
        /// Requested dimensions
        to: Vec<usize>,
    },

    /// Axis permutation is not a permutation of `0..rank`
    #[error("Invalid permutation {perm:?} for rank {rank}")]
    InvalidPermutation {
        /// The offending permutation
        perm: Vec<usize>,
        /// Rank of the tensor being permuted
        rank: usize,
    },

    /// Axis index outside the tensor rank
    #[error("Axis {axis} out of range for rank {rank}")]
    AxisOutOfRange {
        /// The offending axis
        axis: usize,
        /// Rank of the tensor
        rank: usize,
    },

    /// Contracted or traced axes have different extents
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Extent on the left operand
        left: usize,
        /// Extent on the right operand
        right: usize,
    },

    /// Operation expects a rank-2 tensor
    #[error("Expected a matrix, got a tensor of shape {dims:?}")]
    NotAMatrix {
        /// Dimensions of the tensor that was supplied
        dims: Vec<usize>,
    },

    /// Operation expects a square matrix
    #[error("Expected a square matrix, got {rows}x{cols}")]
    NonSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// Probability vector cannot drive categorical sampling
    #[error("Invalid probability vector: {message}")]
    InvalidProbabilities {
        /// Description of the problem
        message: String,
    },
}
