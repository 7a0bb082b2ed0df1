//! Error types for network operators and quantum-information functions

use crate::defaults::InvalidEpsError;
use qunet_backend::BackendError;
use qunet_network::NetworkError;
use thiserror::Error;

/// Result type for operator operations
pub type Result<T> = std::result::Result<T, QuantumError>;

/// Incompatibility between two ordered lists of subsystem dimensions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpaceMismatch {
    /// The lists have different lengths
    #[error("cannot connect {left} subsystems with {right} subsystems")]
    Length {
        /// Number of subsystems on the left
        left: usize,
        /// Number of subsystems on the right
        right: usize,
    },

    /// Dimensions differ at one position
    #[error("subsystem {index}: dimension {left} != {right}")]
    Subsystem {
        /// Position of the first mismatch
        index: usize,
        /// Dimension on the left
        left: usize,
        /// Dimension on the right
        right: usize,
    },
}

/// Errors that can occur in operator algebra and quantum-information functions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantumError {
    /// Subsystem spaces do not match
    #[error("Hilbert-space mismatch: {0}")]
    DimensionMismatch(#[from] SpaceMismatch),

    /// Declared out/in/ignored edges disagree with the network
    #[error("Invalid network: {message}")]
    InvalidNetwork {
        /// Description of the inconsistency
        message: String,
    },

    /// A scalar needs at least one reference node
    #[error("At least one reference node is required to specify a scalar")]
    MissingAnchor,

    /// Operation is undefined for the given operands
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of the invalid operation
        message: String,
    },

    /// Contraction did not reduce the network to a single node
    #[error("Contraction error: {message}")]
    ContractionError {
        /// Description of the failure
        message: String,
    },

    /// Argument combination has no meaning for the given state
    #[error("Not supported: {message}")]
    NotSupported {
        /// Description of the unsupported request
        message: String,
    },

    /// Argument out of range or malformed
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// Unusable eigenvalue regulariser
    #[error(transparent)]
    InvalidEps(#[from] InvalidEpsError),

    /// Error raised by the network substrate
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Error raised by the numeric backend
    #[error(transparent)]
    Backend(#[from] BackendError),
}
