//! Error types for the tensor-network substrate

use crate::network::{EdgeId, NodeId};
use qunet_backend::BackendError;
use thiserror::Error;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors that can occur while building or contracting a network
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Node handle not present in this network
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Edge handle not present in this network (or already retired)
    #[error("Unknown edge {0:?}")]
    UnknownEdge(EdgeId),

    /// Operation requires a dangling edge
    #[error("Edge {0:?} is not dangling")]
    EdgeNotDangling(EdgeId),

    /// Axis index outside the node rank
    #[error("Axis {axis} out of range for node {node:?} of rank {rank}")]
    AxisOutOfRange {
        /// The node being indexed
        node: NodeId,
        /// The offending axis
        axis: usize,
        /// Rank of the node
        rank: usize,
    },

    /// Edges joined by `connect` have different dimensions
    #[error("Cannot connect edges of dimension {left} and {right}")]
    DimensionMismatch {
        /// Dimension of the first edge
        left: usize,
        /// Dimension of the second edge
        right: usize,
    },

    /// Contraction of a node set failed
    #[error("Contraction failed: {message}")]
    Contraction {
        /// Description of the failure
        message: String,
    },

    /// Error raised by the dense backend
    #[error(transparent)]
    Backend(#[from] BackendError),
}
