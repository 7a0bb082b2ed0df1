//! Tensor-network substrate for qunet.
//!
//! This crate provides:
//! - [`Network`]: arena of tensor nodes and edges addressed by stable
//!   handles ([`NodeId`], [`EdgeId`]), with connect, node removal, subgraph
//!   copies and reachability
//! - [`Contractor`]: reduction of a node set to a single node, and its
//!   default implementation [`GreedyContractor`]
//! - [`ContractionOptions`]: configuration of the contraction order

pub mod contract;
pub mod error;
pub mod network;
pub mod options;

pub use contract::{Contractor, GreedyContractor};
pub use error::{NetworkError, Result};
pub use network::{EdgeId, Network, NodeId, NodeTensor, RemovedNode, SubgraphCopy};
pub use options::{ContractionOptions, ContractionOrder};
