//! Linear operators, vectors and scalars as tensor networks.
//!
//! This crate provides:
//! - [`QuOperator`]: a tensor network with designated output and input edges,
//!   supporting adjoint, composition, tensor product and partial trace without
//!   early contraction
//! - [`Quantum`]: the operator classified as [`QuScalar`], [`QuVector`],
//!   [`QuAdjointVector`] or general operator
//! - Quantum-information functions over dense or network operands
//!   ([`entropy`], [`fidelity`], [`trace_distance`], [`free_energy`],
//!   [`reduced_density_matrix`], [`measurement_counts`], ...)
//!
//! # Example
//!
//! ```
//! use qunet::{DenseTensor, QuOperator};
//!
//! let x = DenseTensor::from_real(&[0.0, 1.0, 1.0, 0.0], &[2, 2]).unwrap();
//! let op = QuOperator::from_tensor(x, None, None).unwrap();
//!
//! // X X = I, so the trace is 2
//! let mut tr = op.compose(&op).unwrap().trace().unwrap();
//! let value = tr.eval(None).unwrap();
//! assert!((value.scalar_value().unwrap().re - 2.0).abs() < 1e-12);
//! ```

// Global defaults
pub mod defaults;

pub mod error;
pub mod operator;
pub mod quantum;
pub mod spaces;
pub mod specialize;

pub use defaults::{default_eps, set_default_eps, GlobalDefault, InvalidEpsError, DEFAULT_EPS};
pub use error::{QuantumError, Result, SpaceMismatch};
pub use operator::{eliminate_identities, identity, Elimination, QuOperator};
pub use quantum::{
    double_state, entropy, fidelity, free_energy, generate_local_hamiltonian, gibbs_state,
    measurement_counts, reduced_density_matrix, reduced_density_matrix_qudit, renyi_free_energy,
    trace_distance, trace_product, Cut, MeasurementCounts, Operand, QuantumOutput,
};
pub use spaces::check_spaces;
pub use specialize::{quantum_constructor, QuAdjointVector, QuScalar, QuVector, Quantum};

// Re-export the substrate for downstream use
pub use qunet_backend::{Backend, BackendError, Complex64, DenseBackend, DenseTensor};
pub use qunet_network::{
    ContractionOptions, ContractionOrder, Contractor, EdgeId, GreedyContractor, Network,
    NetworkError, NodeId,
};
