//! Binary operations: composition, tensor product, scalar multiplication.

use num_complex::Complex64;
use qunet_backend::DenseTensor;
use qunet_network::Network;

use super::{map_edge, map_edges, map_nodes, QuOperator};
use crate::error::{QuantumError, Result};
use crate::spaces::check_spaces;
use crate::specialize::{quantum_constructor, Quantum};

impl QuOperator {
    /// Matrix product `self @ other`.
    ///
    /// Both operands are deep-copied into a fresh network before the input
    /// edges of `self` are joined to the output edges of `other`, so
    /// `a.compose(&a)` is valid.
    ///
    /// # Errors
    /// `DimensionMismatch` if `self.in_space()` differs from
    /// `other.out_space()`.
    pub fn compose(&self, other: &QuOperator) -> Result<Quantum> {
        check_spaces(&self.in_space()?, &other.out_space()?)?;

        let mut network = Network::new();
        let left = self.copy_into(false, &mut network)?;
        let right = other.copy_into(false, &mut network)?;
        for (&e_in, &e_out) in self.in_edges.iter().zip(&other.out_edges) {
            network.connect(map_edge(&left.edges, e_in)?, map_edge(&right.edges, e_out)?)?;
        }

        let mut ignore = map_edges(&left.edges, &self.ignore_edges)?;
        ignore.extend(map_edges(&right.edges, &other.ignore_edges)?);
        let refs = left.nodes.values().chain(right.nodes.values()).copied();
        quantum_constructor(
            network,
            map_edges(&left.edges, &self.out_edges)?,
            map_edges(&right.edges, &other.in_edges)?,
            refs.collect::<Vec<_>>(),
            ignore,
        )
    }

    /// Compose with a dense tensor whose axes split evenly into out and in.
    pub fn compose_dense(&self, other: &DenseTensor) -> Result<Quantum> {
        self.compose(&QuOperator::from_tensor(other.clone(), None, None)?)
    }

    /// Tensor product `self ⊗ other`.
    ///
    /// Out and in edges are concatenated with `self` first.
    pub fn tensor_product(&self, other: &QuOperator) -> Result<Quantum> {
        let mut network = Network::new();
        let left = self.copy_into(false, &mut network)?;
        let right = other.copy_into(false, &mut network)?;

        let mut out_edges = map_edges(&left.edges, &self.out_edges)?;
        out_edges.extend(map_edges(&right.edges, &other.out_edges)?);
        let mut in_edges = map_edges(&left.edges, &self.in_edges)?;
        in_edges.extend(map_edges(&right.edges, &other.in_edges)?);
        let mut refs = map_nodes(&left.nodes, &self.ref_nodes)?;
        refs.extend(map_nodes(&right.nodes, &other.ref_nodes)?);
        let mut ignore = map_edges(&left.edges, &self.ignore_edges)?;
        ignore.extend(map_edges(&right.edges, &other.ignore_edges)?);

        quantum_constructor(network, out_edges, in_edges, refs, ignore)
    }

    /// Scalar multiplication.
    ///
    /// # Errors
    /// `InvalidOperation` unless at least one operand is a scalar.
    pub fn mul(&self, other: &QuOperator) -> Result<Quantum> {
        if !(self.is_scalar() || other.is_scalar()) {
            return Err(QuantumError::InvalidOperation {
                message: format!(
                    "elementwise product of operators with {}x{} and {}x{} edges is not supported",
                    self.out_edges.len(),
                    self.in_edges.len(),
                    other.out_edges.len(),
                    other.in_edges.len()
                ),
            });
        }
        self.tensor_product(other)
    }

    /// Multiply by a bare number.
    pub fn mul_value(&self, value: Complex64) -> Result<Quantum> {
        self.mul(&QuOperator::from_tensor(DenseTensor::scalar(value), None, None)?)
    }

    /// Multiply by a rank-0 tensor.
    ///
    /// # Errors
    /// `InvalidOperation` if `tensor` has any axes.
    pub fn mul_tensor(&self, tensor: &DenseTensor) -> Result<Quantum> {
        if tensor.rank() != 0 {
            return Err(QuantumError::InvalidOperation {
                message: format!(
                    "only rank-0 tensors act as scalars, got rank {}",
                    tensor.rank()
                ),
            });
        }
        self.mul(&QuOperator::from_tensor(tensor.clone(), None, None)?)
    }
}
