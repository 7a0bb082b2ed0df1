//! Scalar, vector and adjoint-vector specialisations of [`QuOperator`].
//!
//! Every structure-producing operation returns a [`Quantum`], classified by
//! [`quantum_constructor`] from the number of output and input edges, so
//! callers never pick the variant themselves.

use std::ops::{Deref, DerefMut};

use num_complex::Complex64;
use qunet_backend::DenseTensor;
use qunet_network::{EdgeId, Network, NodeId};

use crate::error::{QuantumError, Result};
use crate::operator::QuOperator;

/// An operator network classified by the shape of its edge lists.
#[derive(Debug, Clone)]
pub enum Quantum {
    /// No output and no input edges.
    Scalar(QuScalar),
    /// Output edges only.
    Vector(QuVector),
    /// Input edges only.
    AdjointVector(QuAdjointVector),
    /// Both output and input edges.
    Operator(QuOperator),
}

impl Quantum {
    /// The underlying operator.
    pub fn into_operator(self) -> QuOperator {
        match self {
            Quantum::Scalar(s) => s.0,
            Quantum::Vector(v) => v.0,
            Quantum::AdjointVector(v) => v.0,
            Quantum::Operator(op) => op,
        }
    }

    /// Borrow the underlying operator.
    pub fn as_operator(&self) -> &QuOperator {
        self
    }
}

impl From<QuOperator> for Quantum {
    fn from(op: QuOperator) -> Self {
        match (op.out_edges().is_empty(), op.in_edges().is_empty()) {
            (true, true) => Quantum::Scalar(QuScalar(op)),
            (false, true) => Quantum::Vector(QuVector(op)),
            (true, false) => Quantum::AdjointVector(QuAdjointVector(op)),
            (false, false) => Quantum::Operator(op),
        }
    }
}

impl Deref for Quantum {
    type Target = QuOperator;

    fn deref(&self) -> &QuOperator {
        match self {
            Quantum::Scalar(s) => &s.0,
            Quantum::Vector(v) => &v.0,
            Quantum::AdjointVector(v) => &v.0,
            Quantum::Operator(op) => op,
        }
    }
}

impl DerefMut for Quantum {
    fn deref_mut(&mut self) -> &mut QuOperator {
        match self {
            Quantum::Scalar(s) => &mut s.0,
            Quantum::Vector(v) => &mut v.0,
            Quantum::AdjointVector(v) => &mut v.0,
            Quantum::Operator(op) => op,
        }
    }
}

/// Build an operator and classify it.
///
/// Returns a scalar if both edge lists are empty, a vector if only the input
/// list is empty, an adjoint vector if only the output list is empty, and a
/// general operator otherwise.
pub fn quantum_constructor(
    network: Network,
    out_edges: Vec<EdgeId>,
    in_edges: Vec<EdgeId>,
    ref_nodes: impl IntoIterator<Item = NodeId>,
    ignore_edges: impl IntoIterator<Item = EdgeId>,
) -> Result<Quantum> {
    QuOperator::new(network, out_edges, in_edges, ref_nodes, ignore_edges).map(Quantum::from)
}

macro_rules! impl_operator_deref {
    ($name:ident) => {
        impl Deref for $name {
            type Target = QuOperator;

            fn deref(&self) -> &QuOperator {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut QuOperator {
                &mut self.0
            }
        }

        impl From<$name> for QuOperator {
            fn from(value: $name) -> QuOperator {
                value.0
            }
        }
    };
}

fn require_edges(edges: &[EdgeId], what: &str) -> Result<()> {
    if edges.is_empty() {
        return Err(QuantumError::InvalidArgument {
            message: format!("{} needs at least one subsystem edge", what),
        });
    }
    Ok(())
}

fn all_axes(rank: usize, axes: Option<&[usize]>) -> Vec<usize> {
    axes.map_or_else(|| (0..rank).collect(), <[usize]>::to_vec)
}

/// A state vector: an operator with output edges only.
#[derive(Debug, Clone)]
pub struct QuVector(QuOperator);

impl_operator_deref!(QuVector);

impl QuVector {
    /// Interpret dangling edges of `network` as a vector.
    pub fn new(
        network: Network,
        subsystem_edges: Vec<EdgeId>,
        ref_nodes: impl IntoIterator<Item = NodeId>,
        ignore_edges: impl IntoIterator<Item = EdgeId>,
    ) -> Result<Self> {
        require_edges(&subsystem_edges, "a vector")?;
        QuOperator::new(network, subsystem_edges, Vec::new(), ref_nodes, ignore_edges).map(Self)
    }

    /// Wrap a tensor; `subsystem_axes` defaults to all axes in order.
    pub fn from_tensor(tensor: DenseTensor, subsystem_axes: Option<&[usize]>) -> Result<Self> {
        let axes = all_axes(tensor.rank(), subsystem_axes);
        if axes.is_empty() {
            return Err(QuantumError::InvalidArgument {
                message: "a vector needs a tensor with at least one axis".to_string(),
            });
        }
        QuOperator::from_tensor(tensor, Some(axes.as_slice()), Some(&[])).map(Self)
    }

    /// Edges of the vector's subsystems.
    pub fn subsystem_edges(&self) -> &[EdgeId] {
        self.out_edges()
    }

    /// Dimensions of the subsystems.
    pub fn space(&self) -> Result<Vec<usize>> {
        self.out_space()
    }

    /// `|ψ⟩⟨ψ|`.
    pub fn projector(&self) -> Result<Quantum> {
        self.compose(self.adjoint()?.as_operator())
    }

    /// Reduced density operator after tracing out the given subsystems.
    pub fn reduced_density(&self, subsystems_to_trace_out: &[usize]) -> Result<Quantum> {
        self.projector()?.partial_trace(subsystems_to_trace_out)
    }
}

/// A dual vector: an operator with input edges only.
#[derive(Debug, Clone)]
pub struct QuAdjointVector(QuOperator);

impl_operator_deref!(QuAdjointVector);

impl QuAdjointVector {
    /// Interpret dangling edges of `network` as an adjoint vector.
    pub fn new(
        network: Network,
        subsystem_edges: Vec<EdgeId>,
        ref_nodes: impl IntoIterator<Item = NodeId>,
        ignore_edges: impl IntoIterator<Item = EdgeId>,
    ) -> Result<Self> {
        require_edges(&subsystem_edges, "an adjoint vector")?;
        QuOperator::new(network, Vec::new(), subsystem_edges, ref_nodes, ignore_edges).map(Self)
    }

    /// Wrap a tensor; `subsystem_axes` defaults to all axes in order.
    pub fn from_tensor(tensor: DenseTensor, subsystem_axes: Option<&[usize]>) -> Result<Self> {
        let axes = all_axes(tensor.rank(), subsystem_axes);
        if axes.is_empty() {
            return Err(QuantumError::InvalidArgument {
                message: "an adjoint vector needs a tensor with at least one axis".to_string(),
            });
        }
        QuOperator::from_tensor(tensor, Some(&[]), Some(axes.as_slice())).map(Self)
    }

    /// Edges of the subsystems.
    pub fn subsystem_edges(&self) -> &[EdgeId] {
        self.in_edges()
    }

    /// Dimensions of the subsystems.
    pub fn space(&self) -> Result<Vec<usize>> {
        self.in_space()
    }

    /// `|ψ⟩⟨ψ|` with `self = ⟨ψ|`.
    pub fn projector(&self) -> Result<Quantum> {
        self.adjoint()?.compose(self)
    }

    /// Reduced density operator after tracing out the given subsystems.
    pub fn reduced_density(&self, subsystems_to_trace_out: &[usize]) -> Result<Quantum> {
        self.projector()?.partial_trace(subsystems_to_trace_out)
    }
}

/// A scalar: an operator without output or input edges.
#[derive(Debug, Clone)]
pub struct QuScalar(QuOperator);

impl_operator_deref!(QuScalar);

impl QuScalar {
    /// Interpret a network without open subsystems as a scalar.
    ///
    /// # Errors
    /// `MissingAnchor` if `ref_nodes` is empty.
    pub fn new(
        network: Network,
        ref_nodes: impl IntoIterator<Item = NodeId>,
        ignore_edges: impl IntoIterator<Item = EdgeId>,
    ) -> Result<Self> {
        QuOperator::new(network, Vec::new(), Vec::new(), ref_nodes, ignore_edges).map(Self)
    }

    /// Wrap a rank-0 tensor.
    pub fn from_tensor(tensor: DenseTensor) -> Result<Self> {
        if tensor.rank() != 0 {
            return Err(QuantumError::InvalidArgument {
                message: format!("a scalar needs a rank-0 tensor, got rank {}", tensor.rank()),
            });
        }
        QuOperator::from_tensor(tensor, Some(&[]), Some(&[])).map(Self)
    }

    /// Wrap a bare number.
    pub fn from_value(value: Complex64) -> Result<Self> {
        Self::from_tensor(DenseTensor::scalar(value))
    }

    /// Contract in place and return the value.
    pub fn value(&mut self) -> Result<Complex64> {
        let tensor = self.eval(None)?;
        tensor
            .scalar_value()
            .ok_or_else(|| QuantumError::ContractionError {
                message: format!("scalar evaluated to a tensor of shape {:?}", tensor.dims()),
            })
    }
}
