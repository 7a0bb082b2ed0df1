//! Linear operators represented by tensor networks.
//!
//! A [`QuOperator`] owns a [`Network`] and designates some of its dangling
//! edges as output (row) edges and some as input (column) edges. Matrix-like
//! operations build new networks from deep copies, so operands stay usable
//! and an operator can be composed with itself. Only
//! [`contract`](QuOperator::contract) mutates its receiver.
//!
//! # Key Types
//!
//! - [`QuOperator`]: The general operator
//! - [`Elimination`]: Node and edge replacements made by [`eliminate_identities`]
//! - [`identity`]: Identity operator on a product space

mod compose;
mod contract;
mod identity;

pub use identity::{eliminate_identities, identity, Elimination};

use std::collections::{BTreeMap, BTreeSet};

use qunet_backend::DenseTensor;
use qunet_network::{EdgeId, Network, NodeId, SubgraphCopy};

use crate::error::{QuantumError, Result};
use crate::spaces::check_spaces;
use crate::specialize::{quantum_constructor, Quantum};

/// A linear operator encoded as a tensor network.
///
/// Considered as a matrix, `out_edges` index the rows and `in_edges` the
/// columns. `ignore_edges` are dangling edges excluded from both.
/// `ref_nodes` anchor parts of the network that no out/in edge reaches,
/// such as scalar factors.
///
/// Every out, in and ignored edge is dangling, and together they are exactly
/// the dangling edges of [`nodes`](Self::nodes). Construction and every
/// mutation check this.
#[derive(Debug, Clone)]
pub struct QuOperator {
    network: Network,
    out_edges: Vec<EdgeId>,
    in_edges: Vec<EdgeId>,
    ignore_edges: BTreeSet<EdgeId>,
    ref_nodes: BTreeSet<NodeId>,
}

/// Axis split shared by the tensor constructors.
///
/// Either list may be omitted and is then the complement of the other. With
/// both omitted, the first half of the axes are outputs.
pub(crate) fn split_axes(
    rank: usize,
    out_axes: Option<&[usize]>,
    in_axes: Option<&[usize]>,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let complement = |axes: &[usize]| (0..rank).filter(|i| !axes.contains(i)).collect::<Vec<_>>();
    let (out_axes, in_axes) = match (out_axes, in_axes) {
        (None, None) => ((0..rank / 2).collect(), (rank / 2..rank).collect()),
        (Some(out), None) => (out.to_vec(), complement(out)),
        (None, Some(inp)) => (complement(inp), inp.to_vec()),
        (Some(out), Some(inp)) => (out.to_vec(), inp.to_vec()),
    };
    if let Some(&axis) = out_axes.iter().chain(&in_axes).find(|&&a| a >= rank) {
        return Err(QuantumError::InvalidArgument {
            message: format!("axis {} out of range for a tensor of rank {}", axis, rank),
        });
    }
    Ok((out_axes, in_axes))
}

impl QuOperator {
    /// Interpret an existing network as an operator.
    ///
    /// # Arguments
    /// * `network` - The network holding the nodes
    /// * `out_edges` - Dangling edges used as the output (row) space
    /// * `in_edges` - Dangling edges used as the input (column) space
    /// * `ref_nodes` - Nodes anchoring parts not reachable from any edge
    /// * `ignore_edges` - Dangling edges excluded from the consistency check
    ///
    /// # Errors
    /// `MissingAnchor` if there are no edges and no reference nodes;
    /// `InvalidNetwork` if the declared edges are not exactly the dangling
    /// edges of the network.
    pub fn new(
        network: Network,
        out_edges: Vec<EdgeId>,
        in_edges: Vec<EdgeId>,
        ref_nodes: impl IntoIterator<Item = NodeId>,
        ignore_edges: impl IntoIterator<Item = EdgeId>,
    ) -> Result<Self> {
        let ref_nodes: BTreeSet<NodeId> = ref_nodes.into_iter().collect();
        if out_edges.is_empty() && in_edges.is_empty() && ref_nodes.is_empty() {
            return Err(QuantumError::MissingAnchor);
        }
        let op = Self {
            network,
            out_edges,
            in_edges,
            ignore_edges: ignore_edges.into_iter().collect(),
            ref_nodes,
        };
        op.check_network()?;
        Ok(op)
    }

    /// Wrap a single tensor as an operator.
    ///
    /// # Arguments
    /// * `tensor` - The tensor
    /// * `out_axes` - Axes used as output edges (complement of `in_axes` if omitted)
    /// * `in_axes` - Axes used as input edges (complement of `out_axes` if omitted)
    ///
    /// With both omitted, the first half of the axes are outputs and the rest
    /// inputs.
    pub fn from_tensor(
        tensor: DenseTensor,
        out_axes: Option<&[usize]>,
        in_axes: Option<&[usize]>,
    ) -> Result<Self> {
        let (out_axes, in_axes) = split_axes(tensor.rank(), out_axes, in_axes)?;
        let mut network = Network::new();
        let node = network.add_node(tensor);
        let out_edges = out_axes
            .iter()
            .map(|&a| network.edge(node, a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let in_edges = in_axes
            .iter()
            .map(|&a| network.edge(node, a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::new(network, out_edges, in_edges, [node], [])
    }

    /// Embed a local tensor into a larger product space.
    ///
    /// The tensor's axes are split as in [`from_tensor`](Self::from_tensor).
    /// Every factor of `space` whose position is not listed in `loc` gets an
    /// identity, appended to both the output and the input edges.
    pub fn from_local_tensor(
        tensor: DenseTensor,
        space: &[usize],
        loc: &[usize],
        out_axes: Option<&[usize]>,
        in_axes: Option<&[usize]>,
    ) -> Result<Self> {
        if let Some(&site) = loc.iter().find(|&&site| site >= space.len()) {
            return Err(QuantumError::InvalidArgument {
                message: format!("site {} outside a space of {} factors", site, space.len()),
            });
        }
        let (out_axes, in_axes) = split_axes(tensor.rank(), out_axes, in_axes)?;
        let mut network = Network::new();
        let node = network.add_node(tensor);
        let mut out_edges = Vec::new();
        let mut in_edges = Vec::new();
        for &a in &out_axes {
            out_edges.push(network.edge(node, a)?);
        }
        for &a in &in_axes {
            in_edges.push(network.edge(node, a)?);
        }
        for (site, &dim) in space.iter().enumerate() {
            if loc.contains(&site) {
                continue;
            }
            let id = network.add_copy_node(2, dim);
            out_edges.push(network.edge(id, 0)?);
            in_edges.push(network.edge(id, 1)?);
        }
        Self::new(network, out_edges, in_edges, [node], [])
    }

    /// The network holding the operator's nodes.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Output (row) edges, in order.
    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out_edges
    }

    /// Input (column) edges, in order.
    pub fn in_edges(&self) -> &[EdgeId] {
        &self.in_edges
    }

    /// Dangling edges excluded from the row/column interpretation.
    pub fn ignore_edges(&self) -> &BTreeSet<EdgeId> {
        &self.ignore_edges
    }

    /// Reference nodes.
    pub fn ref_nodes(&self) -> &BTreeSet<NodeId> {
        &self.ref_nodes
    }

    /// All nodes reachable from the out/in edges and the reference nodes.
    pub fn nodes(&self) -> Result<BTreeSet<NodeId>> {
        let mut seeds = Vec::with_capacity(self.out_edges.len() + self.in_edges.len());
        for &edge in self.out_edges.iter().chain(&self.in_edges) {
            seeds.push(self.network.node_of(edge)?);
        }
        seeds.extend(self.ref_nodes.iter().copied());
        Ok(self.network.reachable(seeds)?)
    }

    fn space_of(&self, edges: &[EdgeId]) -> Result<Vec<usize>> {
        edges
            .iter()
            .map(|&e| self.network.edge_dim(e).map_err(QuantumError::from))
            .collect()
    }

    /// Dimensions of the input edges.
    pub fn in_space(&self) -> Result<Vec<usize>> {
        self.space_of(&self.in_edges)
    }

    /// Dimensions of the output edges.
    pub fn out_space(&self) -> Result<Vec<usize>> {
        self.space_of(&self.out_edges)
    }

    /// No out and no in edges.
    pub fn is_scalar(&self) -> bool {
        self.out_edges.is_empty() && self.in_edges.is_empty()
    }

    /// Out edges only.
    pub fn is_vector(&self) -> bool {
        !self.out_edges.is_empty() && self.in_edges.is_empty()
    }

    /// In edges only.
    pub fn is_adjoint_vector(&self) -> bool {
        self.out_edges.is_empty() && !self.in_edges.is_empty()
    }

    /// Check that the declared edges are exactly the network's dangling edges.
    pub fn check_network(&self) -> Result<()> {
        let roles = [
            ("output", self.out_edges.iter().collect::<Vec<_>>()),
            ("input", self.in_edges.iter().collect()),
            ("ignored", self.ignore_edges.iter().collect()),
        ];
        for (role, edges) in &roles {
            for (i, &&edge) in edges.iter().enumerate() {
                let dangling = self.network.contains_edge(edge) && self.network.is_dangling(edge)?;
                if !dangling {
                    return Err(QuantumError::InvalidNetwork {
                        message: format!("{} edge {} ({:?}) is not dangling", role, i, edge),
                    });
                }
            }
        }

        let known: BTreeSet<EdgeId> = self
            .out_edges
            .iter()
            .chain(&self.in_edges)
            .chain(&self.ignore_edges)
            .copied()
            .collect();
        let declared = self.out_edges.len() + self.in_edges.len() + self.ignore_edges.len();
        if known.len() != declared {
            return Err(QuantumError::InvalidNetwork {
                message: "an edge is declared in more than one role".to_string(),
            });
        }

        let dangling = self.network.dangling_edges_of(&self.nodes()?)?;
        if known != dangling {
            return Err(QuantumError::InvalidNetwork {
                message: format!(
                    "the network has {} dangling edges but {} are declared",
                    dangling.len(),
                    known.len()
                ),
            });
        }
        Ok(())
    }

    /// Copy the reachable nodes into `dest`.
    fn copy_into(&self, conjugate: bool, dest: &mut Network) -> Result<SubgraphCopy> {
        Ok(self.network.copy_into(&self.nodes()?, conjugate, dest)?)
    }

    /// Complex-conjugated copy with out and in edges swapped.
    pub fn adjoint(&self) -> Result<Quantum> {
        let mut network = Network::new();
        let copy = self.copy_into(true, &mut network)?;
        quantum_constructor(
            network,
            map_edges(&copy.edges, &self.in_edges)?,
            map_edges(&copy.edges, &self.out_edges)?,
            map_nodes(&copy.nodes, &self.ref_nodes)?,
            map_edges(&copy.edges, &self.ignore_edges)?,
        )
    }

    /// Structural copy with the same edge roles.
    pub fn copy(&self) -> Result<Quantum> {
        let mut network = Network::new();
        let copy = self.copy_into(false, &mut network)?;
        quantum_constructor(
            network,
            map_edges(&copy.edges, &self.out_edges)?,
            map_edges(&copy.edges, &self.in_edges)?,
            map_nodes(&copy.nodes, &self.ref_nodes)?,
            map_edges(&copy.edges, &self.ignore_edges)?,
        )
    }

    /// Partial trace over the given subsystem positions.
    ///
    /// `out_edges[i]` is joined to `in_edges[i]` for every listed `i`. The
    /// remaining subsystems keep their relative order.
    ///
    /// # Errors
    /// `InvalidArgument` for a position missing from either edge list or
    /// listed twice; `DimensionMismatch` if a traced pair differs in
    /// dimension.
    pub fn partial_trace(&self, subsystems_to_trace_out: &[usize]) -> Result<Quantum> {
        let mut traced = BTreeSet::new();
        for &i in subsystems_to_trace_out {
            if i >= self.out_edges.len() || i >= self.in_edges.len() {
                return Err(QuantumError::InvalidArgument {
                    message: format!(
                        "subsystem {} outside {} outputs and {} inputs",
                        i,
                        self.out_edges.len(),
                        self.in_edges.len()
                    ),
                });
            }
            if !traced.insert(i) {
                return Err(QuantumError::InvalidArgument {
                    message: format!("subsystem {} traced out twice", i),
                });
            }
        }

        let out_trace: Vec<EdgeId> = subsystems_to_trace_out
            .iter()
            .map(|&i| self.out_edges[i])
            .collect();
        let in_trace: Vec<EdgeId> = subsystems_to_trace_out
            .iter()
            .map(|&i| self.in_edges[i])
            .collect();
        check_spaces(&self.space_of(&in_trace)?, &self.space_of(&out_trace)?)?;

        let mut network = Network::new();
        let copy = self.copy_into(false, &mut network)?;
        for (e1, e2) in out_trace.iter().zip(&in_trace) {
            network.connect(map_edge(&copy.edges, *e1)?, map_edge(&copy.edges, *e2)?)?;
        }

        let keep = |edges: &[EdgeId]| -> Vec<EdgeId> {
            edges
                .iter()
                .enumerate()
                .filter(|(i, _)| !traced.contains(i))
                .map(|(_, &e)| e)
                .collect()
        };
        quantum_constructor(
            network,
            map_edges(&copy.edges, &keep(&self.out_edges))?,
            map_edges(&copy.edges, &keep(&self.in_edges))?,
            copy.nodes.values().copied().collect::<Vec<_>>(),
            map_edges(&copy.edges, &self.ignore_edges)?,
        )
    }

    /// Trace over all subsystems.
    pub fn trace(&self) -> Result<Quantum> {
        let all: Vec<usize> = (0..self.in_edges.len()).collect();
        self.partial_trace(&all)
    }

    /// Hilbert-Schmidt norm, `Tr(A^dagger A)`, as a scalar network.
    pub fn norm(&self) -> Result<Quantum> {
        self.adjoint()?.compose(self)?.trace()
    }
}

fn map_edge(map: &BTreeMap<EdgeId, EdgeId>, edge: EdgeId) -> Result<EdgeId> {
    map.get(&edge)
        .copied()
        .ok_or_else(|| QuantumError::InvalidNetwork {
            message: format!("edge {:?} is not part of the operator network", edge),
        })
}

fn map_edges<'a>(
    map: &BTreeMap<EdgeId, EdgeId>,
    edges: impl IntoIterator<Item = &'a EdgeId>,
) -> Result<Vec<EdgeId>> {
    edges.into_iter().map(|&e| map_edge(map, e)).collect()
}

fn map_nodes<'a>(
    map: &BTreeMap<NodeId, NodeId>,
    nodes: impl IntoIterator<Item = &'a NodeId>,
) -> Result<Vec<NodeId>> {
    nodes
        .into_iter()
        .map(|n| {
            map.get(n).copied().ok_or_else(|| QuantumError::InvalidNetwork {
                message: format!("reference node {:?} is not part of the operator network", n),
            })
        })
        .collect()
}
