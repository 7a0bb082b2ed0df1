//! Arena of tensor nodes and edges addressed by stable handles.
//!
//! Nodes live in a petgraph [`StableGraph`] whose graph edges mirror the
//! connected network edges, so reachability is a plain graph traversal.
//! Dangling edges have no graph counterpart and are tracked only in the
//! edge table.

use crate::error::{NetworkError, Result};
use log::trace;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::Dfs;
use petgraph::Undirected;
use qunet_backend::DenseTensor;
use std::collections::{BTreeMap, BTreeSet};

/// Stable handle of a node in a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NodeIndex);

impl NodeId {
    /// Raw index of the handle.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Stable handle of an edge in a [`Network`].
///
/// Handles are never reused: connecting two dangling edges retires both and
/// names the joined edge with a fresh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Raw index of the handle.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tensor held by a node.
#[derive(Debug, Clone)]
pub enum NodeTensor {
    /// Explicit dense values.
    Dense(DenseTensor),
    /// Copy tensor: one where all `rank` indices agree, zero elsewhere.
    Copy {
        /// Number of legs.
        rank: usize,
        /// Extent of every leg.
        dim: usize,
    },
}

impl NodeTensor {
    /// Extent of every axis.
    pub fn dims(&self) -> Vec<usize> {
        match self {
            NodeTensor::Dense(t) => t.dims(),
            NodeTensor::Copy { rank, dim } => vec![*dim; *rank],
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        match self {
            NodeTensor::Dense(t) => t.rank(),
            NodeTensor::Copy { rank, .. } => *rank,
        }
    }

    /// Materialize the values as a dense tensor.
    pub fn to_dense(&self) -> DenseTensor {
        match self {
            NodeTensor::Dense(t) => t.clone(),
            NodeTensor::Copy { rank, dim } => DenseTensor::delta(*rank, *dim),
        }
    }

    fn conj(&self) -> Self {
        match self {
            NodeTensor::Dense(t) => NodeTensor::Dense(t.conj()),
            // copy tensors are real
            NodeTensor::Copy { rank, dim } => NodeTensor::Copy {
                rank: *rank,
                dim: *dim,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tensor: NodeTensor,
    edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Leg {
    node: NodeId,
    axis: usize,
}

#[derive(Debug, Clone)]
struct EdgeData {
    dim: usize,
    first: Leg,
    second: Option<Leg>,
}

/// Old-to-new handle maps produced by a subgraph copy.
#[derive(Debug, Clone, Default)]
pub struct SubgraphCopy {
    /// Copied node for every source node.
    pub nodes: BTreeMap<NodeId, NodeId>,
    /// Copied edge for every edge touching a source node.
    pub edges: BTreeMap<EdgeId, EdgeId>,
}

/// Outcome of [`Network::remove_node`], keyed by the removed node's axis.
#[derive(Debug, Clone, Default)]
pub struct RemovedNode {
    /// Node that was attached at each connected axis.
    pub neighbors: BTreeMap<usize, NodeId>,
    /// Fresh dangling edge now carried by that neighbour.
    pub new_edges: BTreeMap<usize, EdgeId>,
}

/// Tensor network arena.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: StableGraph<NodeData, EdgeId, Undirected>,
    edges: BTreeMap<EdgeId, EdgeData>,
    next_edge: usize,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_edge(&mut self, dim: usize, leg: Leg) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            EdgeData {
                dim,
                first: leg,
                second: None,
            },
        );
        id
    }

    fn add_tensor(&mut self, tensor: NodeTensor) -> NodeId {
        let dims = tensor.dims();
        let index = self.graph.add_node(NodeData {
            tensor,
            edges: Vec::new(),
        });
        let node = NodeId(index);
        let edges: Vec<EdgeId> = dims
            .iter()
            .enumerate()
            .map(|(axis, &dim)| self.fresh_edge(dim, Leg { node, axis }))
            .collect();
        self.graph[index].edges = edges;
        node
    }

    /// Wrap a dense tensor as a node; every axis gets a fresh dangling edge.
    pub fn add_node(&mut self, tensor: DenseTensor) -> NodeId {
        self.add_tensor(NodeTensor::Dense(tensor))
    }

    /// Add a copy node with `rank` legs of extent `dim`.
    pub fn add_copy_node(&mut self, rank: usize, dim: usize) -> NodeId {
        self.add_tensor(NodeTensor::Copy { rank, dim })
    }

    fn node_data(&self, node: NodeId) -> Result<&NodeData> {
        self.graph
            .node_weight(node.0)
            .ok_or(NetworkError::UnknownNode(node))
    }

    fn edge_data(&self, edge: EdgeId) -> Result<&EdgeData> {
        self.edges.get(&edge).ok_or(NetworkError::UnknownEdge(edge))
    }

    /// Whether the node handle is live in this network.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(node.0)
    }

    /// Whether the edge handle is live in this network.
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains_key(&edge)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Handles of all live nodes.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId)
    }

    /// Tensor held by a node.
    pub fn tensor(&self, node: NodeId) -> Result<&NodeTensor> {
        Ok(&self.node_data(node)?.tensor)
    }

    /// Tensor held by a node, materialized as dense values.
    pub fn dense_tensor(&self, node: NodeId) -> Result<DenseTensor> {
        Ok(self.node_data(node)?.tensor.to_dense())
    }

    /// Edges of a node, one per axis.
    pub fn edges_of(&self, node: NodeId) -> Result<&[EdgeId]> {
        Ok(&self.node_data(node)?.edges)
    }

    /// Edge attached at `axis` of `node`.
    pub fn edge(&self, node: NodeId, axis: usize) -> Result<EdgeId> {
        let edges = self.edges_of(node)?;
        edges
            .get(axis)
            .copied()
            .ok_or(NetworkError::AxisOutOfRange {
                node,
                axis,
                rank: edges.len(),
            })
    }

    /// Number of axes of a node.
    pub fn rank(&self, node: NodeId) -> Result<usize> {
        Ok(self.node_data(node)?.edges.len())
    }

    /// Whether the node holds a copy tensor.
    pub fn is_copy_node(&self, node: NodeId) -> Result<bool> {
        Ok(matches!(
            self.node_data(node)?.tensor,
            NodeTensor::Copy { .. }
        ))
    }

    /// Extent of an edge.
    pub fn edge_dim(&self, edge: EdgeId) -> Result<usize> {
        Ok(self.edge_data(edge)?.dim)
    }

    /// Whether an edge has a free end.
    pub fn is_dangling(&self, edge: EdgeId) -> Result<bool> {
        Ok(self.edge_data(edge)?.second.is_none())
    }

    /// The `(node, axis)` legs of an edge; the second is `None` while dangling.
    pub fn legs(&self, edge: EdgeId) -> Result<((NodeId, usize), Option<(NodeId, usize)>)> {
        let data = self.edge_data(edge)?;
        Ok((
            (data.first.node, data.first.axis),
            data.second.map(|leg| (leg.node, leg.axis)),
        ))
    }

    /// Node owning the first leg of an edge.
    pub fn node_of(&self, edge: EdgeId) -> Result<NodeId> {
        Ok(self.edge_data(edge)?.first.node)
    }

    /// Join two dangling edges of equal dimension.
    ///
    /// Both handles are retired and the joined edge gets a fresh handle.
    /// Joining two legs of the same node creates a trace loop.
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotDangling`] if either edge is already
    /// connected (or both handles are the same edge), and
    /// [`NetworkError::DimensionMismatch`] if the extents differ.
    pub fn connect(&mut self, a: EdgeId, b: EdgeId) -> Result<EdgeId> {
        let ea = self.edge_data(a)?;
        let eb = self.edge_data(b)?;
        if ea.second.is_some() || a == b {
            return Err(NetworkError::EdgeNotDangling(a));
        }
        if eb.second.is_some() {
            return Err(NetworkError::EdgeNotDangling(b));
        }
        if ea.dim != eb.dim {
            return Err(NetworkError::DimensionMismatch {
                left: ea.dim,
                right: eb.dim,
            });
        }
        let (dim, la, lb) = (ea.dim, ea.first, eb.first);
        self.edges.remove(&a);
        self.edges.remove(&b);

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.graph.add_edge(la.node.0, lb.node.0, id);
        self.edges.insert(
            id,
            EdgeData {
                dim,
                first: la,
                second: Some(lb),
            },
        );
        self.graph[la.node.0].edges[la.axis] = id;
        self.graph[lb.node.0].edges[lb.axis] = id;
        Ok(id)
    }

    /// Remove a node; every neighbour leg it was connected to gets a fresh
    /// dangling edge.
    ///
    /// Trace loops on the removed node disappear with it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<RemovedNode> {
        let data = self
            .graph
            .remove_node(node.0)
            .ok_or(NetworkError::UnknownNode(node))?;
        let mut removed = RemovedNode::default();
        for (axis, edge) in data.edges.into_iter().enumerate() {
            // a trace loop is seen twice; the second visit finds it gone
            let Some(edge_data) = self.edges.remove(&edge) else {
                continue;
            };
            let Some(second) = edge_data.second else {
                continue;
            };
            let other = if edge_data.first.node == node && edge_data.first.axis == axis {
                second
            } else {
                edge_data.first
            };
            if other.node == node {
                continue;
            }
            let fresh = self.fresh_edge(edge_data.dim, other);
            self.graph[other.node.0].edges[other.axis] = fresh;
            removed.neighbors.insert(axis, other.node);
            removed.new_edges.insert(axis, fresh);
        }
        trace!(
            "removed node {:?}, rewired {} neighbour legs",
            node,
            removed.new_edges.len()
        );
        Ok(removed)
    }

    /// Deep-copy `nodes` into `dest`.
    ///
    /// Edges between two copied nodes are reconnected in the copy; edges that
    /// lead outside `nodes` dangle. With `conjugate`, every dense tensor is
    /// complex-conjugated.
    pub fn copy_into(
        &self,
        nodes: &BTreeSet<NodeId>,
        conjugate: bool,
        dest: &mut Network,
    ) -> Result<SubgraphCopy> {
        let mut copy = SubgraphCopy::default();
        let mut touched: BTreeSet<EdgeId> = BTreeSet::new();
        for &node in nodes {
            let data = self.node_data(node)?;
            let tensor = if conjugate {
                data.tensor.conj()
            } else {
                data.tensor.clone()
            };
            copy.nodes.insert(node, dest.add_tensor(tensor));
            touched.extend(data.edges.iter().copied());
        }

        for edge in touched {
            let data = self.edge_data(edge)?;
            let first = match copy.nodes.get(&data.first.node) {
                Some(&n) => Some(dest.edge(n, data.first.axis)?),
                None => None,
            };
            let second = data
                .second
                .and_then(|leg| copy.nodes.get(&leg.node).map(|&n| (n, leg.axis)));
            let second = match second {
                Some((n, axis)) => Some(dest.edge(n, axis)?),
                None => None,
            };
            let mapped = match (first, second) {
                (Some(e1), Some(e2)) => dest.connect(e1, e2)?,
                (Some(e), None) | (None, Some(e)) => e,
                (None, None) => continue,
            };
            copy.edges.insert(edge, mapped);
        }
        Ok(copy)
    }

    /// Deep-copy `nodes` within this network.
    pub fn copy_subgraph(
        &mut self,
        nodes: &BTreeSet<NodeId>,
        conjugate: bool,
    ) -> Result<SubgraphCopy> {
        let source = self.clone();
        source.copy_into(nodes, conjugate, self)
    }

    /// All nodes connected to any of `seeds` through connected edges.
    pub fn reachable(&self, seeds: impl IntoIterator<Item = NodeId>) -> Result<BTreeSet<NodeId>> {
        let mut visited = BTreeSet::new();
        for seed in seeds {
            if !self.contains_node(seed) {
                return Err(NetworkError::UnknownNode(seed));
            }
            if visited.contains(&seed) {
                continue;
            }
            let mut dfs = Dfs::new(&self.graph, seed.0);
            while let Some(index) = dfs.next(&self.graph) {
                visited.insert(NodeId(index));
            }
        }
        Ok(visited)
    }

    /// Dangling edges attached to any of `nodes`.
    pub fn dangling_edges_of(&self, nodes: &BTreeSet<NodeId>) -> Result<BTreeSet<EdgeId>> {
        let mut dangling = BTreeSet::new();
        for &node in nodes {
            for &edge in &self.node_data(node)?.edges {
                if self.is_dangling(edge)? {
                    dangling.insert(edge);
                }
            }
        }
        Ok(dangling)
    }

    /// Replace `nodes` by a single node holding `tensor`.
    ///
    /// Axis `i` of the new node takes over `axis_edges[i]`, which must have
    /// exactly one leg inside `nodes`. Every other edge of `nodes` must be
    /// internal to the set and is dropped.
    pub fn absorb(
        &mut self,
        nodes: &BTreeSet<NodeId>,
        tensor: DenseTensor,
        axis_edges: &[EdgeId],
    ) -> Result<NodeId> {
        let dims = tensor.dims();
        if dims.len() != axis_edges.len() {
            return Err(NetworkError::Contraction {
                message: format!(
                    "tensor of rank {} cannot take {} edges",
                    dims.len(),
                    axis_edges.len()
                ),
            });
        }

        let mut boundary: Vec<(bool, Option<Leg>)> = Vec::with_capacity(axis_edges.len());
        for (&edge, &dim) in axis_edges.iter().zip(&dims) {
            let data = self.edge_data(edge)?;
            if data.dim != dim {
                return Err(NetworkError::DimensionMismatch {
                    left: data.dim,
                    right: dim,
                });
            }
            let first_inside = nodes.contains(&data.first.node);
            let second_inside = data.second.map(|leg| nodes.contains(&leg.node));
            let entry = match (first_inside, second_inside) {
                (true, None) => (true, None),
                (true, Some(false)) => (true, data.second),
                (false, Some(true)) => (false, Some(data.first)),
                _ => {
                    return Err(NetworkError::Contraction {
                        message: format!("edge {:?} is not on the boundary of the node set", edge),
                    })
                }
            };
            boundary.push(entry);
        }

        let kept: BTreeSet<EdgeId> = axis_edges.iter().copied().collect();
        let mut internal = Vec::new();
        for &node in nodes {
            for &edge in &self.node_data(node)?.edges {
                if kept.contains(&edge) {
                    continue;
                }
                let data = self.edge_data(edge)?;
                let closed = data.second.is_some_and(|leg| nodes.contains(&leg.node))
                    && nodes.contains(&data.first.node);
                if !closed {
                    return Err(NetworkError::Contraction {
                        message: format!("open edge {:?} missing from the output order", edge),
                    });
                }
                internal.push(edge);
            }
        }

        for edge in internal {
            self.edges.remove(&edge);
        }
        for &node in nodes {
            self.graph.remove_node(node.0);
        }

        let index = self.graph.add_node(NodeData {
            tensor: NodeTensor::Dense(tensor),
            edges: axis_edges.to_vec(),
        });
        let new_node = NodeId(index);
        for (axis, (&edge, (inside_is_first, outside))) in
            axis_edges.iter().zip(boundary).enumerate()
        {
            let leg = Leg {
                node: new_node,
                axis,
            };
            if let Some(other) = outside {
                self.graph.add_edge(index, other.node.0, edge);
            }
            let data = self
                .edges
                .get_mut(&edge)
                .ok_or(NetworkError::UnknownEdge(edge))?;
            if inside_is_first {
                data.first = leg;
            } else {
                data.second = Some(leg);
            }
        }
        Ok(new_node)
    }
}
