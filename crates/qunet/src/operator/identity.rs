//! Identity operators and their elimination before contraction.
//!
//! Untouched subsystems are represented by rank-2 copy nodes. They carry no
//! information once connected to something else, so contraction first splices
//! them out of the network.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use num_complex::Complex64;
use qunet_backend::DenseTensor;
use qunet_network::{EdgeId, Network, NodeId};

use crate::error::Result;
use crate::specialize::{quantum_constructor, Quantum};

/// Outcome of [`eliminate_identities`].
#[derive(Debug, Clone, Default)]
pub struct Elimination {
    /// Replacement for every visited node: itself if kept, a former
    /// neighbour if spliced out, a scalar node if it closed a trace loop.
    pub nodes: BTreeMap<NodeId, NodeId>,
    /// Replacement for every dangling edge of the visited nodes.
    pub dangling_edges: BTreeMap<EdgeId, EdgeId>,
    /// Scalar nodes created for closed identity loops.
    pub loop_scalars: Vec<NodeId>,
}

/// Remove connected rank-2 copy nodes from `nodes`.
///
/// For every identity with at least one connected leg:
/// - both legs connected: the two neighbours are joined directly;
/// - one leg dangling: the neighbour's new edge replaces that dangling edge;
/// - legs joined to each other: the node becomes a rank-0 node holding the
///   dimension (the trace of the identity).
///
/// An identity with both legs dangling is kept. Replacement chains created by
/// later removals are followed to their end, so every map value is live.
pub fn eliminate_identities(
    network: &mut Network,
    nodes: &BTreeSet<NodeId>,
) -> Result<Elimination> {
    let mut elimination = Elimination::default();

    for &node in nodes {
        let is_identity = network.is_copy_node(node)? && network.rank(node)? == 2;
        if is_identity {
            let e0 = network.edge(node, 0)?;
            let e1 = network.edge(node, 1)?;
            if !(network.is_dangling(e0)? && network.is_dangling(e1)?) {
                let dim = network.edge_dim(e0)?;
                let removed = network.remove_node(node)?;
                let neighbour = removed.neighbors.values().next().copied();
                match (removed.new_edges.get(&0), removed.new_edges.get(&1)) {
                    (Some(&a), Some(&b)) => {
                        network.connect(a, b)?;
                    }
                    (Some(&a), None) => {
                        elimination.dangling_edges.insert(e1, a);
                    }
                    (None, Some(&b)) => {
                        elimination.dangling_edges.insert(e0, b);
                    }
                    (None, None) => {
                        let scalar =
                            network.add_node(DenseTensor::scalar(Complex64::new(dim as f64, 0.0)));
                        elimination.loop_scalars.push(scalar);
                        elimination.nodes.insert(node, scalar);
                        trace!("identity {:?} closed a loop of dimension {}", node, dim);
                        continue;
                    }
                }
                if let Some(neighbour) = neighbour {
                    elimination.nodes.insert(node, neighbour);
                }
                trace!("spliced out identity {:?}", node);
                continue;
            }
        }

        for &edge in network.edges_of(node)? {
            if network.is_dangling(edge)? {
                elimination.dangling_edges.insert(edge, edge);
            }
        }
        elimination.nodes.insert(node, node);
    }

    resolve_chains(&mut elimination.dangling_edges);
    resolve_chains(&mut elimination.nodes);
    Ok(elimination)
}

/// Point every entry at the end of its replacement chain.
fn resolve_chains<K: Ord + Copy>(map: &mut BTreeMap<K, K>) {
    let keys: Vec<K> = map.keys().copied().collect();
    for key in keys {
        let mut current = map[&key];
        // a chain visits each key at most once
        for _ in 0..map.len() {
            match map.get(&current) {
                Some(&next) if next != current => current = next,
                _ => break,
            }
        }
        map.insert(key, current);
    }
}

/// Identity operator on the tensor product of `space`.
///
/// Built from one rank-2 copy node per factor. An empty space gives a scalar
/// without anchor and is rejected with `MissingAnchor`.
pub fn identity(space: &[usize]) -> Result<Quantum> {
    let mut network = Network::new();
    let mut out_edges = Vec::with_capacity(space.len());
    let mut in_edges = Vec::with_capacity(space.len());
    for &dim in space {
        let node = network.add_copy_node(2, dim);
        out_edges.push(network.edge(node, 0)?);
        in_edges.push(network.edge(node, 1)?);
    }
    quantum_constructor(network, out_edges, in_edges, [], [])
}

#[cfg(test)]
mod tests {
    use super::*;
    use qunet_backend::Complex64;

    fn all_nodes(network: &Network) -> BTreeSet<NodeId> {
        network.node_ids().collect()
    }

    #[test]
    fn test_dangling_identity_is_kept() {
        let mut network = Network::new();
        let id = network.add_copy_node(2, 3);
        let e0 = network.edge(id, 0).unwrap();
        let all = all_nodes(&network);
        let elim = eliminate_identities(&mut network, &all).unwrap();
        assert_eq!(elim.nodes[&id], id);
        assert_eq!(elim.dangling_edges[&e0], e0);
        assert!(network.contains_node(id));
    }

    #[test]
    fn test_identity_between_nodes_is_spliced() {
        let mut network = Network::new();
        let a = network.add_node(DenseTensor::identity(2));
        let id = network.add_copy_node(2, 2);
        let b = network.add_node(DenseTensor::identity(2));
        network
            .connect(network.edge(a, 1).unwrap(), network.edge(id, 0).unwrap())
            .unwrap();
        network
            .connect(network.edge(id, 1).unwrap(), network.edge(b, 0).unwrap())
            .unwrap();

        let all = all_nodes(&network);
        let elim = eliminate_identities(&mut network, &all).unwrap();
        assert!(!network.contains_node(id));
        assert_eq!(network.node_count(), 2);
        assert_eq!(network.edge(a, 1).unwrap(), network.edge(b, 0).unwrap());
        assert_eq!(elim.nodes[&a], a);
        assert!(elim.nodes[&id] == a || elim.nodes[&id] == b);
    }

    #[test]
    fn test_half_dangling_identity_reroutes_edge() {
        let mut network = Network::new();
        let a = network.add_node(DenseTensor::identity(2));
        let id = network.add_copy_node(2, 2);
        network
            .connect(network.edge(a, 1).unwrap(), network.edge(id, 0).unwrap())
            .unwrap();
        let open = network.edge(id, 1).unwrap();

        let all = all_nodes(&network);
        let elim = eliminate_identities(&mut network, &all).unwrap();
        let rerouted = elim.dangling_edges[&open];
        assert_eq!(rerouted, network.edge(a, 1).unwrap());
        assert!(network.is_dangling(rerouted).unwrap());
    }

    #[test]
    fn test_chained_identities_resolve_to_live_edge() {
        // id1 - id2 - a, with the open leg on id1
        let mut network = Network::new();
        let id1 = network.add_copy_node(2, 2);
        let id2 = network.add_copy_node(2, 2);
        let a = network.add_node(DenseTensor::identity(2));
        network
            .connect(network.edge(id1, 1).unwrap(), network.edge(id2, 0).unwrap())
            .unwrap();
        network
            .connect(network.edge(id2, 1).unwrap(), network.edge(a, 0).unwrap())
            .unwrap();
        let open = network.edge(id1, 0).unwrap();

        let all = all_nodes(&network);
        let elim = eliminate_identities(&mut network, &all).unwrap();
        let rerouted = elim.dangling_edges[&open];
        assert!(network.contains_edge(rerouted));
        assert_eq!(network.node_of(rerouted).unwrap(), a);
        assert_eq!(elim.nodes[&id1], a);
    }

    #[test]
    fn test_identity_loop_becomes_scalar() {
        let mut network = Network::new();
        let id = network.add_copy_node(2, 5);
        network
            .connect(network.edge(id, 0).unwrap(), network.edge(id, 1).unwrap())
            .unwrap();
        let all = all_nodes(&network);
        let elim = eliminate_identities(&mut network, &all).unwrap();
        assert_eq!(elim.loop_scalars.len(), 1);
        let scalar = elim.nodes[&id];
        let value = network.dense_tensor(scalar).unwrap();
        assert_eq!(value.scalar_value(), Some(Complex64::new(5.0, 0.0)));
    }

    #[test]
    fn test_identity_operator_space() {
        let id = identity(&[2, 3]).unwrap();
        assert_eq!(id.out_space().unwrap(), vec![2, 3]);
        assert_eq!(id.in_space().unwrap(), vec![2, 3]);
        assert!(matches!(id, Quantum::Operator(_)));
    }

    #[test]
    fn test_identity_on_empty_space_needs_anchor() {
        assert_eq!(
            identity(&[]).unwrap_err(),
            crate::error::QuantumError::MissingAnchor
        );
    }
}
