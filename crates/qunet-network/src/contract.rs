//! Contraction of a node set down to a single node.

use crate::error::{NetworkError, Result};
use crate::network::{EdgeId, Network, NodeId};
use crate::options::{ContractionOptions, ContractionOrder};
use log::debug;
use omeco::{CodeOptimizer, EinCode, GreedyMethod, NestedEinsum};
use qunet_backend::{Complex64, DenseTensor};
use std::collections::{BTreeSet, HashMap};

/// Reduces a set of nodes to one node holding their contraction.
///
/// The nodes are replaced in place. The new node's axes carry the open edges
/// of the set: in `output_order` when given, in an unspecified order
/// otherwise.
pub trait Contractor {
    /// Contract `nodes` of `network`, returning the node that replaces them.
    fn contract(
        &self,
        network: &mut Network,
        nodes: &BTreeSet<NodeId>,
        output_order: Option<&[EdgeId]>,
    ) -> Result<NodeId>;
}

/// Contractor that orders pairwise contractions with omeco's greedy method.
///
/// Trace loops are summed out per node before pairing, and rank-0 tensors
/// are folded in as scalar factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyContractor {
    options: ContractionOptions,
}

impl GreedyContractor {
    /// Create a contractor with the given options.
    pub fn new(options: ContractionOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &ContractionOptions {
        &self.options
    }
}

/// Dense tensor with the network edge carried by each axis.
#[derive(Debug, Clone)]
struct Labelled {
    tensor: DenseTensor,
    labels: Vec<EdgeId>,
}

impl Labelled {
    fn trace_loops(mut self) -> Result<Self> {
        while let Some((i, j)) = repeated_pair(&self.labels) {
            self.tensor = self.tensor.trace_axes(i, j)?;
            self.labels.remove(j);
            self.labels.remove(i);
        }
        Ok(self)
    }

    fn contract_with(self, other: Labelled) -> Result<Labelled> {
        let mut axes = Vec::new();
        let mut other_axes = Vec::new();
        for (i, label) in self.labels.iter().enumerate() {
            if let Some(j) = other.labels.iter().position(|l| l == label) {
                axes.push(i);
                other_axes.push(j);
            }
        }
        let tensor = self.tensor.contract(&axes, &other.tensor, &other_axes)?;
        let labels = self
            .labels
            .iter()
            .enumerate()
            .filter(|(i, _)| !axes.contains(i))
            .chain(
                other
                    .labels
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| !other_axes.contains(j)),
            )
            .map(|(_, &l)| l)
            .collect();
        Ok(Labelled { tensor, labels })
    }
}

/// First pair of positions `(i, j)`, `i < j`, holding the same label.
fn repeated_pair(labels: &[EdgeId]) -> Option<(usize, usize)> {
    labels.iter().enumerate().find_map(|(i, l)| {
        labels[i + 1..]
            .iter()
            .position(|m| m == l)
            .map(|offset| (i, i + 1 + offset))
    })
}

fn contract_sequential(operands: Vec<Labelled>) -> Result<Labelled> {
    let mut iter = operands.into_iter();
    let mut acc = iter.next().ok_or_else(|| NetworkError::Contraction {
        message: "nothing to contract".to_string(),
    })?;
    for next in iter {
        debug!(left = acc.labels.len(), right = next.labels.len(); "Contracting pair");
        acc = acc.contract_with(next)?;
    }
    Ok(acc)
}

fn execute_tree(tree: &NestedEinsum<usize>, slots: &mut [Option<Labelled>]) -> Result<Labelled> {
    match tree {
        NestedEinsum::Leaf { tensor_index } => slots
            .get_mut(*tensor_index)
            .and_then(Option::take)
            .ok_or_else(|| NetworkError::Contraction {
                message: format!("contraction tree refers to missing operand {}", tensor_index),
            }),
        NestedEinsum::Node { args, .. } => {
            let mut args = args.iter();
            let first = args.next().ok_or_else(|| NetworkError::Contraction {
                message: "empty contraction tree node".to_string(),
            })?;
            let mut acc = execute_tree(first, slots)?;
            for arg in args {
                let next = execute_tree(arg, slots)?;
                debug!(left = acc.labels.len(), right = next.labels.len(); "Contracting pair");
                acc = acc.contract_with(next)?;
            }
            Ok(acc)
        }
    }
}

fn contract_greedy(operands: Vec<Labelled>) -> Result<Labelled> {
    let ixs: Vec<Vec<usize>> = operands
        .iter()
        .map(|o| o.labels.iter().map(|e| e.index()).collect())
        .collect();
    let mut counts: HashMap<usize, usize> = HashMap::new();
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for operand in &operands {
        for (label, dim) in operand.labels.iter().zip(operand.tensor.dims()) {
            *counts.entry(label.index()).or_insert(0) += 1;
            sizes.insert(label.index(), dim);
        }
    }
    let iy: Vec<usize> = ixs
        .iter()
        .flatten()
        .copied()
        .filter(|l| counts.get(l) == Some(&1))
        .collect();

    let code = EinCode::new(ixs, iy);
    let Some(tree) = GreedyMethod::default().optimize(&code, &sizes) else {
        debug!("Optimizer declined, contracting left to right");
        return contract_sequential(operands);
    };

    let mut slots: Vec<Option<Labelled>> = operands.into_iter().map(Some).collect();
    let mut acc = execute_tree(&tree, &mut slots)?;
    for leftover in slots.into_iter().flatten() {
        acc = acc.contract_with(leftover)?;
    }
    Ok(acc)
}

impl Contractor for GreedyContractor {
    fn contract(
        &self,
        network: &mut Network,
        nodes: &BTreeSet<NodeId>,
        output_order: Option<&[EdgeId]>,
    ) -> Result<NodeId> {
        if nodes.is_empty() {
            return Err(NetworkError::Contraction {
                message: "empty node set".to_string(),
            });
        }
        debug!(nodes = nodes.len(); "Start contracting network");

        let mut operands = Vec::new();
        let mut factor = Complex64::new(1.0, 0.0);
        for &node in nodes {
            let operand = Labelled {
                tensor: network.dense_tensor(node)?,
                labels: network.edges_of(node)?.to_vec(),
            }
            .trace_loops()?;
            match operand.tensor.scalar_value() {
                Some(value) if operand.labels.is_empty() => factor *= value,
                _ => operands.push(operand),
            }
        }

        let result = match operands.len() {
            0 => Labelled {
                tensor: DenseTensor::scalar(Complex64::new(1.0, 0.0)),
                labels: Vec::new(),
            },
            1 => operands.remove(0),
            _ => match self.options.order {
                ContractionOrder::Greedy => contract_greedy(operands)?,
                ContractionOrder::Sequential => contract_sequential(operands)?,
            },
        };
        let tensor = result.tensor.scale(factor);

        let (tensor, labels) = match output_order {
            Some(order) => {
                let perm: Option<Vec<usize>> = order
                    .iter()
                    .map(|e| result.labels.iter().position(|l| l == e))
                    .collect();
                match perm {
                    Some(perm) if order.len() == result.labels.len() => {
                        (tensor.permute(&perm)?, order.to_vec())
                    }
                    _ => {
                        return Err(NetworkError::Contraction {
                            message: format!(
                                "output order {:?} does not match open edges {:?}",
                                order, result.labels
                            ),
                        })
                    }
                }
            }
            None => (tensor, result.labels),
        };

        let node = network.absorb(nodes, tensor, &labels)?;
        debug!(rank = labels.len(); "Completed network contraction");
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ids: &[usize]) -> Vec<EdgeId> {
        // EdgeId has no public constructor; build handles through a network
        let mut net = Network::new();
        let n = net.add_node(DenseTensor::zeros(&vec![1; ids.iter().max().map_or(0, |m| m + 1)]));
        ids.iter().map(|&i| net.edge(n, i).unwrap()).collect()
    }

    #[test]
    fn test_repeated_pair() {
        let l = labels(&[0, 1, 2, 1]);
        assert_eq!(repeated_pair(&l), Some((1, 3)));
        assert_eq!(repeated_pair(&labels(&[0, 1, 2])), None);
    }

    #[test]
    fn test_trace_loops_removes_both_axes() {
        let l = labels(&[0, 1, 0]);
        let t = DenseTensor::delta(3, 1);
        let traced = Labelled {
            tensor: t,
            labels: l.clone(),
        }
        .trace_loops()
        .unwrap();
        assert_eq!(traced.labels, vec![l[1]]);
        assert_eq!(traced.tensor.dims(), vec![1]);
    }
}
