//! In-place contraction and dense evaluation.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use qunet_backend::DenseTensor;
use qunet_network::{Contractor, EdgeId, GreedyContractor};

use super::{eliminate_identities, QuOperator};
use crate::error::{QuantumError, Result};

fn remap(map: &BTreeMap<EdgeId, EdgeId>, edge: EdgeId, role: &str) -> Result<EdgeId> {
    map.get(&edge)
        .copied()
        .ok_or_else(|| QuantumError::InvalidNetwork {
            message: format!("{} edge {:?} lost during identity elimination", role, edge),
        })
}

impl QuOperator {
    /// Contract the network to a single node in place, using the default
    /// [`GreedyContractor`].
    ///
    /// This is the only operation that mutates its receiver. Edge handles
    /// held by the operator stay valid; they may be renamed when identity
    /// nodes are spliced out, and the accessors report the new names.
    pub fn contract(&mut self, output_order: Option<&[EdgeId]>) -> Result<&mut Self> {
        self.contract_with(&GreedyContractor::default(), output_order)
    }

    /// Contract the network in place with the given contractor.
    ///
    /// `output_order` names the final axis order using the operator's edges
    /// as they were before the call.
    pub fn contract_with<C: Contractor>(
        &mut self,
        contractor: &C,
        output_order: Option<&[EdgeId]>,
    ) -> Result<&mut Self> {
        let nodes = self.nodes()?;
        let elimination = eliminate_identities(&mut self.network, &nodes)?;
        let edges = &elimination.dangling_edges;

        self.out_edges = self
            .out_edges
            .iter()
            .map(|&e| remap(edges, e, "output"))
            .collect::<Result<_>>()?;
        self.in_edges = self
            .in_edges
            .iter()
            .map(|&e| remap(edges, e, "input"))
            .collect::<Result<_>>()?;
        self.ignore_edges = self
            .ignore_edges
            .iter()
            .map(|&e| remap(edges, e, "ignored"))
            .collect::<Result<_>>()?;
        let mut refs: BTreeSet<_> = self
            .ref_nodes
            .iter()
            .filter_map(|n| elimination.nodes.get(n).copied())
            .filter(|&n| self.network.contains_node(n))
            .collect();
        refs.extend(elimination.loop_scalars.iter().copied());
        self.ref_nodes = refs;
        self.check_network()?;

        let order = match output_order {
            Some(order) => Some(
                order
                    .iter()
                    .map(|&e| {
                        edges
                            .get(&e)
                            .copied()
                            .ok_or_else(|| QuantumError::InvalidArgument {
                                message: format!("{:?} is not a dangling edge of the operator", e),
                            })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        let nodes = self.nodes()?;
        debug!(
            nodes = nodes.len(),
            eliminated = elimination.nodes.iter().filter(|(k, v)| k != v).count();
            "Contracting operator network"
        );
        let node = contractor.contract(&mut self.network, &nodes, order.as_deref())?;
        self.ref_nodes = BTreeSet::from([node]);
        Ok(self)
    }

    /// Contract in place and return the resulting tensor.
    ///
    /// Without an explicit order the axes are ignored edges, then output
    /// edges, then input edges.
    ///
    /// # Errors
    /// `ContractionError` if more than one node remains.
    pub fn eval(&mut self, output_order: Option<&[EdgeId]>) -> Result<DenseTensor> {
        self.eval_with(&GreedyContractor::default(), output_order)
    }

    /// [`eval`](Self::eval) with the given contractor.
    pub fn eval_with<C: Contractor>(
        &mut self,
        contractor: &C,
        output_order: Option<&[EdgeId]>,
    ) -> Result<DenseTensor> {
        let default_order: Vec<EdgeId>;
        let order = match output_order {
            Some(order) => order,
            None => {
                default_order = self
                    .ignore_edges
                    .iter()
                    .chain(&self.out_edges)
                    .chain(&self.in_edges)
                    .copied()
                    .collect();
                &default_order
            }
        };
        self.contract_with(contractor, Some(order))?;

        let nodes = self.nodes()?;
        let mut iter = nodes.iter();
        match (iter.next(), iter.next()) {
            (Some(&node), None) => Ok(self.network.dense_tensor(node)?),
            _ => Err(QuantumError::ContractionError {
                message: format!("contraction left {} nodes instead of one", nodes.len()),
            }),
        }
    }

    /// [`eval`](Self::eval), reshaped to `(prod(out_space), prod(in_space))`.
    ///
    /// Scalars become 1x1 matrices.
    pub fn eval_matrix(&mut self, output_order: Option<&[EdgeId]>) -> Result<DenseTensor> {
        let tensor = self.eval(output_order)?;
        let rows: usize = self.out_space()?.iter().product();
        let cols: usize = self.in_space()?.iter().product();
        Ok(tensor.reshape(&[rows, cols])?)
    }
}
