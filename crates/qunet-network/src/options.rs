//! Options for network contraction.
//!
//! Provides:
//! - [`ContractionOrder`]: How the pairwise contraction order is chosen
//! - [`ContractionOptions`]: Options for [`GreedyContractor`](crate::GreedyContractor)

/// Strategy for choosing the pairwise contraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContractionOrder {
    /// Greedy order from omeco, minimizing intermediate sizes.
    #[default]
    Greedy,
    /// Fold the operands left to right in node order.
    Sequential,
}

/// Options for network contraction.
///
/// # Builder Pattern
///
/// ```
/// use qunet_network::{ContractionOptions, ContractionOrder};
///
/// let options = ContractionOptions::default().with_optimizer(ContractionOrder::Greedy);
/// assert_eq!(options.order, ContractionOrder::Greedy);
/// assert_eq!(options.sequential().order, ContractionOrder::Sequential);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractionOptions {
    /// How the pairwise order is chosen
    pub order: ContractionOrder,
}

impl ContractionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contraction order strategy.
    pub fn with_optimizer(mut self, order: ContractionOrder) -> Self {
        self.order = order;
        self
    }

    /// Use the plain left-to-right order.
    pub fn sequential(mut self) -> Self {
        self.order = ContractionOrder::Sequential;
        self
    }
}
