//! Backend node models.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::weight::WeightState;
use crate::error::NodeError;

/// A unique identifier for a node within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Represents a single backend eligible for selection
#[derive(Debug)]
pub struct Node {
    /// The unique ID of the node
    pub id: NodeId,
    /// The socket address of the node
    pub addr: SocketAddr,
    /// Adaptive weights of the node
    weights: WeightState,
}

impl Node {
    /// Create a node with the given initial base weight.
    ///
    /// The weight must lie in `[0, max_weight]`.
    pub fn new(
        id: NodeId,
        addr: SocketAddr,
        initial_weight: i32,
        max_weight: i32,
    ) -> Result<Self, NodeError> {
        if !(0..=max_weight).contains(&initial_weight) {
            return Err(NodeError::InvalidWeight {
                weight: initial_weight,
                max: max_weight,
            });
        }
        Ok(Self {
            id,
            addr,
            weights: WeightState::new(initial_weight),
        })
    }

    /// The node's weight state.
    pub fn weights(&self) -> &WeightState {
        &self.weights
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.addr, self.id)
    }
}

/// A thread-safe reference to a Node.
pub type SharedNode = Arc<Node>;
