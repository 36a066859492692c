//! Success / reject feedback on effective weights.
//!
//! Feedback biases selection away from nodes that recently failed without
//! taking them out of rotation, and walks them back to their base weight once
//! they succeed again. Updates touch a single node and never take the pool lock.

use crate::config::WeightConfig;
use crate::domain::node::Node;

/// The caller's classification of a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The node served the request.
    Success,
    /// The node rejected or failed the request.
    Reject,
}

/// Applies request outcomes to node weights with a fixed step.
#[derive(Debug, Clone, Copy)]
pub struct Feedback {
    step: i32,
}

impl Feedback {
    /// Build a controller stepping by `fluctuate_weight`.
    pub fn new(config: &WeightConfig) -> Self {
        Self {
            step: config.fluctuate_weight,
        }
    }

    /// Raise the node's effective weight toward its base weight.
    pub fn on_success(&self, node: &Node) {
        node.weights().on_success(self.step);
    }

    /// Lower the node's effective weight, stopping short of zero.
    pub fn on_reject(&self, node: &Node) {
        node.weights().on_reject(self.step);
    }

    /// Apply an outcome.
    pub fn record(&self, node: &Node, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.on_success(node),
            Outcome::Reject => self.on_reject(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::NodeId;

    #[test]
    fn test_record_dispatches() {
        let feedback = Feedback::new(&WeightConfig::default());
        let node = Node::new(NodeId(1), "127.0.0.1:9000".parse().unwrap(), 50, 100).unwrap();

        feedback.record(&node, Outcome::Reject);
        assert_eq!(node.weights().effective_weight(), 47);
        feedback.record(&node, Outcome::Success);
        assert_eq!(node.weights().effective_weight(), 50);
    }

    #[test]
    fn test_zero_step_is_inert() {
        let config = WeightConfig {
            fluctuate_weight: 0,
            ..WeightConfig::default()
        };
        let feedback = Feedback::new(&config);
        let node = Node::new(NodeId(1), "127.0.0.1:9000".parse().unwrap(), 50, 100).unwrap();

        feedback.on_reject(&node);
        feedback.on_success(&node);
        assert_eq!(node.weights().effective_weight(), 50);
    }
}
