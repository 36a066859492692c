//! Error types surfaced by the core.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::node::NodeId;

/// Raised by pool selection when no node can be chosen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The pool is empty or every node has zero effective weight.
    #[error("no node of pool {pool} selected")]
    NoEligibleNode {
        /// Name of the pool that came up empty.
        pool: String,
    },
}

/// Raised when a node is constructed with an out of range weight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Base weight must lie in `[0, max]`.
    #[error("invalid node weight {weight}, expected 0..={max}")]
    InvalidWeight {
        /// The rejected weight.
        weight: i32,
        /// The configured ceiling.
        max: i32,
    },
}

/// Raised by pool membership operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A node with the same id is already a member.
    #[error("node {0} is already in the pool")]
    DuplicateNode(NodeId),

    /// No member has the given id.
    #[error("node {0} is not in the pool")]
    UnknownNode(NodeId),
}

/// Raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but holds inconsistent values.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A configured node was rejected.
    #[error("invalid node in pool {pool}: {source}")]
    Node {
        /// Pool the node belongs to.
        pool: String,
        /// Why the node was rejected.
        #[source]
        source: NodeError,
    },
}
