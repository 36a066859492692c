//! Weir Core functionality.
//!
//! This crate contains the configuration, domain models and selection primitives
//! that let Weir pick a backend node for every outgoing request: smooth weighted
//! round robin over adaptive weights, success/reject feedback and a timed warm-up
//! ramp for freshly added nodes.

pub mod config;
pub mod domain;
pub mod error;
pub mod load_balancer;
pub mod warmup;

pub use config::{PoolConfig, ProxyConfig, WeightConfig};
pub use domain::node::{Node, NodeId, SharedNode};
pub use domain::pool::{Pool, SharedPool};
pub use domain::pool_set::PoolSet;
pub use domain::weight::{WeightSnapshot, WeightState};
pub use error::{ConfigError, NodeError, PoolError, SelectError};
