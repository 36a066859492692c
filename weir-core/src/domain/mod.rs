//! Domain models: nodes, their weights and the pools they belong to.

pub mod node;
pub mod pool;
pub mod pool_set;
pub mod weight;
