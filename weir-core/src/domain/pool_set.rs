//! Named collection of independently tuned pools.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::ProxyConfig;
use crate::domain::node::{Node, NodeId};
use crate::domain::pool::{Pool, SharedPool};
use crate::error::ConfigError;

/// A lock-free map from pool name to pool.
///
/// Uses `ArcSwap` so lookups on the request path never take a lock, while the
/// set of pools can still be replaced wholesale.
#[derive(Debug, Default)]
pub struct PoolSet {
    pools: ArcSwap<HashMap<String, SharedPool>>,
}

impl PoolSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every pool described by `config`.
    ///
    /// Node ids are assigned in file order, starting at 0 within each pool.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let set = Self::new();
        for pool_config in &config.pools {
            let weights = config.weights_for(pool_config);
            let pool = Pool::new(pool_config.name.clone(), weights);
            for (index, node_config) in pool_config.nodes.iter().enumerate() {
                let id = node_id(&pool_config.name, index)?;
                let node = Node::new(id, node_config.addr, node_config.weight, weights.max_weight)
                    .map_err(|source| ConfigError::Node {
                        pool: pool_config.name.clone(),
                        source,
                    })?;
                pool.add_node(Arc::new(node))
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            }
            set.insert(Arc::new(pool));
        }
        Ok(set)
    }

    /// Add or replace a pool under its own name.
    ///
    /// Returns the pool it replaced, if any. The caller owns shutting it down.
    pub fn insert(&self, pool: SharedPool) -> Option<SharedPool> {
        let mut replaced = None;
        self.pools.rcu(|current| {
            let mut next = HashMap::clone(current);
            replaced = next.insert(pool.name().to_string(), pool.clone());
            next
        });
        replaced
    }

    /// Look up a pool by name.
    pub fn get(&self, name: &str) -> Option<SharedPool> {
        self.pools.load().get(name).cloned()
    }

    /// Retrieve a snapshot of all current pools, sorted by name.
    pub fn snapshot(&self) -> Vec<SharedPool> {
        let mut pools: Vec<SharedPool> = self.pools.load().values().cloned().collect();
        pools.sort_by(|a, b| a.name().cmp(b.name()));
        pools
    }

    /// Stop the warm-up ramps of every pool. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        self.pools.load().values().map(|pool| pool.shutdown()).sum()
    }
}

fn node_id(pool: &str, index: usize) -> Result<NodeId, ConfigError> {
    u32::try_from(index)
        .map(NodeId)
        .map_err(|_| ConfigError::Invalid(format!("pool {pool} has too many nodes")))
}
