//! Pools of nodes sharing one selector.
//!
//! A [`Pool`] owns an ordered node list and the smooth WRR accumulators that go
//! with it. Selection holds the pool lock for the whole scan; feedback only
//! touches the chosen node's atomics; warm-up ramps are tracked per node so
//! removing a node always stops its ramp.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::WeightConfig;
use crate::domain::node::{NodeId, SharedNode};
use crate::error::{PoolError, SelectError};
use crate::load_balancer::feedback::Feedback;
use crate::load_balancer::selector::{select_smooth_weighted, Candidate};
use crate::warmup::WarmupScheduler;

/// An ordered set of nodes balanced by smooth weighted round robin.
#[derive(Debug)]
pub struct Pool {
    name: String,
    config: WeightConfig,
    feedback: Feedback,
    candidates: Mutex<Vec<Candidate>>,
    warmup: WarmupScheduler,
}

impl Pool {
    /// Create an empty pool tuned by `config`.
    pub fn new(name: impl Into<String>, config: WeightConfig) -> Self {
        Self {
            name: name.into(),
            config,
            feedback: Feedback::new(&config),
            candidates: Mutex::new(Vec::new()),
            warmup: WarmupScheduler::new(config),
        }
    }

    /// The pool's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pool's tuning.
    pub fn config(&self) -> &WeightConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Candidate>> {
        self.candidates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the pool has no members.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the members in selection order.
    pub fn nodes(&self) -> Vec<SharedNode> {
        self.lock().iter().map(|c| c.node.clone()).collect()
    }

    /// Look up a member by id.
    pub fn get(&self, id: NodeId) -> Option<SharedNode> {
        self.lock()
            .iter()
            .find(|c| c.node.id == id)
            .map(|c| c.node.clone())
    }

    /// Append a node at the end of the selection order.
    pub fn add_node(&self, node: SharedNode) -> Result<(), PoolError> {
        let mut candidates = self.lock();
        if candidates.iter().any(|c| c.node.id == node.id) {
            return Err(PoolError::DuplicateNode(node.id));
        }
        candidates.push(Candidate::new(node));
        Ok(())
    }

    /// Remove a node and stop its warm-up ramp.
    pub fn remove_node(&self, id: NodeId) -> Result<SharedNode, PoolError> {
        let node = {
            let mut candidates = self.lock();
            let index = candidates
                .iter()
                .position(|c| c.node.id == id)
                .ok_or(PoolError::UnknownNode(id))?;
            candidates.remove(index).node
        };
        self.warmup.cancel(id);
        Ok(node)
    }

    /// Pick the node for the next request.
    pub fn select(&self) -> Result<SharedNode, SelectError> {
        let selected = select_smooth_weighted(&mut self.lock());
        selected.ok_or_else(|| {
            debug!(pool = %self.name, "no eligible node");
            SelectError::NoEligibleNode {
                pool: self.name.clone(),
            }
        })
    }

    /// Report that `node` served a request.
    pub fn on_success(&self, node: &SharedNode) {
        self.feedback.on_success(node);
    }

    /// Report that `node` rejected or failed a request.
    pub fn on_reject(&self, node: &SharedNode) {
        self.feedback.on_reject(node);
    }

    /// Begin warming up a member.
    ///
    /// Returns `Ok(false)` when the node is already saturated or has been
    /// ramped before. Must be called within a tokio runtime.
    pub fn start_ramp_up(&self, id: NodeId) -> Result<bool, PoolError> {
        // Hold the pool lock until the ramp is registered, so a concurrent
        // `remove_node` always finds the entry it has to cancel.
        let candidates = self.lock();
        let node = candidates
            .iter()
            .find(|c| c.node.id == id)
            .map(|c| c.node.clone())
            .ok_or(PoolError::UnknownNode(id))?;
        Ok(self.warmup.start(node))
    }

    /// Stop a member's warm-up ramp. Returns `true` if it was still running.
    pub fn cancel_ramp_up(&self, id: NodeId) -> bool {
        self.warmup.cancel(id)
    }

    /// Whether a member is still warming up.
    pub fn is_ramping(&self, id: NodeId) -> bool {
        self.warmup.is_running(id)
    }

    /// Stop every warm-up ramp in the pool. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        self.warmup.cancel_all()
    }
}

/// A shared reference to a pool.
pub type SharedPool = Arc<Pool>;
