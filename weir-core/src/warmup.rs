//! Warm-up ramp for newly added nodes.
//!
//! A fresh node starts at a low base weight and is raised by `added_weight` on
//! a timer until it reaches `max_weight`. The first tick waits
//! `warmup_delay_ms`, every later tick `warmup_interval_ms`. Each ramp runs as
//! its own tokio task and can be stopped through a [`CancellationToken`] when
//! the node goes offline before it is fully warmed up.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::WeightConfig;
use crate::domain::node::{NodeId, SharedNode};
use crate::domain::weight::RampStep;

/// How a ramp task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampEnd {
    /// The base weight reached `max_weight`.
    Done,
    /// The quit signal fired first.
    Cancelled,
}

/// Raise `node`'s weights until saturation or until `quit` is cancelled.
///
/// Whichever of the timer and the quit signal is ready first is handled; the
/// quit signal wins if both are.
pub async fn ramp_up(node: SharedNode, config: WeightConfig, quit: CancellationToken) -> RampEnd {
    let initial = node.weights().weight();
    info!(node = %node, weight = initial, "node weight begins to change");

    let mut interval = config.warmup_delay();
    loop {
        tokio::select! {
            biased;

            _ = quit.cancelled() => {
                info!(node = %node, weight = node.weights().weight(), "node is offline, warm-up stopped");
                return RampEnd::Cancelled;
            }

            _ = tokio::time::sleep(interval) => {
                interval = config.warmup_interval();
                match node.weights().ramp_step(config.added_weight, config.max_weight) {
                    RampStep::Growing(snapshot) => {
                        debug!(
                            node = %node,
                            weight = snapshot.weight,
                            effective_weight = snapshot.effective_weight,
                            "node weight stepped"
                        );
                    }
                    RampStep::Saturated(snapshot) => {
                        info!(node = %node, "node weight changed: {}->{}", initial, snapshot.weight);
                        return RampEnd::Done;
                    }
                }
            }
        }
    }
}

/// A running (or finished) ramp and the token that stops it.
#[derive(Debug)]
struct RampHandle {
    quit: CancellationToken,
    task: JoinHandle<RampEnd>,
}

/// Tracks one ramp task per node.
///
/// An entry stays in place after its ramp finishes, so a node is warmed up at
/// most once while it is a member. Cancelling removes the entry, which makes
/// the quit signal fire exactly once per node.
#[derive(Debug)]
pub struct WarmupScheduler {
    config: WeightConfig,
    tasks: DashMap<NodeId, RampHandle>,
}

impl WarmupScheduler {
    /// Create an empty scheduler using `config` for every ramp.
    pub fn new(config: WeightConfig) -> Self {
        Self {
            config,
            tasks: DashMap::new(),
        }
    }

    /// Spawn the ramp task for `node`.
    ///
    /// Returns `false` when the node already has a ramp (running or finished)
    /// or is already at `max_weight`. Must be called within a tokio runtime.
    pub fn start(&self, node: SharedNode) -> bool {
        if node.weights().weight() >= self.config.max_weight {
            return false;
        }
        match self.tasks.entry(node.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let quit = CancellationToken::new();
                let task = tokio::spawn(ramp_up(node, self.config, quit.clone()));
                slot.insert(RampHandle { quit, task });
                true
            }
        }
    }

    /// Stop the ramp of `id` and forget it.
    ///
    /// Returns `true` if a ramp was still running when the signal was sent.
    pub fn cancel(&self, id: NodeId) -> bool {
        match self.tasks.remove(&id) {
            Some((_, ramp)) => {
                let running = !ramp.task.is_finished();
                ramp.quit.cancel();
                running
            }
            None => false,
        }
    }

    /// Stop every ramp. Returns how many were still running.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<NodeId> = self.tasks.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Whether `id` has a ramp that has not finished yet.
    pub fn is_running(&self, id: NodeId) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|ramp| !ramp.task.is_finished())
    }
}

impl Drop for WarmupScheduler {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.quit.cancel();
        }
    }
}
