//! Background reporter logging pool weights.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use weir_core::{Pool, PoolSet};

/// Spawns a background Tokio task that periodically logs every node's weights
/// until `stop` is cancelled.
pub fn spawn_weight_reporter(
    pools: Arc<PoolSet>,
    every: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);

        // Prevent immediately ticking when spawned
        interval.tick().await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => return,
                _ = interval.tick() => report(&pools),
            }
        }
    })
}

/// Whether a selection on `pool` would fail with no eligible node.
fn has_no_eligible_node(pool: &Pool) -> bool {
    pool.nodes()
        .iter()
        .all(|node| node.weights().effective_weight() <= 0)
}

fn report(pools: &PoolSet) {
    for pool in pools.snapshot() {
        if has_no_eligible_node(&pool) {
            warn!(pool = pool.name(), nodes = pool.len(), "no eligible node in pool");
        }
        for node in pool.nodes() {
            let weights = node.weights().snapshot();
            info!(
                pool = pool.name(),
                node = %node,
                weight = weights.weight,
                effective_weight = weights.effective_weight,
                ramping = pool.is_ramping(node.id),
                "node weights"
            );
        }
    }
}
