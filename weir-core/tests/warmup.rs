//! Integration tests for the warm-up ramp.
//!
//! All tests run on a paused clock, so timer ticks are deterministic.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use weir_core::warmup::{ramp_up, RampEnd};
use weir_core::{Node, NodeId, Pool, SharedNode, WeightConfig};

fn node(id: u32, weight: i32) -> SharedNode {
    let addr = format!("10.0.1.{}:80", id + 1).parse().unwrap();
    Arc::new(Node::new(NodeId(id), addr, weight, 100).unwrap())
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_ramp_converges_to_max() {
    let n = node(0, 0);
    let end = ramp_up(n.clone(), WeightConfig::default(), CancellationToken::new()).await;

    assert_eq!(end, RampEnd::Done);
    assert_eq!(n.weights().weight(), 100);
    assert_eq!(n.weights().effective_weight(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_ramp_tick_schedule() {
    let pool = Pool::new("warm", WeightConfig::default());
    let n = node(0, 0);
    pool.add_node(n.clone()).unwrap();
    assert!(pool.start_ramp_up(NodeId(0)).unwrap());

    // First tick lands at 3s.
    advance(2900).await;
    assert_eq!(n.weights().weight(), 0);
    advance(200).await;
    assert_eq!(n.weights().weight(), 5);

    // Later ticks every 1.5s.
    advance(1500).await;
    assert_eq!(n.weights().weight(), 10);
    advance(3000).await;
    assert_eq!(n.weights().weight(), 20);
    assert!(pool.is_ramping(NodeId(0)));

    // 20 ticks in total: 3s + 19 * 1.5s = 31.5s.
    advance(31_500).await;
    assert_eq!(n.weights().weight(), 100);
    assert!(!pool.is_ramping(NodeId(0)));

    // Nothing moves after saturation.
    pool.on_reject(&n);
    advance(10_000).await;
    assert_eq!(n.weights().weight(), 100);
    assert_eq!(n.weights().effective_weight(), 97);
}

#[tokio::test(start_paused = true)]
async fn test_ramp_is_not_restarted() {
    let pool = Pool::new("warm", WeightConfig::default());
    pool.add_node(node(0, 50)).unwrap();

    assert!(pool.start_ramp_up(NodeId(0)).unwrap());
    assert!(!pool.start_ramp_up(NodeId(0)).unwrap());

    advance(60_000).await;
    assert!(!pool.is_ramping(NodeId(0)));
    assert!(!pool.start_ramp_up(NodeId(0)).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_saturated_node_is_not_ramped() {
    let pool = Pool::new("warm", WeightConfig::default());
    pool.add_node(node(0, 100)).unwrap();
    assert!(!pool.start_ramp_up(NodeId(0)).unwrap());
    assert!(!pool.is_ramping(NodeId(0)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_freezes_weight() {
    let pool = Pool::new("warm", WeightConfig::default());
    let n = node(0, 0);
    pool.add_node(n.clone()).unwrap();
    pool.start_ramp_up(NodeId(0)).unwrap();

    advance(4600).await;
    assert_eq!(n.weights().weight(), 10);

    assert!(pool.cancel_ramp_up(NodeId(0)));
    assert!(!pool.cancel_ramp_up(NodeId(0)));
    assert!(!pool.is_ramping(NodeId(0)));

    advance(60_000).await;
    assert_eq!(n.weights().weight(), 10);
    assert_eq!(n.weights().effective_weight(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_remove_node_cancels_ramp() {
    let pool = Pool::new("warm", WeightConfig::default());
    let n = node(0, 0);
    pool.add_node(n.clone()).unwrap();
    pool.start_ramp_up(NodeId(0)).unwrap();

    advance(3100).await;
    let removed = pool.remove_node(NodeId(0)).unwrap();
    assert_eq!(removed.id, NodeId(0));

    advance(60_000).await;
    assert_eq!(n.weights().weight(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_tick() {
    let quit = CancellationToken::new();
    let n = node(0, 0);
    let task = tokio::spawn(ramp_up(n.clone(), WeightConfig::default(), quit.clone()));

    advance(1000).await;
    quit.cancel();

    assert_eq!(task.await.unwrap(), RampEnd::Cancelled);
    assert_eq!(n.weights().weight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pools_ramp_with_their_own_tuning() {
    let fast = Pool::new(
        "fast",
        WeightConfig {
            max_weight: 10,
            added_weight: 10,
            warmup_delay_ms: 100,
            ..WeightConfig::default()
        },
    );
    let slow = Pool::new("slow", WeightConfig::default());

    let a = Arc::new(Node::new(NodeId(0), "10.0.2.1:80".parse().unwrap(), 0, 10).unwrap());
    let b = node(0, 0);
    fast.add_node(a.clone()).unwrap();
    slow.add_node(b.clone()).unwrap();
    fast.start_ramp_up(NodeId(0)).unwrap();
    slow.start_ramp_up(NodeId(0)).unwrap();

    advance(200).await;
    assert_eq!(a.weights().weight(), 10);
    assert!(!fast.is_ramping(NodeId(0)));
    assert_eq!(b.weights().weight(), 0);
    assert!(slow.is_ramping(NodeId(0)));

    assert_eq!(slow.shutdown(), 1);
    assert!(!slow.is_ramping(NodeId(0)));
}

#[tokio::test(start_paused = true)]
async fn test_selection_follows_ramp() {
    let pool = Pool::new("warm", WeightConfig::default());
    let warm = node(0, 100);
    let cold = node(1, 0);
    pool.add_node(warm).unwrap();
    pool.add_node(cold.clone()).unwrap();
    pool.start_ramp_up(NodeId(1)).unwrap();

    // Before the first tick the cold node has no share at all.
    for _ in 0..10 {
        assert_eq!(pool.select().unwrap().id, NodeId(0));
    }

    advance(40_000).await;
    assert_eq!(cold.weights().weight(), 100);
    let picks: Vec<NodeId> = (0..200).map(|_| pool.select().unwrap().id).collect();
    let cold_picks = picks.iter().filter(|&&id| id == NodeId(1)).count();
    assert!((95..=105).contains(&cold_picks), "cold node picked {cold_picks} times");
}

#[tokio::test(start_paused = true)]
async fn test_readded_node_ramps_again() {
    let pool = Pool::new("warm", WeightConfig::default());
    pool.add_node(node(0, 0)).unwrap();
    assert!(pool.start_ramp_up(NodeId(0)).unwrap());

    advance(3100).await;
    pool.remove_node(NodeId(0)).unwrap();
    assert!(!pool.is_ramping(NodeId(0)));

    let fresh = node(0, 0);
    pool.add_node(fresh.clone()).unwrap();
    assert!(pool.start_ramp_up(NodeId(0)).unwrap());
    assert!(pool.is_ramping(NodeId(0)));

    advance(40_000).await;
    assert_eq!(fresh.weights().weight(), 100);
    assert!(!pool.is_ramping(NodeId(0)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_racing_start_leaves_no_ramp() {
    for _ in 0..200 {
        let pool = Arc::new(Pool::new("race", WeightConfig::default()));
        pool.add_node(node(0, 0)).unwrap();

        let starter = {
            let pool = pool.clone();
            tokio::task::spawn_blocking(move || pool.start_ramp_up(NodeId(0)))
        };
        let remover = {
            let pool = pool.clone();
            tokio::task::spawn_blocking(move || pool.remove_node(NodeId(0)))
        };

        // Either the start saw the node and the removal cancelled it, or the
        // start found the node already gone.
        let _ = starter.await.unwrap();
        remover.await.unwrap().unwrap();
        assert!(!pool.is_ramping(NodeId(0)));

        pool.add_node(node(0, 0)).unwrap();
        assert!(pool.start_ramp_up(NodeId(0)).unwrap());
        assert_eq!(pool.shutdown(), 1);
    }
}
