//! Smooth weighted round robin selection.
//!
//! Every call adds each candidate's effective weight to its running current
//! weight, picks the candidate with the largest current weight and then charges
//! the winner the total weight of the scan. Over `N` calls, where `N` is the sum
//! of effective weights, each candidate wins exactly its weight's share while
//! the winners stay interleaved instead of arriving in bursts.

use crate::domain::node::SharedNode;

/// A pool member together with its selection accumulator.
///
/// Candidates only ever live behind the owning pool's lock, so the accumulator
/// is never touched concurrently.
#[derive(Debug)]
pub struct Candidate {
    /// The node being balanced.
    pub node: SharedNode,
    /// Running current weight; persists across selections.
    pub current_weight: i32,
}

impl Candidate {
    /// Wrap a node with a zeroed accumulator.
    pub fn new(node: SharedNode) -> Self {
        Self {
            node,
            current_weight: 0,
        }
    }
}

/// Pick the next candidate and update every accumulator.
///
/// Ties go to the later candidate. Returns `None` when there are no
/// candidates or the total effective weight is not positive, in which case
/// the accumulators are left as they were.
pub fn select_smooth_weighted(candidates: &mut [Candidate]) -> Option<SharedNode> {
    let mut total_weight = 0;
    let mut best: Option<(usize, i32)> = None;
    for (index, candidate) in candidates.iter_mut().enumerate() {
        // Read once: the total charged below must match what was added.
        let weight = candidate.node.weights().effective_weight();
        total_weight += weight;
        candidate.current_weight += weight;
        if best.map_or(true, |(_, best_weight)| candidate.current_weight >= best_weight) {
            best = Some((index, candidate.current_weight));
        }
    }

    // Effective weights are never negative, so a non-positive total means
    // every candidate added zero and nothing moved.
    if total_weight <= 0 {
        return None;
    }

    let (index, _) = best?;
    let winner = &mut candidates[index];
    winner.current_weight -= total_weight;
    Some(winner.node.clone())
}
