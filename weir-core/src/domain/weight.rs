//! Adaptive per-node weights.
//!
//! A [`WeightState`] holds the nominal (base) weight of a node and the effective
//! weight actually used for selection. Both are readable without locking so the
//! selector and the feedback path never wait on each other. Warm-up writes go
//! through a per-node lock so a base weight change and its matching effective
//! weight change are applied as one step.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Point-in-time copy of a node's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightSnapshot {
    /// Nominal weight, raised during warm-up.
    pub weight: i32,
    /// Weight used by selection, nudged by feedback.
    pub effective_weight: i32,
}

/// Outcome of a single warm-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampStep {
    /// The base weight is still below the ceiling.
    Growing(WeightSnapshot),
    /// The base weight reached the ceiling; no further steps are needed.
    Saturated(WeightSnapshot),
}

/// The mutable weight data of one node.
#[derive(Debug)]
pub struct WeightState {
    /// Base weight. Only written while `ramp_lock` is held.
    weight: AtomicI32,

    /// Effective weight. Updated with compare-and-swap by feedback and warm-up.
    effective_weight: AtomicI32,

    /// Serialises warm-up writers of the weight pair.
    ramp_lock: Mutex<()>,
}

impl WeightState {
    /// Create a weight state whose effective weight starts at `weight`.
    ///
    /// Range checking is done by [`Node::new`](crate::domain::node::Node::new).
    pub fn new(weight: i32) -> Self {
        Self {
            weight: AtomicI32::new(weight),
            effective_weight: AtomicI32::new(weight),
            ramp_lock: Mutex::new(()),
        }
    }

    /// Read the base weight.
    pub fn weight(&self) -> i32 {
        self.weight.load(Ordering::Acquire)
    }

    /// Read the effective weight.
    pub fn effective_weight(&self) -> i32 {
        self.effective_weight.load(Ordering::Acquire)
    }

    /// Read both weights.
    pub fn snapshot(&self) -> WeightSnapshot {
        WeightSnapshot {
            weight: self.weight(),
            effective_weight: self.effective_weight(),
        }
    }

    /// Move the effective weight one `step` toward the base weight.
    ///
    /// Once within `step` of the base weight the effective weight snaps to it
    /// exactly, so it never overshoots.
    pub fn on_success(&self, step: i32) {
        // The closure always yields a value, so this cannot fail.
        self.effective_weight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let weight = self.weight();
                if current < weight - step {
                    Some(current + step)
                } else {
                    Some(weight)
                }
            })
            .ok();
    }

    /// Move the effective weight one `step` down.
    ///
    /// Below `step` the effective weight is left alone, so it never goes negative.
    pub fn on_reject(&self, step: i32) {
        // `Err` means the floor held and nothing was written.
        self.effective_weight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current >= step).then(|| current - step)
            })
            .ok();
    }

    /// Add `added` to both weights, clamping the base weight at `max`.
    ///
    /// The effective weight is clamped to the new base weight.
    pub fn ramp_step(&self, added: i32, max: i32) -> RampStep {
        let _guard = self.ramp_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let weight = self.weight().saturating_add(added).min(max);
        self.weight.store(weight, Ordering::Release);

        let effective_weight = match self.effective_weight.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |current| Some(current.saturating_add(added).min(weight)),
        ) {
            Ok(previous) | Err(previous) => previous.saturating_add(added).min(weight),
        };

        let snapshot = WeightSnapshot {
            weight,
            effective_weight,
        };
        if weight >= max {
            RampStep::Saturated(snapshot)
        } else {
            RampStep::Growing(snapshot)
        }
    }
}
