// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exclusive-ownership eligibility gating.
//!
//! Several producers publish on one channel, each with a numeric strength.
//! The consumer decides which strengths are currently *active*; a sample is
//! authoritative iff its strength is in that set.
//!
//! # Eligibility, not exclusivity
//!
//! The arbiter never picks a single winner. When several active strengths
//! (or several producers sharing one strength) publish concurrently, every
//! one of their samples is authoritative. Final exclusivity (the highest
//! strength writer owning the instance) is resolved by the transport's
//! EXCLUSIVE ownership, not here. Whether this layer should instead pick
//! "highest active strength, ties to the most recent update" is an open
//! question; [`OwnershipArbiter::highest_active_strength`] is informational
//! and does not affect [`OwnershipArbiter::is_authoritative`].
//!
//! # Concurrency
//!
//! One `parking_lot::Mutex` guards the active set and the producer table. It is
//! held only for a single check or toggle, so a command thread can toggle while
//! the data thread gates samples. Share it as `Arc<OwnershipArbiter>`.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::sample::Sample;

/// A producer seen on an exclusive channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRecord {
    pub producer_id: String,
    pub strength: u32,
    /// Whether `strength` is currently in the active set.
    pub active: bool,
}

/// Outcome of an `activate` / `deactivate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The producer had been registered before the toggle.
    Known,
    /// The producer was never seen. The strength is toggled anyway so that a
    /// later producer with that strength matches.
    UnknownProducer(String),
}

impl Activation {
    /// Escalate an unknown producer into [`Error::UnknownProducer`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Activation::Known => Ok(()),
            Activation::UnknownProducer(id) => Err(Error::UnknownProducer(id)),
        }
    }
}

#[derive(Debug, Default)]
struct ArbiterState {
    active: BTreeSet<u32>,
    /// producer id -> strength
    producers: BTreeMap<String, u32>,
}

impl ArbiterState {
    fn record(&self, producer_id: &str, strength: u32) -> ProducerRecord {
        ProducerRecord {
            producer_id: producer_id.to_string(),
            strength,
            active: self.active.contains(&strength),
        }
    }

    fn outcome(&self, producer_id: &str) -> Activation {
        if self.producers.contains_key(producer_id) {
            Activation::Known
        } else {
            Activation::UnknownProducer(producer_id.to_string())
        }
    }
}

/// Tracks the ActiveStrengths set for one exclusive channel.
///
/// # Example
///
/// ```
/// use qos_track::OwnershipArbiter;
///
/// let arbiter = OwnershipArbiter::new();
/// arbiter.register_producer("Manual Steering", 10);
/// arbiter.register_producer("Emergency Controller", 30);
///
/// assert!(!arbiter.is_authoritative("Manual Steering", 10)); // empty set
/// arbiter.activate("Manual Steering", 10);
/// assert!(arbiter.is_authoritative("Manual Steering", 10));
/// assert!(!arbiter.is_authoritative("Emergency Controller", 30));
/// ```
#[derive(Debug, Default)]
pub struct OwnershipArbiter {
    state: Mutex<ArbiterState>,
}

impl OwnershipArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or update) a producer's strength.
    pub fn register_producer(&self, producer_id: &str, strength: u32) -> ProducerRecord {
        let mut state = self.state.lock();
        let previous = state.producers.insert(producer_id.to_string(), strength);
        if previous != Some(strength) {
            tracing::debug!(producer = producer_id, strength, "producer registered");
        }
        state.record(producer_id, strength)
    }

    /// Make `strength` eligible. Idempotent.
    pub fn activate(&self, producer_id: &str, strength: u32) -> Activation {
        let mut state = self.state.lock();
        if state.active.insert(strength) {
            tracing::debug!(producer = producer_id, strength, "strength activated");
        }
        let outcome = state.outcome(producer_id);
        if let Activation::UnknownProducer(_) = outcome {
            tracing::debug!(
                producer = producer_id,
                strength,
                "activation for unseen producer, strength registered"
            );
        }
        outcome
    }

    /// Remove `strength` from the eligible set. Idempotent.
    ///
    /// Every producer sharing the strength loses eligibility with it.
    pub fn deactivate(&self, producer_id: &str, strength: u32) -> Activation {
        let mut state = self.state.lock();
        if state.active.remove(&strength) {
            tracing::debug!(producer = producer_id, strength, "strength deactivated");
        }
        state.outcome(producer_id)
    }

    /// Flip `strength` and report whether it is now active.
    pub fn toggle(&self, producer_id: &str, strength: u32) -> bool {
        let mut state = self.state.lock();
        let now_active = if state.active.remove(&strength) {
            false
        } else {
            state.active.insert(strength)
        };
        tracing::debug!(producer = producer_id, strength, now_active, "strength toggled");
        now_active
    }

    /// True iff `strength` is currently active. The producer id is not
    /// consulted: eligibility is by strength only.
    pub fn is_authoritative(&self, _producer_id: &str, strength: u32) -> bool {
        self.state.lock().active.contains(&strength)
    }

    /// Gate a sample, resolving its strength from the producer table when the
    /// sample carries none. Samples with no resolvable strength are never
    /// authoritative.
    pub fn is_sample_authoritative(&self, sample: &Sample) -> bool {
        let state = self.state.lock();
        let strength = sample
            .strength
            .or_else(|| state.producers.get(&sample.producer_id).copied());
        strength.is_some_and(|s| state.active.contains(&s))
    }

    pub fn strength_of(&self, producer_id: &str) -> Option<u32> {
        self.state.lock().producers.get(producer_id).copied()
    }

    /// Sorted snapshot of ActiveStrengths.
    pub fn active_strengths(&self) -> Vec<u32> {
        self.state.lock().active.iter().copied().collect()
    }

    pub fn highest_active_strength(&self) -> Option<u32> {
        self.state.lock().active.last().copied()
    }

    /// Snapshot of every registered producer, sorted by id.
    pub fn producers(&self) -> Vec<ProducerRecord> {
        let state = self.state.lock();
        state
            .producers
            .iter()
            .map(|(id, &strength)| state.record(id, strength))
            .collect()
    }
}
