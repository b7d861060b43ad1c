// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-channel QoS selection.
//!
//! A [`QosProfile`] decides which tracking components are attached to a
//! channel:
//!
//! | Option | Attaches |
//! |--------|----------|
//! | `Reliability::Reliable` | [`SequenceTracker`](crate::SequenceTracker) |
//! | `history` (always) | [`HistoryWindow`](crate::HistoryWindow) |
//! | `Ownership::Exclusive(_)` | [`OwnershipArbiter`] |
//!
//! # Examples
//!
//! ```
//! use qos_track::qos::{Ownership, QosProfile, Reliability};
//! use qos_track::HistoryPolicy;
//!
//! let qos = QosProfile::reliable().keep_all(30).exclusive(20);
//! assert_eq!(qos.reliability, Reliability::Reliable);
//! assert_eq!(qos.history, HistoryPolicy::KeepAll(30));
//! assert_eq!(qos.ownership, Ownership::Exclusive(20));
//! ```

pub mod ownership;

use serde::{Deserialize, Serialize};

pub use crate::history::HistoryPolicy;
pub use ownership::{Activation, OwnershipArbiter, ProducerRecord};

/// Delivery guarantee requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Transport retries lost samples; the layer audits gaps.
    #[default]
    Reliable,
    /// Fire-and-forget; no gap auditing.
    BestEffort,
}

/// Ownership mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Every producer's samples are delivered.
    #[default]
    Shared,
    /// Only samples from active strengths are authoritative. On the producer
    /// side the value is the strength this producer writes with.
    Exclusive(u32),
}

/// QoS configuration object for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QosProfile {
    #[serde(default)]
    pub reliability: Reliability,
    #[serde(default)]
    pub history: HistoryPolicy,
    #[serde(default)]
    pub ownership: Ownership,
}

impl QosProfile {
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::default()
        }
    }

    pub fn best_effort() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn keep_last(mut self, depth: u32) -> Self {
        self.history = HistoryPolicy::KeepLast(depth);
        self
    }

    #[must_use]
    pub fn keep_all(mut self, capacity: u32) -> Self {
        self.history = HistoryPolicy::KeepAll(capacity);
        self
    }

    #[must_use]
    pub fn exclusive(mut self, strength: u32) -> Self {
        self.ownership = Ownership::Exclusive(strength);
        self
    }

    #[must_use]
    pub fn shared(mut self) -> Self {
        self.ownership = Ownership::Shared;
        self
    }

    pub fn tracks_gaps(&self) -> bool {
        self.reliability == Reliability::Reliable
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.ownership, Ownership::Exclusive(_))
    }
}
