// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded history window for consumer-side retention.
//!
//! Enforces the HISTORY policy via FIFO eviction for KEEP_LAST, or insert
//! rejection for KEEP_ALL (older history wins over newer arrivals).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sample::Sample;

/// History retention policy.
///
/// Serialized externally tagged, e.g. `history = { keep_last = 5 }` in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Retain the `depth` most recent samples, evicting the oldest.
    KeepLast(u32),
    /// Retain every sample up to `capacity`, then reject new ones.
    KeepAll(u32),
}

impl HistoryPolicy {
    pub const DEFAULT_KEEP_LAST: u32 = 5;
    pub const DEFAULT_KEEP_ALL: u32 = 30;

    /// Maximum number of samples the policy retains.
    pub fn limit(self) -> u32 {
        match self {
            HistoryPolicy::KeepLast(depth) => depth,
            HistoryPolicy::KeepAll(capacity) => capacity,
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        HistoryPolicy::KeepLast(Self::DEFAULT_KEEP_LAST)
    }
}

/// Bounded, policy-driven sample buffer.
///
/// Exactly one policy is active at a time. Contents are always in arrival
/// order, oldest first.
///
/// # Example
///
/// ```
/// use qos_track::{HistoryPolicy, HistoryWindow};
///
/// let mut window = HistoryWindow::new(HistoryPolicy::KeepLast(3));
/// for n in 1..=5 {
///     window.append(n).expect("KEEP_LAST never rejects");
/// }
/// assert_eq!(window.snapshot(None), vec![3, 4, 5]);
/// assert_eq!(window.snapshot(Some(2)), vec![4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryWindow<T = Sample> {
    policy: HistoryPolicy,
    buffer: VecDeque<T>,
    total_appended: u64,
    total_rejected: u64,
}

impl<T: Clone> HistoryWindow<T> {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            policy,
            buffer: VecDeque::with_capacity(policy.limit().min(1024) as usize),
            total_appended: 0,
            total_rejected: 0,
        }
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Switch retention policy.
    ///
    /// Buffered samples are kept in arrival order up to the new limit; any
    /// excess is dropped oldest-first. Returns the number of samples dropped.
    pub fn set_policy(&mut self, policy: HistoryPolicy) -> usize {
        let limit = policy.limit() as usize;
        let excess = self.buffer.len().saturating_sub(limit);
        self.buffer.drain(..excess);
        self.policy = policy;
        tracing::info!(?policy, dropped = excess, "history policy switched");
        excess
    }

    /// Append a sample under the active policy.
    ///
    /// - KEEP_LAST: always accepted; returns the evicted oldest sample, if any.
    ///   With depth 0 the appended sample itself comes straight back.
    /// - KEEP_ALL: rejected with [`Error::CapacityExhausted`] once full, leaving
    ///   the buffer unchanged.
    pub fn append(&mut self, sample: T) -> Result<Option<T>> {
        match self.policy {
            HistoryPolicy::KeepLast(0) => {
                self.total_appended += 1;
                Ok(Some(sample))
            }
            HistoryPolicy::KeepLast(depth) => {
                self.total_appended += 1;
                self.buffer.push_back(sample);
                if self.buffer.len() > depth as usize {
                    Ok(self.buffer.pop_front())
                } else {
                    Ok(None)
                }
            }
            HistoryPolicy::KeepAll(capacity) => {
                if self.buffer.len() >= capacity as usize {
                    self.total_rejected += 1;
                    return Err(Error::CapacityExhausted { capacity });
                }
                self.total_appended += 1;
                self.buffer.push_back(sample);
                Ok(None)
            }
        }
    }

    /// The most recent `limit` samples (all if `None`), oldest first.
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<T> {
        let take = limit.map_or(self.buffer.len(), |l| l.min(self.buffer.len()));
        self.buffer
            .iter()
            .skip(self.buffer.len() - take)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Accepted appends since creation (including ones later evicted).
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// Appends rejected by KEEP_ALL capacity.
    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl<T: Clone> Default for HistoryWindow<T> {
    fn default() -> Self {
        Self::new(HistoryPolicy::default())
    }
}
