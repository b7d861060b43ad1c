// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gap and duplicate detection for reliable channels.
//!
//! Reader-side observer that audits an inbound sequence: which numbers are
//! missing between the lowest and highest ever received, and how far the
//! stream is contiguous. It never requests retransmission; that stays the
//! transport's job.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use crate::sample::Sample;

/// Snapshot of the gap state after an observation.
///
/// `missing` is held as sorted, disjoint, non-adjacent half-open ranges; it is
/// always a subset of `[first_seen, last_seen]` and never contains a received
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapReport {
    /// Lowest sequence number received so far.
    pub first_seen: u32,
    /// Highest sequence number received so far.
    pub last_seen: u32,
    missing: Vec<Range<u32>>,
}

impl GapReport {
    /// Missing sequence numbers in ascending order.
    pub fn missing(&self) -> impl Iterator<Item = u32> + '_ {
        self.missing.iter().flat_map(Clone::clone)
    }

    /// Missing numbers compressed into contiguous `[start..end)` ranges.
    pub fn missing_ranges(&self) -> &[Range<u32>] {
        &self.missing
    }

    pub fn is_missing(&self, seq: u32) -> bool {
        gap_index(&self.missing, seq).is_some()
    }

    pub fn total_missing(&self) -> u64 {
        self.missing.iter().map(|r| u64::from(r.end - r.start)).sum()
    }

    pub fn has_gaps(&self) -> bool {
        !self.missing.is_empty()
    }
}

impl fmt::Display for GapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "first={} last={} missing=",
            self.first_seen, self.last_seen
        )?;
        if self.missing.is_empty() {
            return write!(f, "none");
        }
        for (i, range) in self.missing.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if range.end - range.start == 1 {
                write!(f, "{}", range.start)?;
            } else {
                write!(f, "{}-{}", range.start, range.end - 1)?;
            }
        }
        Ok(())
    }
}

/// Index of the gap containing `seq` in sorted, disjoint `gaps`.
fn gap_index(gaps: &[Range<u32>], seq: u32) -> Option<usize> {
    let idx = gaps.partition_point(|r| r.end <= seq);
    gaps.get(idx).filter(|r| r.contains(&seq)).map(|_| idx)
}

/// Sequence tracker for an inbound reliable channel.
///
/// # Algorithm
///
/// The received set is never stored: it is `[min, max]` minus the gap ranges.
/// On `observe(seq)`:
/// 1. `seq > max` -> new gap `[max+1..seq)` (if non-empty), `max = seq`
/// 2. `seq < min` -> new gap `[seq+1..min)` (if non-empty), `min = seq`
/// 3. otherwise -> fill `seq` out of its gap, or duplicate (no change)
///
/// The continuous low-water mark starts at `first - 1` on the first
/// observation and then advances through contiguous received numbers.
///
/// # Example
///
/// ```
/// use qos_track::SequenceTracker;
///
/// let mut tracker = SequenceTracker::new();
/// for seq in [1, 2, 4, 5, 7] {
///     tracker.observe(seq);
/// }
/// let report = tracker.report().expect("observed");
/// assert_eq!(report.missing().collect::<Vec<_>>(), vec![3, 6]);
/// assert_eq!((report.first_seen, report.last_seen), (1, 7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    /// `(min, max)` of received numbers; `None` until the first observation.
    bounds: Option<(u32, u32)>,
    /// Sorted, merged gap ranges inside `bounds`.
    gaps: Vec<Range<u32>>,
    /// One past the continuous low-water mark (u64: may reach `u32::MAX + 1`).
    next_expected: u64,
    /// Critical sequence numbers received (criticality fixed on first sight).
    critical: BTreeSet<u32>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `seq` and return the recomputed gap report.
    ///
    /// Duplicates are idempotent: they leave state and report unchanged.
    pub fn observe(&mut self, seq: u32) -> GapReport {
        self.insert(seq);
        self.snapshot()
    }

    /// Observe a full sample, remembering whether it was critical.
    pub fn observe_sample(&mut self, sample: &Sample) -> GapReport {
        let seq = sample.sequence_number;
        let is_new = self.insert(seq);
        if is_new && sample.is_critical {
            self.critical.insert(seq);
        }
        self.snapshot()
    }

    /// Current report without observing, `None` before the first sample.
    pub fn report(&self) -> Option<GapReport> {
        self.bounds.map(|_| self.snapshot())
    }

    /// Highest `n` such that every tracked number up to `n` was received.
    ///
    /// Numbers below the first observation count as "not yet tracked". Returns
    /// `None` before any observation.
    pub fn low_water_mark(&self) -> Option<u32> {
        self.bounds?;
        self.next_expected
            .checked_sub(1)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Number of distinct sequence numbers received.
    pub fn received_count(&self) -> u64 {
        match self.bounds {
            None => 0,
            Some((min, max)) => {
                let span = u64::from(max - min) + 1;
                let missing: u64 = self.gaps.iter().map(|r| u64::from(r.end - r.start)).sum();
                span - missing
            }
        }
    }

    /// Whether `seq` has been received.
    pub fn contains(&self, seq: u32) -> bool {
        match self.bounds {
            Some((min, max)) if (min..=max).contains(&seq) => gap_index(&self.gaps, seq).is_none(),
            _ => false,
        }
    }

    /// Critical sequence numbers received so far, ascending.
    pub fn critical_received(&self) -> impl Iterator<Item = u32> + '_ {
        self.critical.iter().copied()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Insert `seq`; returns `false` for a duplicate.
    fn insert(&mut self, seq: u32) -> bool {
        let Some((min, max)) = self.bounds else {
            self.bounds = Some((seq, seq));
            self.next_expected = u64::from(seq) + 1;
            return true;
        };

        if seq > max {
            if seq > max + 1 {
                self.gaps.push(max + 1..seq);
            }
            self.bounds = Some((min, seq));
        } else if seq < min {
            if seq + 1 < min {
                self.gaps.insert(0, seq + 1..min);
            }
            self.bounds = Some((seq, max));
        } else if !self.fill(seq) {
            return false;
        }

        self.advance_low_water_mark();
        true
    }

    /// Remove `seq` from its gap, splitting the range; `false` if not missing.
    fn fill(&mut self, seq: u32) -> bool {
        let Some(idx) = gap_index(&self.gaps, seq) else {
            return false;
        };
        let gap = self.gaps.remove(idx);
        let mut at = idx;
        if gap.start < seq {
            self.gaps.insert(at, gap.start..seq);
            at += 1;
        }
        if seq + 1 < gap.end {
            self.gaps.insert(at, seq + 1..gap.end);
        }
        tracing::debug!(seq, remaining = self.gaps.len(), "gap filled");
        true
    }

    fn advance_low_water_mark(&mut self) {
        let Some((_, max)) = self.bounds else {
            return;
        };
        let max_next = u64::from(max) + 1;
        if self.next_expected >= max_next {
            return;
        }
        // Stop at the first gap at or after the current mark
        let idx = self
            .gaps
            .partition_point(|r| u64::from(r.start) < self.next_expected);
        self.next_expected = self.gaps.get(idx).map_or(max_next, |r| u64::from(r.start));
    }

    fn snapshot(&self) -> GapReport {
        let (first_seen, last_seen) = self.bounds.unwrap_or((0, 0));
        GapReport {
            first_seen,
            last_seen,
            missing: self.gaps.clone(),
        }
    }
}
