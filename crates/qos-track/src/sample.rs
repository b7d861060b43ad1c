// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample model and outbound sequence numbering.
//!
//! A [`Sample`] is one timestamped, sequenced unit of data on a channel. It is
//! immutable once built and moves by value through the inbound pipeline
//! (tracker -> window -> consumer).

use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant as nanoseconds since the Unix epoch.
///
/// Arithmetic with [`Duration`] saturates instead of wrapping, so lease
/// comparisons never panic on skewed clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Current system time. Clocks before the epoch read as [`Timestamp::ZERO`].
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self` (zero if `earlier` is later).
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let rhs = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        let rhs = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_sub(rhs))
    }
}

/// One unit of data delivered over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Producer-assigned sequence number.
    pub sequence_number: u32,
    /// Name of the producer that wrote the sample.
    pub producer_id: String,
    /// Ownership strength the producer writes with (exclusive channels only).
    pub strength: Option<u32>,
    /// Critical samples survive a producer pause.
    pub is_critical: bool,
    pub payload: Vec<u8>,
    pub received_at: Timestamp,
}

impl Sample {
    /// Create a non-critical sample with an empty payload, stamped now.
    pub fn new(sequence_number: u32, producer_id: impl Into<String>) -> Self {
        Self {
            sequence_number,
            producer_id: producer_id.into(),
            strength: None,
            is_critical: false,
            payload: Vec::new(),
            received_at: Timestamp::now(),
        }
    }

    #[must_use]
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = Some(strength);
        self
    }

    #[must_use]
    pub fn critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub fn received_at(mut self, at: Timestamp) -> Self {
        self.received_at = at;
        self
    }
}

/// Outbound sequence numbering for one producer.
///
/// Numbers start at 0 and every `critical_every`-th number (0, N, 2N, ...) is
/// flagged critical. Thread-safe via `AtomicU32`; `next()` may be called from
/// several threads without coordination.
///
/// ```
/// use qos_track::SampleSequencer;
///
/// let seq = SampleSequencer::new(5);
/// let first = seq.next("Publisher", b"Message #0".to_vec());
/// assert_eq!(first.sequence_number, 0);
/// assert!(first.is_critical);
/// assert!(!seq.next("Publisher", Vec::new()).is_critical);
/// ```
#[derive(Debug)]
pub struct SampleSequencer {
    next: AtomicU32,
    critical_every: u32,
}

impl SampleSequencer {
    /// Default critical cadence: every fifth message.
    pub const DEFAULT_CRITICAL_EVERY: u32 = 5;

    /// `critical_every == 0` disables critical flagging.
    pub fn new(critical_every: u32) -> Self {
        Self {
            next: AtomicU32::new(0),
            critical_every,
        }
    }

    /// Assign the next sequence number.
    #[inline]
    pub fn next_number(&self) -> u32 {
        // fetch_add returns the OLD value, which is the number to use
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The number the next call to `next_number()` will hand out.
    #[inline]
    pub fn current(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }

    pub fn is_critical(&self, sequence_number: u32) -> bool {
        self.critical_every != 0 && sequence_number % self.critical_every == 0
    }

    /// Build the next sample for `producer_id`, stamped now.
    pub fn next(&self, producer_id: &str, payload: Vec<u8>) -> Sample {
        let seq = self.next_number();
        Sample::new(seq, producer_id)
            .critical(self.is_critical(seq))
            .with_payload(payload)
    }
}

impl Default for SampleSequencer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CRITICAL_EVERY)
    }
}
