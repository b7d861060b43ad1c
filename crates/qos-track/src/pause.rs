// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Producer-side pause/resume buffering.
//!
//! While paused, critical samples are queued and everything else is dropped.
//! Once resumed, the *next* `offer` flushes the queue in FIFO order before
//! sending the new sample, so queued critical traffic is never overtaken.
//!
//! ```text
//! pause
//! offer(#1 critical)   -> Queued        queue: [#1]
//! offer(#2)            -> Dropped       queue: [#1]
//! offer(#3 critical)   -> Queued        queue: [#1, #3]
//! resume                                (nothing sent yet)
//! offer(#4)            -> Sent          wire:  #1, #3, #4
//! ```

use std::collections::VecDeque;

use crate::error::Result;
use crate::sample::Sample;

/// Outcome of [`PauseBuffer::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Forwarded to the transport (after any queued samples).
    Sent,
    /// Paused: critical sample held for replay.
    Queued,
    /// Paused: non-critical sample discarded, never retried.
    Dropped,
}

/// Pause/resume gate in front of a publish call.
///
/// The transport is passed to each call as a send closure, so the buffer stays
/// independent of any particular publisher.
#[derive(Debug, Clone, Default)]
pub struct PauseBuffer {
    paused: bool,
    queue: VecDeque<Sample>,
    sent: u64,
    queued: u64,
    dropped: u64,
}

impl PauseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&mut self) {
        if !self.paused {
            tracing::info!("producer paused");
        }
        self.paused = true;
    }

    /// Leave the paused state and return the samples the next `offer` will
    /// flush first, in FIFO order.
    ///
    /// Resuming only toggles state: nothing is sent until the next `offer`
    /// (or an explicit [`flush`](Self::flush)).
    pub fn resume(&mut self) -> Vec<Sample> {
        if self.paused {
            tracing::info!(pending = self.queue.len(), "producer resumed");
        }
        self.paused = false;
        self.queue.iter().cloned().collect()
    }

    /// Flip between paused and running; returns the new paused state.
    pub fn toggle(&mut self) -> bool {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Route one sample through the gate.
    ///
    /// On a send failure the error is returned and nothing is retried: queued
    /// samples already sent leave the queue, the failed one and everything
    /// behind it stay queued in order, and the offered sample is not sent.
    pub fn offer<F>(&mut self, sample: &Sample, mut send: F) -> Result<Offer>
    where
        F: FnMut(&Sample) -> Result<()>,
    {
        if self.paused {
            if sample.is_critical {
                self.queue.push_back(sample.clone());
                self.queued += 1;
                tracing::debug!(seq = sample.sequence_number, "queued critical sample");
                return Ok(Offer::Queued);
            }
            self.dropped += 1;
            tracing::debug!(
                seq = sample.sequence_number,
                "skipped non-critical sample while paused"
            );
            return Ok(Offer::Dropped);
        }

        self.flush(&mut send)?;
        send(sample)?;
        self.sent += 1;
        Ok(Offer::Sent)
    }

    /// Send every queued sample in FIFO order; returns how many went out.
    ///
    /// Stops at the first failure, leaving the failed sample at the front.
    pub fn flush<F>(&mut self, mut send: F) -> Result<usize>
    where
        F: FnMut(&Sample) -> Result<()>,
    {
        let mut flushed = 0;
        while let Some(front) = self.queue.front() {
            if let Err(e) = send(front) {
                tracing::warn!(
                    seq = front.sequence_number,
                    remaining = self.queue.len(),
                    "flush of queued sample failed: {}",
                    e
                );
                return Err(e);
            }
            tracing::debug!(seq = front.sequence_number, "sent queued sample");
            self.queue.pop_front();
            self.sent += 1;
            flushed += 1;
        }
        Ok(flushed)
    }

    /// Queued samples, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Sample> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Samples handed to the transport, including flushed ones.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    pub fn queued_count(&self) -> u64 {
        self.queued
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}
