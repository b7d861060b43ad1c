// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Producer-side channel: sequencing, pause buffering, publish.

use std::sync::Arc;

use crate::error::Result;
use crate::pause::{Offer, PauseBuffer};
use crate::qos::{Ownership, QosProfile};
use crate::sample::{Sample, SampleSequencer};
use crate::transport::Transport;

/// Producer state for one published channel.
///
/// Numbers samples with a [`SampleSequencer`], stamps the ownership strength
/// of an exclusive profile, and routes every send through a [`PauseBuffer`].
pub struct OutboundChannel<T: Transport + ?Sized> {
    name: String,
    qos: QosProfile,
    transport: Arc<T>,
    sequencer: SampleSequencer,
    pause: PauseBuffer,
}

impl<T: Transport + ?Sized> OutboundChannel<T> {
    pub fn new(name: impl Into<String>, qos: QosProfile, transport: Arc<T>) -> Self {
        Self::with_sequencer(name, qos, transport, SampleSequencer::default())
    }

    pub fn with_sequencer(
        name: impl Into<String>,
        qos: QosProfile,
        transport: Arc<T>,
        sequencer: SampleSequencer,
    ) -> Self {
        let name = name.into();
        tracing::debug!(channel = %name, qos = ?qos, "outbound channel created");
        Self {
            name,
            qos,
            transport,
            sequencer,
            pause: PauseBuffer::new(),
        }
    }

    /// Strength this producer writes with, if the channel is exclusive.
    pub fn strength(&self) -> Option<u32> {
        match self.qos.ownership {
            Ownership::Exclusive(strength) => Some(strength),
            Ownership::Shared => None,
        }
    }

    /// Build the next sample: fresh sequence number, critical flag, strength.
    pub fn next_sample(&self, producer_id: &str, payload: Vec<u8>) -> Sample {
        let sample = self.sequencer.next(producer_id, payload);
        match self.strength() {
            Some(strength) => sample.with_strength(strength),
            None => sample,
        }
    }

    /// Route `sample` through the pause buffer to the transport.
    pub fn offer(&mut self, sample: &Sample) -> Result<Offer> {
        let transport = &self.transport;
        let name = &self.name;
        let outcome = self.pause.offer(sample, |s| transport.publish(name, s));
        if let Err(e) = &outcome {
            tracing::warn!(
                channel = %self.name,
                seq = sample.sequence_number,
                pending = self.pause.pending_len(),
                "publish failed: {}",
                e
            );
        }
        outcome
    }

    /// `next_sample` followed by `offer`; returns the sample with its outcome.
    pub fn publish_next(&mut self, producer_id: &str, payload: Vec<u8>) -> Result<(Sample, Offer)> {
        let sample = self.next_sample(producer_id, payload);
        let outcome = self.offer(&sample)?;
        Ok((sample, outcome))
    }

    pub fn pause(&mut self) {
        self.pause.pause();
    }

    /// Leave the paused state; returns what the next offer will flush first.
    pub fn resume(&mut self) -> Vec<Sample> {
        self.pause.resume()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause.toggle()
    }

    /// Push queued samples out now instead of waiting for the next offer.
    pub fn flush(&mut self) -> Result<usize> {
        let transport = &self.transport;
        let name = &self.name;
        self.pause.flush(|s| transport.publish(name, s))
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn pause_buffer(&self) -> &PauseBuffer {
        &self.pause
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qos(&self) -> &QosProfile {
        &self.qos
    }
}
