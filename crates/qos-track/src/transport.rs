// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary with the pub/sub transport.
//!
//! The real transport (participants, topics, writers, readers) lives outside
//! this crate. [`Transport`] is the single call this layer makes into it, and
//! [`LoopbackTransport`] is an in-process stand-in used by tests and the
//! `qos-track simulate` command.

use std::collections::HashMap;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::sample::{Sample, Timestamp};

/// Outbound side of the transport.
pub trait Transport: Send + Sync {
    /// Publish one sample on `channel`. Failures are surfaced, never retried.
    fn publish(&self, channel: &str, sample: &Sample) -> Result<()>;
}

type DropFilter = Box<dyn FnMut(&str, &Sample) -> bool + Send>;

/// In-memory fan-out transport over crossbeam channels.
///
/// Every subscriber of a channel receives its own copy of each delivered
/// sample, stamped with the delivery time. An optional drop filter simulates
/// best-effort loss: a dropped sample counts as published but never arrives.
///
/// # Example
///
/// ```
/// use qos_track::{LoopbackTransport, Sample, Transport};
///
/// let transport = LoopbackTransport::new();
/// let rx = transport.subscribe("HistoryTopic");
/// transport.publish("HistoryTopic", &Sample::new(1, "sensor")).expect("subscribed");
/// assert_eq!(rx.recv().expect("delivered").sequence_number, 1);
/// ```
#[derive(Default)]
pub struct LoopbackTransport {
    subscribers: RwLock<HashMap<String, Vec<Sender<Sample>>>>,
    drop_filter: Mutex<Option<DropFilter>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription on `channel`.
    pub fn subscribe(&self, channel: &str) -> Receiver<Sample> {
        let (tx, rx) = unbounded();
        self.subscribers
            .write()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        tracing::debug!(channel, "loopback subscription opened");
        rx
    }

    /// Install a loss filter; returning `true` drops the sample in flight.
    pub fn set_drop_filter<F>(&self, filter: F)
    where
        F: FnMut(&str, &Sample) -> bool + Send + 'static,
    {
        *self.drop_filter.lock() = Some(Box::new(filter));
    }

    pub fn clear_drop_filter(&self) {
        *self.drop_filter.lock() = None;
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers.read().get(channel).map_or(0, Vec::len)
    }

    fn prune_senders(&self, channel: &str, dead: &[Sender<Sample>]) {
        let mut subscribers = self.subscribers.write();
        if let Some(senders) = subscribers.get_mut(channel) {
            senders.retain(|tx| !dead.iter().any(|d| d.same_channel(tx)));
            if senders.is_empty() {
                subscribers.remove(channel);
            }
        }
    }
}

impl Transport for LoopbackTransport {
    fn publish(&self, channel: &str, sample: &Sample) -> Result<()> {
        if self.subscriber_count(channel) == 0 {
            return Err(Error::publish_failed(channel, "no subscriber"));
        }

        // No subscriber lock is held while the filter runs
        if let Some(filter) = self.drop_filter.lock().as_mut() {
            if filter(channel, sample) {
                tracing::debug!(channel, seq = sample.sequence_number, "sample lost in flight");
                return Ok(());
            }
        }

        let delivered = sample.clone().received_at(Timestamp::now());
        let (live, dead) = {
            let subscribers = self.subscribers.read();
            let Some(senders) = subscribers.get(channel) else {
                return Err(Error::publish_failed(channel, "no subscriber"));
            };
            let dead: Vec<Sender<Sample>> = senders
                .iter()
                .filter(|tx| tx.send(delivered.clone()).is_err())
                .cloned()
                .collect();
            (senders.len() - dead.len(), dead)
        };

        // Receivers that hung up are pruned on the way
        if !dead.is_empty() {
            self.prune_senders(channel, &dead);
        }
        if live == 0 {
            return Err(Error::publish_failed(channel, "all subscribers disconnected"));
        }
        Ok(())
    }
}
