// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound pipeline: tracker -> arbiter gate -> history window.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::history::{HistoryPolicy, HistoryWindow};
use crate::qos::{OwnershipArbiter, QosProfile};
use crate::reliability::{GapReport, SequenceTracker};
use crate::sample::Sample;

/// What happened to one inbound sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Gap report of the sample's producer after observing it (audited channels only).
    pub gap: Option<GapReport>,
    /// Whether the sample passed ownership gating (always true when shared).
    pub authoritative: bool,
    /// Whether the history window accepted the sample.
    pub retained: bool,
    /// Sample pushed out of a KEEP_LAST window by this one.
    pub evicted: Option<Sample>,
}

/// Consumer-side state for one subscribed channel.
///
/// Components are attached from the [`QosProfile`]: gap tracking for reliable
/// channels, an arbiter for exclusive ones, and always a history window.
/// Best-effort channels can opt into gap tracking with [`with_gap_audit`].
///
/// Every producer numbers its own stream, so gaps are tracked per
/// `producer_id`: one producer's delivery never hides another's loss.
/// Gap auditing sees every sample, authoritative or not; only authoritative
/// samples reach the window and the consumer.
///
/// [`with_gap_audit`]: InboundChannel::with_gap_audit
#[derive(Debug)]
pub struct InboundChannel {
    name: String,
    qos: QosProfile,
    audit_gaps: bool,
    trackers: BTreeMap<String, SequenceTracker>,
    arbiter: Option<Arc<OwnershipArbiter>>,
    window: HistoryWindow<Sample>,
    accepted: u64,
}

impl InboundChannel {
    pub fn new(name: impl Into<String>, qos: QosProfile) -> Self {
        let arbiter = qos.is_exclusive().then(|| Arc::new(OwnershipArbiter::new()));
        Self::build(name.into(), qos, arbiter)
    }

    /// Attach an existing arbiter, e.g. one also held by a command thread.
    ///
    /// The arbiter is used even if `qos` is shared.
    pub fn with_arbiter(
        name: impl Into<String>,
        qos: QosProfile,
        arbiter: Arc<OwnershipArbiter>,
    ) -> Self {
        Self::build(name.into(), qos, Some(arbiter))
    }

    fn build(name: String, qos: QosProfile, arbiter: Option<Arc<OwnershipArbiter>>) -> Self {
        tracing::debug!(
            channel = %name,
            gap_audit = qos.tracks_gaps(),
            exclusive = arbiter.is_some(),
            history = ?qos.history,
            "inbound channel attached"
        );
        Self {
            audit_gaps: qos.tracks_gaps(),
            trackers: BTreeMap::new(),
            window: HistoryWindow::new(qos.history),
            name,
            qos,
            arbiter,
            accepted: 0,
        }
    }

    /// Track gaps even if the channel is best-effort.
    ///
    /// Losses on a best-effort channel are expected; auditing them gives the
    /// numbers to compare against a reliable channel carrying the same stream.
    #[must_use]
    pub fn with_gap_audit(mut self) -> Self {
        self.audit_gaps = true;
        self
    }

    /// Process one delivered sample.
    pub fn on_sample(&mut self, sample: Sample) -> Delivery {
        let gap = self.audit_gaps.then(|| {
            self.trackers
                .entry(sample.producer_id.clone())
                .or_default()
                .observe_sample(&sample)
        });
        if let Some(report) = gap.as_ref().filter(|r| r.has_gaps()) {
            tracing::debug!(
                channel = %self.name,
                producer = %sample.producer_id,
                %report,
                "gaps outstanding"
            );
        }

        let authoritative = match &self.arbiter {
            None => true,
            Some(arbiter) => {
                if let Some(strength) = sample.strength {
                    arbiter.register_producer(&sample.producer_id, strength);
                }
                arbiter.is_sample_authoritative(&sample)
            }
        };
        if !authoritative {
            return Delivery {
                gap,
                authoritative,
                retained: false,
                evicted: None,
            };
        }

        let seq = sample.sequence_number;
        match self.window.append(sample) {
            Ok(evicted) => {
                self.accepted += 1;
                Delivery {
                    gap,
                    authoritative,
                    retained: true,
                    evicted,
                }
            }
            Err(e) => {
                tracing::warn!(channel = %self.name, seq, "sample dropped: {}", e);
                Delivery {
                    gap,
                    authoritative,
                    retained: false,
                    evicted: None,
                }
            }
        }
    }

    /// Swap the retention policy at runtime; returns how many samples were dropped.
    pub fn set_history_policy(&mut self, policy: HistoryPolicy) -> usize {
        self.qos.history = policy;
        self.window.set_policy(policy)
    }

    /// The most recent `limit` retained samples (all if `None`).
    pub fn history(&self, limit: Option<usize>) -> Vec<Sample> {
        self.window.snapshot(limit)
    }

    pub fn window(&self) -> &HistoryWindow<Sample> {
        &self.window
    }

    /// Whether this channel audits sequence gaps.
    pub fn tracks_gaps(&self) -> bool {
        self.audit_gaps
    }

    /// Gap tracker for one producer, `None` until it has delivered a sample.
    pub fn tracker(&self, producer_id: &str) -> Option<&SequenceTracker> {
        self.trackers.get(producer_id)
    }

    /// Every producer's tracker, ordered by producer id.
    pub fn trackers(&self) -> impl Iterator<Item = (&str, &SequenceTracker)> + '_ {
        self.trackers.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn arbiter(&self) -> Option<&Arc<OwnershipArbiter>> {
        self.arbiter.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qos(&self) -> &QosProfile {
        &self.qos
    }

    /// Authoritative samples accepted by the window.
    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }
}
