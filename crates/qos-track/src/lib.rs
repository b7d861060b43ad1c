// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client-side sample tracking and arbitration for pub/sub QoS.
//!
//! Sits between a pub/sub transport and application code and provides the
//! bookkeeping the QoS policies need on the client side.
//!
//! # Features
//!
//! - **Gap Audit**: [`SequenceTracker`] reports missing sequence numbers on reliable channels
//! - **History Windows**: [`HistoryWindow`] retains KEEP_LAST / KEEP_ALL samples
//! - **Ownership Gating**: [`OwnershipArbiter`] admits samples from active strengths only
//! - **Pause Buffering**: [`PauseBuffer`] holds critical samples while a producer is paused
//! - **Stale Pruning**: [`StaleRegistry`] expires discovery entries past their lease
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use qos_track::{InboundChannel, LoopbackTransport, OutboundChannel, QosProfile};
//!
//! let transport = Arc::new(LoopbackTransport::new());
//! let rx = transport.subscribe("ReliableTopic");
//!
//! let mut producer = OutboundChannel::new("ReliableTopic", QosProfile::reliable(), transport);
//! let mut consumer = InboundChannel::new("ReliableTopic", QosProfile::reliable().keep_last(5));
//!
//! for _ in 0..3 {
//!     producer.publish_next("Publisher", Vec::new()).expect("subscribed");
//! }
//! for sample in rx.try_iter() {
//!     consumer.on_sample(sample);
//! }
//! let report = consumer.tracker("Publisher").and_then(|t| t.report()).expect("tracked");
//! assert!(!report.has_gaps());
//! assert_eq!(consumer.history(None).len(), 3);
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! name = "vehicle"
//!
//! [discovery]
//! lease_secs = 10
//!
//! [[channels]]
//! name = "SteeringControl"
//! direction = "inbound"
//! qos = { reliability = "reliable", history = { keep_last = 5 }, ownership = { exclusive = 0 } }
//! ```

pub mod channel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod history;
pub mod pause;
pub mod qos;
pub mod reliability;
pub mod sample;
pub mod transport;

pub use channel::{run_consumer, ConsumerExit, Delivery, InboundChannel, OutboundChannel, Shutdown};
pub use config::{ChannelConfig, ConfigError, Direction, QosTrackConfig};
pub use discovery::{
    DiscoveryMonitor, DiscoveryRecord, ServiceInfo, ServiceStatus, StaleRegistry, DEFAULT_LEASE,
};
pub use error::{Error, ErrorKind, Result};
pub use history::{HistoryPolicy, HistoryWindow};
pub use pause::{Offer, PauseBuffer};
pub use qos::{Activation, Ownership, OwnershipArbiter, ProducerRecord, QosProfile, Reliability};
pub use reliability::{GapReport, SequenceTracker};
pub use sample::{Sample, SampleSequencer, Timestamp};
pub use transport::{LoopbackTransport, Transport};
