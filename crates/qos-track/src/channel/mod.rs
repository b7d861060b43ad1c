// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Channel wiring: the tracking components assembled per QoS profile.
//!
//! ```text
//! producer                                  consumer
//! OutboundChannel                           InboundChannel
//!   SampleSequencer                           SequenceTracker   (reliable)
//!   PauseBuffer ──> Transport ──> Receiver ─> OwnershipArbiter  (exclusive)
//!                                             HistoryWindow
//! ```

mod consumer;
mod inbound;
mod outbound;

pub use consumer::{run_consumer, ConsumerExit, Shutdown};
pub use inbound::{Delivery, InboundChannel};
pub use outbound::OutboundChannel;
