// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Reliable-delivery auditing
//!
//! Reader-side gap detection for channels selected with
//! [`Reliability::Reliable`](crate::qos::Reliability::Reliable).
//!
//! ```text
//! Producer                                  Consumer
//!   |--- seq=1 -------------------------------->| report: 1..1, missing none
//!   |--- seq=2 ---------X (lost)                |
//!   |--- seq=3 -------------------------------->| report: 1..3, missing {2}
//!   |--- seq=2 [transport retransmit] --------->| report: 1..3, missing none
//! ```
//!
//! The tracker only observes; retransmission is the transport's business.

mod gap_tracker;

pub use gap_tracker::{GapReport, SequenceTracker};
