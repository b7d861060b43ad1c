// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the tracking layer.
//!
//! Nothing in this crate is fatal: every failure is local, reported as a
//! value, and leaves the reporting component exactly as it was before the
//! call.
//!
//! | Kind | Raised by | Meaning |
//! |------|-----------|---------|
//! | `CapacityExhausted` | `HistoryWindow` (KEEP_ALL) | Sample dropped, buffer unchanged |
//! | `PublishFailed` | `PauseBuffer`, `Transport` | Outbound send failed, never retried |
//! | `UnknownProducer` | `OwnershipArbiter` | Toggle for an unseen producer (escalated only on request) |
//! | `Config` | `QosTrackConfig` | Configuration file could not be loaded |

use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by tracking-layer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// KEEP_ALL history is full; the new sample was not buffered.
    #[error("History capacity exhausted ({capacity} samples retained)")]
    CapacityExhausted { capacity: u32 },

    /// Outbound publish failed on a channel.
    #[error("Publish failed on '{channel}': {reason}")]
    PublishFailed { channel: String, reason: String },

    /// Ownership toggle referenced a producer that has never been seen.
    #[error("Unknown producer '{0}'")]
    UnknownProducer(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Discriminant of [`Error`], for callers that branch on the reason only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CapacityExhausted,
    PublishFailed,
    UnknownProducer,
    Config,
}

impl Error {
    /// Build a `PublishFailed` error.
    pub fn publish_failed(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PublishFailed {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CapacityExhausted { .. } => ErrorKind::CapacityExhausted,
            Error::PublishFailed { .. } => ErrorKind::PublishFailed,
            Error::UnknownProducer(_) => ErrorKind::UnknownProducer,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

/// Convenient alias for results using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
