// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking consumer loop with cooperative shutdown.
//!
//! A consumer thread waits on its sample receiver and a [`Shutdown`] signal at
//! the same time, so it never polls and exits promptly when either side ends.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::sample::Sample;

/// One-shot, cloneable shutdown signal.
///
/// Triggering drops the only sender; every clone observes the disconnect.
#[derive(Debug, Clone)]
pub struct Shutdown {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        if self.trigger.lock().take().is_some() {
            tracing::debug!("shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until triggered.
    pub fn wait(&self) {
        // Nothing is ever sent, so recv only returns on disconnect
        let _ = self.signal.recv();
    }

    /// Block up to `timeout`; returns `true` if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Receiver side, for use in a caller's own `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Why [`run_consumer`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerExit {
    Shutdown,
    /// Every producer side of the sample channel was dropped.
    Disconnected,
}

/// Feed samples to `handler` until shutdown or disconnect.
///
/// Shutdown wins over pending samples: once triggered, nothing more is handed
/// to `handler`.
pub fn run_consumer<F>(rx: &Receiver<Sample>, shutdown: &Shutdown, mut handler: F) -> ConsumerExit
where
    F: FnMut(Sample),
{
    let stop = shutdown.receiver();
    loop {
        if shutdown.is_triggered() {
            tracing::debug!("consumer stopping on shutdown");
            return ConsumerExit::Shutdown;
        }
        crossbeam::select! {
            recv(rx) -> msg => match msg {
                Ok(sample) => handler(sample),
                Err(_) => {
                    tracing::debug!("sample channel disconnected");
                    return ConsumerExit::Disconnected;
                }
            },
            recv(stop) -> _ => {
                tracing::debug!("consumer stopping on shutdown");
                return ConsumerExit::Shutdown;
            }
        }
    }
}
