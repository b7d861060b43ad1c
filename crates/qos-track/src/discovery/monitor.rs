// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::registry::{StaleRegistry, DEFAULT_LEASE};
use crate::sample::Timestamp;

/// Health state a service announces about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Active,
    Busy,
    Error,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Active => "ACTIVE",
            ServiceStatus::Busy => "BUSY",
            ServiceStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Announcement payload for service discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub endpoint: String,
    pub status: ServiceStatus,
    pub healthy: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ServiceInfo {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: ServiceStatus::Active,
            healthy: true,
            capabilities: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: ServiceStatus, healthy: bool) -> Self {
        self.status = status;
        self.healthy = healthy;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }
}

/// Discovery feed consumer: a [`StaleRegistry`] bound to a fixed lease.
#[derive(Debug, Clone)]
pub struct DiscoveryMonitor<P = ServiceInfo> {
    registry: StaleRegistry<P>,
    lease: Duration,
}

impl<P: Clone> DiscoveryMonitor<P> {
    pub fn new(lease: Duration) -> Self {
        Self {
            registry: StaleRegistry::new(),
            lease,
        }
    }

    /// Apply one announcement. Returns `true` for a newly seen key.
    pub fn on_discovery_update(
        &mut self,
        key: impl Into<String>,
        payload: P,
        timestamp: Timestamp,
    ) -> bool {
        self.registry.update(key, payload, timestamp)
    }

    /// Drop entries silent for longer than the lease.
    pub fn prune(&mut self, now: Timestamp) -> BTreeSet<String> {
        let removed = self.registry.prune(now, self.lease);
        if !removed.is_empty() {
            tracing::info!(
                removed = removed.len(),
                remaining = self.registry.len(),
                "pruned stale discovery entries"
            );
        }
        removed
    }

    pub fn list(&self) -> BTreeMap<String, P> {
        self.registry.list()
    }

    pub fn get(&self, key: &str) -> Option<&P> {
        self.registry.get(key)
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    pub fn registry(&self) -> &StaleRegistry<P> {
        &self.registry
    }
}

impl<P: Clone> Default for DiscoveryMonitor<P> {
    fn default() -> Self {
        Self::new(DEFAULT_LEASE)
    }
}
