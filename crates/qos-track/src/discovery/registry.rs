// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lease-based expiry over already-discovered entries.
//!
//! Every update refreshes a key's `last_update`. Nothing expires on its own:
//! the caller runs [`StaleRegistry::prune`] at whatever cadence it likes and
//! gets back the keys that were removed.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::sample::Timestamp;

/// Default lease: entries silent for more than 10 s are stale.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(10);

/// One discovered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord<P> {
    pub key: String,
    pub last_update: Timestamp,
    pub payload: P,
}

/// Key -> record map with explicit, pull-based lease expiry.
///
/// Keys are kept sorted so listings are stable.
///
/// # Example
///
/// ```
/// use qos_track::{StaleRegistry, Timestamp};
/// use std::time::Duration;
///
/// let lease = Duration::from_secs(10);
/// let t0 = Timestamp::from_secs(100);
/// let mut registry = StaleRegistry::new();
/// registry.update("UserService", "REST localhost:8080", t0);
///
/// assert!(registry.prune(t0 + lease, lease).is_empty()); // exactly the lease: kept
/// let removed = registry.prune(t0 + lease + Duration::from_nanos(1), lease);
/// assert!(removed.contains("UserService"));
/// ```
#[derive(Debug, Clone)]
pub struct StaleRegistry<P> {
    entries: BTreeMap<String, DiscoveryRecord<P>>,
}

impl<P: Clone> StaleRegistry<P> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or refresh `key` with `last_update = now`.
    ///
    /// Returns `true` when the key was not present before.
    pub fn update(&mut self, key: impl Into<String>, payload: P, now: Timestamp) -> bool {
        let key = key.into();
        if let Some(existing) = self.entries.get_mut(&key) {
            existing.last_update = now;
            existing.payload = payload;
            return false;
        }
        tracing::debug!(key = %key, "new entry discovered");
        let record = DiscoveryRecord {
            key: key.clone(),
            last_update: now,
            payload,
        };
        self.entries.insert(key, record);
        true
    }

    /// Remove and return every key with `now - last_update > lease`.
    ///
    /// An entry exactly `lease` old is kept. A `now` earlier than an entry's
    /// `last_update` counts as zero elapsed.
    pub fn prune(&mut self, now: Timestamp, lease: Duration) -> BTreeSet<String> {
        let expired: BTreeSet<String> = self
            .entries
            .values()
            .filter(|r| now.saturating_since(r.last_update) > lease)
            .map(|r| r.key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            tracing::info!(key = %key, "removing inactive entry");
        }
        expired
    }

    pub fn get(&self, key: &str) -> Option<&P> {
        self.entries.get(key).map(|r| &r.payload)
    }

    pub fn record(&self, key: &str) -> Option<&DiscoveryRecord<P>> {
        self.entries.get(key)
    }

    pub fn last_update(&self, key: &str) -> Option<Timestamp> {
        self.entries.get(key).map(|r| r.last_update)
    }

    /// Every current key with its payload, sorted by key.
    pub fn list(&self) -> BTreeMap<String, P> {
        self.entries
            .iter()
            .map(|(k, r)| (k.clone(), r.payload.clone()))
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &DiscoveryRecord<P>> {
        self.entries.values()
    }

    pub fn remove(&mut self, key: &str) -> Option<P> {
        self.entries.remove(key).map(|r| r.payload)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Clone> Default for StaleRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
