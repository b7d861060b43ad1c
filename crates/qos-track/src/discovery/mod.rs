// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery registry with lease expiry.
//!
//! Network discovery itself belongs to the transport; this module only keeps
//! what was announced and decides when it has gone stale.

mod monitor;
mod registry;

pub use monitor::{DiscoveryMonitor, ServiceInfo, ServiceStatus};
pub use registry::{DiscoveryRecord, StaleRegistry, DEFAULT_LEASE};
