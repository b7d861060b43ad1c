// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! File-based configuration.
//!
//! ```toml
//! name = "qos-track"
//! log_level = "info"
//!
//! [discovery]
//! lease_secs = 10
//!
//! [[channels]]
//! name = "ReliableTopic"
//! direction = "inbound"
//! [channels.qos]
//! reliability = "reliable"
//! history = { keep_all = 30 }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::qos::QosProfile;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QosTrackConfig {
    /// Instance name (for identification in logs).
    #[serde(default = "default_name")]
    pub name: String,

    /// Log level or `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

fn default_name() -> String {
    "qos-track".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lease_secs() -> u64 {
    10
}

impl Default for QosTrackConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            discovery: DiscoveryConfig::default(),
            channels: Vec::new(),
        }
    }
}

/// Discovery pruning settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Entries silent for longer than this are pruned.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            lease_secs: default_lease_secs(),
        }
    }
}

/// Which side of the channel this process is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One configured channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub direction: Direction,
    #[serde(default)]
    pub qos: QosProfile,
}

impl ChannelConfig {
    pub fn inbound(name: impl Into<String>, qos: QosProfile) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Inbound,
            qos,
        }
    }

    pub fn outbound(name: impl Into<String>, qos: QosProfile) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Outbound,
            qos,
        }
    }
}

impl QosTrackConfig {
    /// Load and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.lease_secs == 0 {
            return Err(ConfigError::Invalid(
                "discovery.lease_secs must be greater than 0".into(),
            ));
        }

        // Names are unique per direction
        let mut seen = HashSet::new();
        for (i, channel) in self.channels.iter().enumerate() {
            if channel.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("Channel {} has an empty name", i)));
            }
            if !seen.insert((channel.name.as_str(), channel.direction)) {
                return Err(ConfigError::Invalid(format!(
                    "Channel '{}' is configured twice as {:?}",
                    channel.name, channel.direction
                )));
            }
        }
        Ok(())
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.discovery.lease_secs)
    }

    /// The entry for `name` on one side of the channel, if configured.
    pub fn channel(&self, name: &str, direction: Direction) -> Option<&ChannelConfig> {
        self.channels
            .iter()
            .find(|c| c.name == name && c.direction == direction)
    }

    pub fn inbound(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels
            .iter()
            .filter(|c| c.direction == Direction::Inbound)
    }

    pub fn outbound(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels
            .iter()
            .filter(|c| c.direction == Direction::Outbound)
    }

    /// The example written by `qos-track gen-config`: one channel per
    /// QoS scenario, both directions.
    pub fn example() -> Self {
        let mut channels = Vec::new();
        for (name, qos) in [
            ("ReliableTopic", QosProfile::reliable()),
            ("BestEffortTopic", QosProfile::best_effort()),
            ("HistoryTopic", QosProfile::reliable().keep_all(30)),
            ("SteeringControl", QosProfile::reliable().exclusive(10)),
        ] {
            channels.push(ChannelConfig::outbound(name, qos));
            channels.push(ChannelConfig::inbound(name, qos));
        }
        Self {
            name: "qos-track-example".into(),
            channels,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryPolicy;
    use crate::qos::{Ownership, Reliability};
    use std::io::Write;

    #[test]
    fn test_parse_minimal_uses_defaults() {
        let config = QosTrackConfig::from_toml_str("").expect("empty is valid");
        assert_eq!(config.name, "qos-track");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.lease(), Duration::from_secs(10));
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_parse_channels() {
        let config = QosTrackConfig::from_toml_str(
            r#"
            name = "vehicle"

            [discovery]
            lease_secs = 3

            [[channels]]
            name = "SteeringControl"
            direction = "inbound"
            [channels.qos]
            history = { keep_last = 1 }
            ownership = { exclusive = 0 }

            [[channels]]
            name = "BestEffortTopic"
            direction = "outbound"
            qos = { reliability = "best_effort" }
            "#,
        )
        .expect("valid");

        assert_eq!(config.lease(), Duration::from_secs(3));
        let steering = &config.channels[0];
        assert_eq!(steering.qos.reliability, Reliability::Reliable);
        assert_eq!(steering.qos.history, HistoryPolicy::KeepLast(1));
        assert_eq!(steering.qos.ownership, Ownership::Exclusive(0));
        assert_eq!(config.outbound().count(), 1);
        assert_eq!(config.inbound().next().map(|c| c.name.as_str()), Some("SteeringControl"));

        let best_effort = config.channel("BestEffortTopic", Direction::Outbound);
        assert_eq!(best_effort.map(|c| c.qos.reliability), Some(Reliability::BestEffort));
        assert!(config.channel("BestEffortTopic", Direction::Inbound).is_none());
    }

    #[test]
    fn test_validation() {
        let mut config = QosTrackConfig::default();
        assert!(config.validate().is_ok());

        config.discovery.lease_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.discovery.lease_secs = 10;

        config.channels.push(ChannelConfig::inbound(" ", QosProfile::default()));
        assert!(config.validate().is_err());

        config.channels.clear();
        config.channels.push(ChannelConfig::inbound("a", QosProfile::default()));
        config.channels.push(ChannelConfig::outbound("a", QosProfile::default()));
        assert!(config.validate().is_ok());
        config.channels.push(ChannelConfig::inbound("a", QosProfile::best_effort()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_round_trips_through_toml() {
        let config = QosTrackConfig::example();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        assert!(toml_str.contains("SteeringControl"));
        let parsed = QosTrackConfig::from_toml_str(&toml_str).expect("parse back");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "log_level = \"debug\"\n[discovery]\nlease_secs = 5").expect("write");
        let config = QosTrackConfig::from_file(file.path()).expect("load");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.discovery.lease_secs, 5);

        let missing = QosTrackConfig::from_file(file.path().with_extension("absent"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bad_toml_reports_parse_error() {
        let err = QosTrackConfig::from_toml_str("channels = 3").expect_err("wrong type");
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
