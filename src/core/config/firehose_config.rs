// SPDX-License-Identifier: MIT OR Apache-2.0

//! # FireHose Configuration
//!
//! Settings are resolved in three layers (low to high priority):
//!
//! 1. Rust defaults ([`FireHoseConfig::default`])
//! 2. A TOML or YAML file, picked by extension
//! 3. Command line flags, applied by the binary
//!
//! ## Example
//!
//! ```toml
//! instances = ["mastodon.social", "fosstodon.org"]
//! stats_interval_ms = 1000
//! initial_query = "rust"
//!
//! [reconnect]
//! enabled = true
//! max_attempts = 5
//! ```

use super::reconnect::ReconnectConfig;
use crate::core::error::{FireHoseError, FireHoseResult};
use crate::core::stream::mapper::DEFAULT_MAX_FRAME_BYTES;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Placeholder substituted with the instance hostname
pub const INSTANCE_PLACEHOLDER: &str = "{instance}";

pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "wss://{instance}/api/v1/streaming/?";

pub const DEFAULT_INSTANCES: &[&str] = &[
    "mastodon.social",
    "octodon.social",
    "mastodon.art",
    "fosstodon.org",
    "chaos.social",
    "infosec.exchange",
    "hachyderm.io",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FireHoseConfig {
    /// Hostnames of the instances to monitor
    pub instances: Vec<String>,
    /// Streaming endpoint, `{instance}` is replaced by each hostname
    pub endpoint_template: String,
    /// Interval between stats summaries in milliseconds (default: 1000)
    pub stats_interval_ms: u64,
    /// Timeout for establishing one streaming connection (default: 30000)
    pub connect_timeout_ms: u64,
    /// Capacity of the connector → aggregator channel (default: 1024)
    pub channel_capacity: usize,
    /// Frames above this size are rejected (default: 1 MiB)
    pub max_frame_bytes: usize,
    /// Bound on remembered post ids per filter session, unbounded when unset
    pub dedup_capacity: Option<usize>,
    /// Filter installed at startup
    pub initial_query: Option<String>,
    pub reconnect: ReconnectConfig,
}

impl Default for FireHoseConfig {
    fn default() -> Self {
        Self {
            instances: DEFAULT_INSTANCES.iter().map(|s| s.to_string()).collect(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            stats_interval_ms: 1000,
            connect_timeout_ms: 30000,
            channel_capacity: 1024,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            dedup_capacity: None,
            initial_query: None,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl FireHoseConfig {
    /// Configuration for an explicit instance list, everything else default
    pub fn with_instances<I, S>(instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instances: instances.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> FireHoseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FireHoseError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(FireHoseError::configuration(format!(
                "Unsupported config file extension for {} (expected .toml, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    pub fn from_toml_str(text: &str) -> FireHoseResult<Self> {
        toml::from_str(text)
            .map_err(|e| FireHoseError::configuration(format!("Invalid TOML config: {}", e)))
    }

    pub fn from_yaml_str(text: &str) -> FireHoseResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| FireHoseError::configuration(format!("Invalid YAML config: {}", e)))
    }

    /// Reject configurations the aggregator cannot start with.
    pub fn validate(&self) -> FireHoseResult<()> {
        if self.instances.is_empty() {
            return Err(FireHoseError::configuration_with_key(
                "At least one instance is required",
                "instances",
            ));
        }

        let mut unique = HashSet::new();
        for instance in &self.instances {
            if instance.is_empty() || instance.contains(|c: char| c == '/' || c.is_whitespace()) {
                return Err(FireHoseError::configuration_with_key(
                    format!("Invalid instance hostname '{}'", instance),
                    "instances",
                ));
            }
            if !unique.insert(instance.to_ascii_lowercase()) {
                return Err(FireHoseError::configuration_with_key(
                    format!("Instance '{}' is listed more than once", instance),
                    "instances",
                ));
            }
        }

        let template = &self.endpoint_template;
        if !template.starts_with("ws://") && !template.starts_with("wss://") {
            return Err(FireHoseError::configuration_with_key(
                format!(
                    "Invalid endpoint template: must start with ws:// or wss://, got: {}",
                    template
                ),
                "endpoint_template",
            ));
        }
        if !template.contains(INSTANCE_PLACEHOLDER) {
            return Err(FireHoseError::configuration_with_key(
                format!("Endpoint template must contain {}", INSTANCE_PLACEHOLDER),
                "endpoint_template",
            ));
        }

        if self.stats_interval_ms == 0 {
            return Err(FireHoseError::configuration_with_key(
                "stats_interval_ms must be greater than 0",
                "stats_interval_ms",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(FireHoseError::configuration_with_key(
                "connect_timeout_ms must be greater than 0",
                "connect_timeout_ms",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(FireHoseError::configuration_with_key(
                "channel_capacity must be greater than 0",
                "channel_capacity",
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(FireHoseError::configuration_with_key(
                "max_frame_bytes must be greater than 0",
                "max_frame_bytes",
            ));
        }
        if self.dedup_capacity == Some(0) {
            return Err(FireHoseError::configuration_with_key(
                "dedup_capacity must be greater than 0 when set",
                "dedup_capacity",
            ));
        }

        self.reconnect
            .validate()
            .map_err(|msg| FireHoseError::configuration_with_key(msg, "reconnect"))
    }

    /// Streaming URL for one instance
    pub fn endpoint_for(&self, instance: &str) -> String {
        self.endpoint_template.replace(INSTANCE_PLACEHOLDER, instance)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
