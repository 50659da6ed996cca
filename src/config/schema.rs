//! Node configuration schema.
//!
//! The node config file carries the ambient node configuration plus a
//! `[settings]` table that is flattened into dotted setting keys.

use serde::{Deserialize, Serialize};

use crate::config::setting::Settings;

/// Root configuration for a node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    /// Node identity and the capabilities it reports.
    pub node: NodeSection,

    /// Live settings file and watch cadence.
    pub live_settings: LiveSettingsConfig,

    /// Template registry tuning.
    pub registry: RegistryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup settings, e.g. `xpack.otel_data.enabled`.
    pub settings: toml::Table,
}

impl NodeConfig {
    /// Startup settings as a flat map.
    pub fn settings(&self) -> Settings {
        Settings::from_table(&self.settings)
    }
}

/// Node identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeSection {
    /// Node name used in logs.
    pub name: String,

    /// Whether this node acts as elected master of its local cluster view.
    pub master: bool,

    /// Cluster features this node reports as available.
    pub features: Vec<String>,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: "node-0".to_string(),
            master: true,
            features: vec![crate::registry::OTEL_TEMPLATES_FEATURE.to_string()],
        }
    }
}

/// Live settings configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveSettingsConfig {
    /// Path of the live settings file. No watcher is started when absent.
    pub path: Option<String>,

    /// Poll interval for the file watcher in seconds.
    pub poll_interval_secs: u64,
}

impl Default for LiveSettingsConfig {
    fn default() -> Self {
        Self {
            path: None,
            poll_interval_secs: 2,
        }
    }
}

/// Template registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Interval between reconcile passes in seconds.
    pub reconcile_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
