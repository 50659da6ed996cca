//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks on the node config (serde handles syntax)
//! - Check every startup setting against the registered descriptors
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure functions; run before anything is assembled

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::NodeConfig;
use crate::config::setting::{SettingDescriptor, Settings};
use crate::error::SettingsError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A semantic error in the node config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("invalid log level [{0}]")]
    InvalidLogLevel(String),

    #[error("invalid metrics address [{0}]")]
    InvalidMetricsAddress(String),
}

/// Validate the node config.
pub fn validate_config(config: &NodeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.live_settings.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval {
            field: "live_settings.poll_interval_secs",
        });
    }
    if config.registry.reconcile_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval {
            field: "registry.reconcile_interval_secs",
        });
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate startup settings against the registered descriptors.
pub fn validate_settings(
    settings: &Settings,
    registered: &[SettingDescriptor],
) -> Result<(), Vec<SettingsError>> {
    let errors: Vec<_> = settings
        .iter()
        .filter_map(|(key, value)| {
            match registered.iter().find(|descriptor| descriptor.key == key) {
                Some(descriptor) => descriptor.validate(value).err(),
                None => Some(SettingsError::Unknown {
                    key: key.to_string(),
                }),
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::gate::{OTEL_DATA_ENABLED, OTEL_DATA_REGISTRY_ENABLED};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NodeConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = NodeConfig::default();
        config.registry.reconcile_interval_secs = 0;
        config.live_settings.poll_interval_secs = 0;
        config.observability.log_level = "loud".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_settings_checked_against_descriptors() {
        let registered = vec![
            OTEL_DATA_ENABLED.descriptor(),
            OTEL_DATA_REGISTRY_ENABLED.descriptor(),
        ];

        let good = Settings::new()
            .with("xpack.otel_data.enabled", "true")
            .with("xpack.otel_data.registry.enabled", "false");
        assert!(validate_settings(&good, &registered).is_ok());

        let bad = Settings::new()
            .with("xpack.otel_data.enabled", "on")
            .with("xpack.otel_data.unknown", "true");
        let errors = validate_settings(&bad, &registered).unwrap_err();
        assert_eq!(
            errors,
            vec![
                SettingsError::Malformed {
                    key: "xpack.otel_data.enabled".into(),
                    value: "on".into(),
                },
                SettingsError::Unknown {
                    key: "xpack.otel_data.unknown".into(),
                },
            ]
        );
    }
}
