//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::NodeConfig;
use crate::config::setting::Settings;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate the node configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<NodeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: NodeConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load a live settings file. The whole file is flattened into dotted keys.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)?;
    Ok(Settings::from_table(&table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_with_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [node]
            name = "ingest-1"
            master = false

            [registry]
            reconcile_interval_secs = 5

            [settings.xpack.otel_data]
            enabled = false
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.node.name, "ingest-1");
        assert!(!config.node.master);
        assert_eq!(config.registry.reconcile_interval_secs, 5);
        assert_eq!(config.settings().get("xpack.otel_data.enabled"), Some("false"));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[registry]\nreconcile_interval_secs = 0\n").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_settings_flattens() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "xpack.otel_data.registry.enabled = true\n").unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.get("xpack.otel_data.registry.enabled"), Some("true"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_settings(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
