//! Setting descriptors and the flat settings map.
//!
//! Settings are stored as raw strings under dotted keys
//! (`xpack.otel_data.registry.enabled`). Typed access goes through a
//! descriptor which owns the key, the default and the parsing rules, so a
//! malformed value is only ever detected at the point it is read or
//! validated.

use std::collections::BTreeMap;

use crate::error::SettingsError;

/// Properties a setting declares to the host configuration system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Resolved per node rather than per index.
    NodeScope,
    /// May be updated at runtime through the live settings store.
    Dynamic,
}

/// Value type of a registered setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
}

impl SettingKind {
    /// Check that `raw` is a valid value of this kind.
    pub fn validate(&self, key: &str, raw: &str) -> Result<(), SettingsError> {
        match self {
            SettingKind::Bool => parse_bool(key, raw).map(|_| ()),
        }
    }
}

/// Type-erased description of a setting, as exposed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub key: &'static str,
    pub kind: SettingKind,
    pub default: String,
    pub properties: &'static [Property],
    pub description: &'static str,
}

impl SettingDescriptor {
    pub fn is_dynamic(&self) -> bool {
        self.properties.contains(&Property::Dynamic)
    }

    pub fn is_node_scope(&self) -> bool {
        self.properties.contains(&Property::NodeScope)
    }

    pub fn validate(&self, raw: &str) -> Result<(), SettingsError> {
        self.kind.validate(self.key, raw)
    }
}

/// A boolean setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolSetting {
    key: &'static str,
    default: bool,
    properties: &'static [Property],
    description: &'static str,
}

impl BoolSetting {
    pub const fn new(
        key: &'static str,
        default: bool,
        properties: &'static [Property],
        description: &'static str,
    ) -> Self {
        Self {
            key,
            default,
            properties,
            description,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    /// Read the setting; an absent key yields the default.
    pub fn get(&self, settings: &Settings) -> Result<bool, SettingsError> {
        match settings.get(self.key) {
            Some(raw) => parse_bool(self.key, raw),
            None => Ok(self.default),
        }
    }

    /// Read the setting, falling back to the default for absent or malformed values.
    pub fn get_or_default(&self, settings: &Settings) -> bool {
        self.get(settings).unwrap_or(self.default)
    }

    pub fn descriptor(&self) -> SettingDescriptor {
        SettingDescriptor {
            key: self.key,
            kind: SettingKind::Bool,
            default: self.default.to_string(),
            properties: self.properties,
            description: self.description,
        }
    }
}

/// Strict boolean parsing: only `true` and `false` are accepted.
pub fn parse_bool(key: &str, raw: &str) -> Result<bool, SettingsError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SettingsError::Malformed {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Flat, ordered map of dotted setting keys to raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten a TOML table into dotted keys.
    ///
    /// Nested tables contribute their path (`[xpack.otel_data] enabled = true`
    /// becomes `xpack.otel_data.enabled`). Strings are taken verbatim, every
    /// other scalar is rendered in its TOML form.
    pub fn from_table(table: &toml::Table) -> Self {
        let mut settings = Self::new();
        flatten_into(&mut settings, None, table);
        settings
    }
}

fn flatten_into(settings: &mut Settings, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(settings, Some(&path), nested),
            toml::Value::String(s) => settings.insert(path, s.clone()),
            other => settings.insert(path, other.to_string()),
        }
    }
}
