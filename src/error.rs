//! Error taxonomy.
//!
//! # Propagation
//! - `PluginError` is returned to the host and aborts startup or shutdown
//! - `SettingsError` raised during a live apply is logged and swallowed;
//!   the last known-good value stays in effect
//! - `ClientError` / `CodecError` belong to the registry's own work and are
//!   retried by its next reconcile pass

use thiserror::Error;

/// Host-contract violations and construction failures of the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// `on_start` ran twice; the registry slot is write-once.
    #[error("registry slot already initialized")]
    DoubleInitialization,

    /// `on_close` ran before `on_start` ever stored a registry.
    #[error("registry slot read before it was initialized")]
    UninitializedState,

    /// A cluster handle the registry needs is missing or unusable.
    #[error("failed to construct template registry: {0}")]
    ConstructionFailure(String),
}

/// A rejected setting value or update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("failed to parse value [{value}] for setting [{key}]")]
    Malformed { key: String, value: String },

    #[error("setting [{key}] is not dynamically updateable")]
    NotDynamic { key: String },

    #[error("unknown setting [{key}]")]
    Unknown { key: String },
}

/// Failure reported by the cluster admin client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// Failure decoding content through the content registry.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported content type [{0}]")]
    UnsupportedContentType(String),

    #[error("malformed content: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure installing a single template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failure assembling or running a node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] crate::config::loader::ConfigError),

    #[error("invalid startup settings: {}", join(.0))]
    Settings(Vec<SettingsError>),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("failed to watch live settings: {0}")]
    Watch(#[from] notify::Error),
}

fn join(errors: &[SettingsError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
