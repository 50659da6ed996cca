//! OTel data plugin.
//!
//! Owns the cluster-wide OTel template registry of a node and decides when
//! it is active: a static node flag gates the feature, a dynamic flag
//! switches the registry on and off at runtime without a restart.

pub mod cluster;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod registry;

pub use config::NodeConfig;
pub use error::{NodeError, PluginError};
pub use lifecycle::{Node, OTelPlugin, Plugin};
