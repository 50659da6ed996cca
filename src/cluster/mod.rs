//! Cluster handles consumed by plugins.
//!
//! # Responsibilities
//! - Define the collaborator seams a plugin may bind to (membership,
//!   scheduling, admin client, content codecs, feature detection)
//! - Bundle them into `PluginServices`, handed to `Plugin::on_start`
//!
//! # Design Decisions
//! - Every handle is an `Arc<dyn Trait>` so hosts and tests can swap
//!   implementations
//! - Handles are optional in the bundle; a plugin that needs one fails
//!   construction when it is absent
//! - Admin client calls are asynchronous (`BoxFuture`); nothing here blocks

pub mod memory;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::config::{LiveSettings, Settings};
use crate::error::{ClientError, CodecError};

pub use memory::InMemoryCluster;

/// Content type of JSON sources.
pub const JSON: &str = "application/json";

/// Cluster membership view of the local node.
pub trait ClusterService: Send + Sync {
    fn local_node_id(&self) -> String;

    /// Whether the local node is the elected master.
    fn is_elected_master(&self) -> bool;
}

/// Task scheduler.
pub trait ThreadPool: Send + Sync {
    /// Run `task` in the background. Never waits for it.
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Kind of a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Component,
    Index,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Component => write!(f, "component_template"),
            TemplateKind::Index => write!(f, "index_template"),
        }
    }
}

/// Client for cluster administrative operations.
pub trait AdminClient: Send + Sync {
    /// Version of the installed template, `None` if absent or unversioned.
    fn installed_version<'a>(
        &'a self,
        kind: TemplateKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<u64>, ClientError>>;

    /// Create or replace a template.
    fn put_template<'a>(
        &'a self,
        kind: TemplateKind,
        name: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<(), ClientError>>;
}

/// Codec registry for structured content.
pub trait ContentRegistry: Send + Sync {
    fn parse(&self, content_type: &str, source: &str) -> Result<Value, CodecError>;
}

/// Cluster-wide capability detection.
pub trait FeatureService: Send + Sync {
    fn cluster_has_feature(&self, feature: &str) -> bool;
}

/// `ThreadPool` backed by a tokio runtime handle.
#[derive(Debug, Clone)]
pub struct TokioThreadPool {
    handle: tokio::runtime::Handle,
}

impl TokioThreadPool {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime of the calling context.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl ThreadPool for TokioThreadPool {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

/// `ContentRegistry` that understands JSON only.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContentRegistry;

impl ContentRegistry for JsonContentRegistry {
    fn parse(&self, content_type: &str, source: &str) -> Result<Value, CodecError> {
        if content_type != JSON {
            return Err(CodecError::UnsupportedContentType(content_type.to_string()));
        }
        Ok(serde_json::from_str(source)?)
    }
}

/// Services handed to a plugin when the node assembles its components.
#[derive(Clone, Default)]
pub struct PluginServices {
    settings: Settings,
    live_settings: Option<Arc<LiveSettings>>,
    cluster_service: Option<Arc<dyn ClusterService>>,
    thread_pool: Option<Arc<dyn ThreadPool>>,
    client: Option<Arc<dyn AdminClient>>,
    content_registry: Option<Arc<dyn ContentRegistry>>,
    feature_service: Option<Arc<dyn FeatureService>>,
}

impl std::fmt::Debug for PluginServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginServices")
            .field("settings", &self.settings)
            .field("live_settings", &self.live_settings.is_some())
            .field("cluster_service", &self.cluster_service.is_some())
            .field("thread_pool", &self.thread_pool.is_some())
            .field("client", &self.client.is_some())
            .field("content_registry", &self.content_registry.is_some())
            .field("feature_service", &self.feature_service.is_some())
            .finish()
    }
}

impl PluginServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_live_settings(mut self, live: Arc<LiveSettings>) -> Self {
        self.live_settings = Some(live);
        self
    }

    pub fn with_cluster_service(mut self, service: Arc<dyn ClusterService>) -> Self {
        self.cluster_service = Some(service);
        self
    }

    pub fn with_thread_pool(mut self, pool: Arc<dyn ThreadPool>) -> Self {
        self.thread_pool = Some(pool);
        self
    }

    pub fn with_client(mut self, client: Arc<dyn AdminClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_content_registry(mut self, registry: Arc<dyn ContentRegistry>) -> Self {
        self.content_registry = Some(registry);
        self
    }

    pub fn with_feature_service(mut self, service: Arc<dyn FeatureService>) -> Self {
        self.feature_service = Some(service);
        self
    }

    /// Startup settings of the node.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn live_settings(&self) -> Option<&Arc<LiveSettings>> {
        self.live_settings.as_ref()
    }

    pub fn cluster_service(&self) -> Option<&Arc<dyn ClusterService>> {
        self.cluster_service.as_ref()
    }

    pub fn thread_pool(&self) -> Option<&Arc<dyn ThreadPool>> {
        self.thread_pool.as_ref()
    }

    pub fn client(&self) -> Option<&Arc<dyn AdminClient>> {
        self.client.as_ref()
    }

    pub fn content_registry(&self) -> Option<&Arc<dyn ContentRegistry>> {
        self.content_registry.as_ref()
    }

    pub fn feature_service(&self) -> Option<&Arc<dyn FeatureService>> {
        self.feature_service.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_registry() {
        let codec = JsonContentRegistry;
        let value = codec.parse(JSON, r#"{"version": 3}"#).unwrap();
        assert_eq!(value["version"], 3);

        assert!(matches!(
            codec.parse("application/yaml", "version: 3"),
            Err(CodecError::UnsupportedContentType(_))
        ));
        assert!(matches!(
            codec.parse(JSON, "{not json"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_services_report_missing_handles() {
        let services = PluginServices::new();
        assert!(services.client().is_none());
        assert!(services.live_settings().is_none());

        let cluster = Arc::new(InMemoryCluster::new("node-1", true));
        let services = services.with_client(cluster);
        assert!(services.client().is_some());
    }
}
