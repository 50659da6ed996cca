//! Template registry subsystem.
//!
//! # Data Flow
//! ```text
//! PluginServices
//!     → RegistryHandles::from_services (all handles required)
//!     → RegistryFactory::create
//!     → TemplateRegistry (owned by the lifecycle controller)
//!
//! set_enabled(true) → wake reconcile loop
//! initialize()      → spawn reconcile loop on the thread pool
//! close()           → signal loop shutdown
//! ```

pub mod catalog;
pub mod template_registry;

use std::sync::Arc;

use crate::cluster::{AdminClient, ClusterService, ContentRegistry, FeatureService, PluginServices, ThreadPool};
use crate::error::PluginError;

pub use catalog::{TemplateConfig, TEMPLATE_VERSION};
pub use template_registry::{OTelRegistryFactory, OTelTemplateRegistry, ReconcileOutcome};

/// Cluster feature gating template installation.
pub const OTEL_TEMPLATES_FEATURE: &str = "otel_data.templates";

/// A cluster-wide registry of schema templates.
///
/// Implementations synchronise internally; every method may be called
/// concurrently with the registry's own background work and must not block.
pub trait TemplateRegistry: Send + Sync + 'static {
    /// Set the active state. Inactive registries perform no maintenance work.
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Start background maintenance. Returns without waiting for it.
    fn initialize(&self);

    /// Stop background maintenance. Idempotent, safe without `initialize`.
    fn close(&self);
}

/// Builds the registry a lifecycle controller owns.
pub trait RegistryFactory: Send + Sync {
    type Registry: TemplateRegistry;

    fn create(&self, handles: RegistryHandles) -> Result<Arc<Self::Registry>, PluginError>;
}

/// The cluster handles a registry binds to.
#[derive(Clone)]
pub struct RegistryHandles {
    pub cluster_service: Arc<dyn ClusterService>,
    pub thread_pool: Arc<dyn ThreadPool>,
    pub client: Arc<dyn AdminClient>,
    pub content_registry: Arc<dyn ContentRegistry>,
    pub feature_service: Arc<dyn FeatureService>,
}

impl std::fmt::Debug for RegistryHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandles")
            .field("node", &self.cluster_service.local_node_id())
            .finish_non_exhaustive()
    }
}

impl RegistryHandles {
    /// Collect the handles from the service bundle; a missing one is a construction failure.
    pub fn from_services(services: &PluginServices) -> Result<Self, PluginError> {
        Ok(Self {
            cluster_service: required(services.cluster_service(), "cluster_service")?,
            thread_pool: required(services.thread_pool(), "thread_pool")?,
            client: required(services.client(), "client")?,
            content_registry: required(services.content_registry(), "content_registry")?,
            feature_service: required(services.feature_service(), "feature_service")?,
        })
    }
}

fn required<T: ?Sized>(handle: Option<&Arc<T>>, name: &str) -> Result<Arc<T>, PluginError> {
    handle
        .cloned()
        .ok_or_else(|| PluginError::ConstructionFailure(format!("missing cluster handle [{}]", name)))
}
