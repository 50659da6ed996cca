//! Shared fixtures for lifecycle and node tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use otel_data::cluster::{InMemoryCluster, JsonContentRegistry, PluginServices, TokioThreadPool};
use otel_data::config::gate::OTEL_DATA_REGISTRY_ENABLED;
use otel_data::config::{LiveSettings, Settings};
use otel_data::error::PluginError;
use otel_data::registry::{RegistryFactory, RegistryHandles, TemplateRegistry, OTEL_TEMPLATES_FEATURE};

/// Registry that only records what the controller asks of it.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    enabled: AtomicBool,
    pub enabled_calls: Mutex<Vec<bool>>,
    pub initialize_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl RecordingRegistry {
    pub fn initialize_count(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn enabled_history(&self) -> Vec<bool> {
        self.enabled_calls.lock().unwrap().clone()
    }
}

impl TemplateRegistry for RecordingRegistry {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.enabled_calls.lock().unwrap().push(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn initialize(&self) {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory counting constructions.
#[derive(Debug, Default, Clone)]
pub struct RecordingFactory {
    pub created: Arc<AtomicUsize>,
}

impl RecordingFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl RegistryFactory for RecordingFactory {
    type Registry = RecordingRegistry;

    fn create(&self, _handles: RegistryHandles) -> Result<Arc<RecordingRegistry>, PluginError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingRegistry::default()))
    }
}

/// In-memory cluster that reports the template feature and is master.
pub fn cluster() -> Arc<InMemoryCluster> {
    Arc::new(InMemoryCluster::new("node-1", true).with_features([OTEL_TEMPLATES_FEATURE]))
}

/// Cluster handles only, as a host passes them before adding settings.
pub fn handles(cluster: &Arc<InMemoryCluster>) -> PluginServices {
    PluginServices::new()
        .with_cluster_service(cluster.clone())
        .with_thread_pool(Arc::new(TokioThreadPool::current()))
        .with_client(cluster.clone())
        .with_content_registry(Arc::new(JsonContentRegistry))
        .with_feature_service(cluster.clone())
}

/// Complete services with a live store registering the registry flag.
pub fn services(cluster: &Arc<InMemoryCluster>, settings: Settings) -> (PluginServices, Arc<LiveSettings>) {
    let live = Arc::new(LiveSettings::new(settings.clone()));
    live.register(OTEL_DATA_REGISTRY_ENABLED.descriptor());
    let services = handles(cluster)
        .with_settings(settings)
        .with_live_settings(Arc::clone(&live));
    (services, live)
}

/// Live settings snapshot setting the registry flag.
pub fn registry_flag(value: bool) -> Settings {
    Settings::new().with(OTEL_DATA_REGISTRY_ENABLED.key(), value.to_string())
}
