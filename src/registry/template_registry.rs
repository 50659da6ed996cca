//! OTel index template registry.
//!
//! # Responsibilities
//! - Keep the OTel templates installed at [`TEMPLATE_VERSION`]
//! - Honour the active state set by the lifecycle controller
//! - Cancel its own background work on close
//!
//! # Reconcile pass
//! ```text
//! enabled? → elected master? → cluster has feature?
//!     → for each template: installed version < TEMPLATE_VERSION → put
//! ```
//! A pass runs on every tick and immediately when the registry is enabled.
//! Failed puts are logged and retried by the next pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Notify};
use tokio::time;

use crate::error::{PluginError, TemplateError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::catalog::{self, TemplateConfig, TEMPLATE_VERSION};
use crate::registry::{RegistryFactory, RegistryHandles, TemplateRegistry, OTEL_TEMPLATES_FEATURE};

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Disabled,
    NotMaster,
    MissingFeature,
    Reconciled { installed: usize, failed: usize },
}

/// Registry that installs the OTel template catalog.
#[derive(Debug, Clone)]
pub struct OTelTemplateRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    handles: RegistryHandles,
    reconcile_interval: Duration,
    enabled: AtomicBool,
    initialized: AtomicBool,
    closed: AtomicBool,
    wake: Notify,
    shutdown: Shutdown,
}

impl OTelTemplateRegistry {
    pub fn new(handles: RegistryHandles, reconcile_interval: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                handles,
                reconcile_interval,
                enabled: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                wake: Notify::new(),
                shutdown: Shutdown::new(),
            }),
        }
    }

    /// Run a single reconcile pass now.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        self.inner.reconcile().await
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl TemplateRegistry for OTelTemplateRegistry {
    fn set_enabled(&self, enabled: bool) {
        let was = self.inner.enabled.swap(enabled, Ordering::AcqRel);
        if was == enabled {
            return;
        }
        tracing::info!(enabled, "OTel template registry active state changed");
        metrics::record_registry_active(enabled);
        if enabled {
            self.inner.wake.notify_one();
        }
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    fn initialize(&self) {
        // Subscribe before checking `closed` so a concurrent close is never missed.
        let shutdown = self.inner.shutdown.subscribe();
        if self.is_closed() {
            tracing::debug!("Template registry closed, skipping initialization");
            return;
        }
        if self.inner.initialized.swap(true, Ordering::AcqRel) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .handles
            .thread_pool
            .spawn(Box::pin(async move { inner.run(shutdown).await }));
        tracing::info!(
            node = %self.inner.handles.cluster_service.local_node_id(),
            interval = ?self.inner.reconcile_interval,
            "OTel template registry initialized"
        );
    }

    fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.shutdown.trigger();
        tracing::info!("OTel template registry closed");
    }
}

impl RegistryInner {
    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.reconcile_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                outcome = self.reconcile() => {
                    tracing::debug!(?outcome, "Reconcile pass finished");
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Template registry received shutdown signal, exiting loop");
    }

    async fn reconcile(&self) -> ReconcileOutcome {
        if !self.enabled.load(Ordering::Acquire) {
            return ReconcileOutcome::Disabled;
        }
        if !self.handles.cluster_service.is_elected_master() {
            return ReconcileOutcome::NotMaster;
        }
        if !self
            .handles
            .feature_service
            .cluster_has_feature(OTEL_TEMPLATES_FEATURE)
        {
            tracing::debug!(
                feature = OTEL_TEMPLATES_FEATURE,
                "Cluster lacks feature, deferring template installation"
            );
            return ReconcileOutcome::MissingFeature;
        }

        let mut installed = 0;
        let mut failed = 0;
        for template in catalog::templates() {
            // Deactivation stops new puts; it never cancels the one in flight.
            if !self.enabled.load(Ordering::Acquire) {
                break;
            }
            match self.install(template).await {
                Ok(true) => installed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        template = template.name,
                        kind = %template.kind,
                        error = %e,
                        "Failed to install template, will retry on next pass"
                    );
                    metrics::record_template_push(template.name, "failed");
                    failed += 1;
                }
            }
        }

        ReconcileOutcome::Reconciled { installed, failed }
    }

    /// Install `template` if the cluster holds an older version. Returns whether a put happened.
    async fn install(&self, template: &TemplateConfig) -> Result<bool, TemplateError> {
        let client = &self.handles.client;
        let installed = client.installed_version(template.kind, template.name).await?;
        if installed.is_some_and(|version| version >= TEMPLATE_VERSION) {
            return Ok(false);
        }

        let body = template.load(self.handles.content_registry.as_ref())?;
        client.put_template(template.kind, template.name, body).await?;

        tracing::info!(
            template = template.name,
            kind = %template.kind,
            previous = ?installed,
            version = TEMPLATE_VERSION,
            "Installed template"
        );
        metrics::record_template_push(template.name, "installed");
        Ok(true)
    }
}

/// Builds [`OTelTemplateRegistry`] instances.
#[derive(Debug, Clone)]
pub struct OTelRegistryFactory {
    reconcile_interval: Duration,
}

impl OTelRegistryFactory {
    pub fn new(reconcile_interval: Duration) -> Self {
        Self { reconcile_interval }
    }
}

impl RegistryFactory for OTelRegistryFactory {
    type Registry = OTelTemplateRegistry;

    fn create(&self, handles: RegistryHandles) -> Result<Arc<Self::Registry>, PluginError> {
        if self.reconcile_interval.is_zero() {
            return Err(PluginError::ConstructionFailure(
                "reconcile interval must be greater than zero".to_string(),
            ));
        }
        Ok(Arc::new(OTelTemplateRegistry::new(
            handles,
            self.reconcile_interval,
        )))
    }
}
