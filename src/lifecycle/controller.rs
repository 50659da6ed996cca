//! Lifecycle controller for the OTel template registry.
//!
//! # States
//! ```text
//! UNCREATED → CONSTRUCTED          on_start
//! CONSTRUCTED → ACTIVE             static && dynamic, initialize()
//! CONSTRUCTED → INACTIVE           !static, or static && !dynamic
//! ACTIVE ⇄ INACTIVE                dynamic flag update, no re-construction
//! * → CLOSED                       on_close
//! ```
//!
//! # Design Decisions
//! - The registry is built even when the plugin is disabled, so a node
//!   always owns exactly one instance
//! - While disabled the dynamic flag has no effect: no consumer is
//!   registered and the instance is never activated
//! - `initialize` runs on the first transition to ACTIVE only; later
//!   activations just flip the active state
//! - CLOSED is terminal: flag updates arriving after `on_close` are dropped

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::PluginServices;
use crate::config::gate::{resolve_static_flag, OTEL_DATA_REGISTRY_ENABLED};
use crate::config::{RegistryConfig, SettingDescriptor, Settings};
use crate::error::PluginError;
use crate::lifecycle::plugin::Plugin;
use crate::lifecycle::slot::SetOnce;
use crate::registry::{OTelRegistryFactory, RegistryFactory, RegistryHandles, TemplateRegistry};

/// Plugin owning the OTel template registry.
pub struct OTelPlugin<F: RegistryFactory = OTelRegistryFactory> {
    enabled: bool,
    factory: F,
    registry: SetOnce<F::Registry>,
    initialized: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl<F: RegistryFactory> std::fmt::Debug for OTelPlugin<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OTelPlugin")
            .field("enabled", &self.enabled)
            .field("registry", &self.registry)
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl OTelPlugin {
    /// Build the plugin with the production registry.
    pub fn new(settings: &Settings, config: &RegistryConfig) -> Self {
        let factory =
            OTelRegistryFactory::new(Duration::from_secs(config.reconcile_interval_secs));
        Self::with_factory(settings, factory)
    }
}

impl<F: RegistryFactory> OTelPlugin<F> {
    /// Build the plugin; the static feature flag is resolved here, once.
    pub fn with_factory(settings: &Settings, factory: F) -> Self {
        Self {
            enabled: resolve_static_flag(settings),
            factory,
            registry: SetOnce::new(),
            initialized: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Value of the static feature flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The registry stored by `on_start`.
    pub fn registry(&self) -> Result<Arc<F::Registry>, PluginError> {
        self.registry.get()
    }
}

impl<F: RegistryFactory> Plugin for OTelPlugin<F> {
    fn name(&self) -> &'static str {
        "otel-data"
    }

    fn on_start(&self, services: &PluginServices) -> Result<(), PluginError> {
        tracing::info!(
            "OTel ingest plugin is {}",
            if self.enabled { "enabled" } else { "disabled" }
        );

        if self.registry.is_set() {
            return Err(PluginError::DoubleInitialization);
        }
        let handles = RegistryHandles::from_services(services)?;
        let registry = self.factory.create(handles)?;
        self.registry.set(Arc::clone(&registry))?;

        if !self.enabled {
            tracing::debug!(
                setting = OTEL_DATA_REGISTRY_ENABLED.key(),
                "Plugin disabled, registry flag has no effect"
            );
            return Ok(());
        }

        let live = services.live_settings().ok_or_else(|| {
            PluginError::ConstructionFailure("missing live settings".to_string())
        })?;

        // The initial value and later updates are delivered in order, so a
        // racing update can never be overwritten by a stale startup read.
        let guard = ActivationGuard {
            initialized: Arc::clone(&self.initialized),
            closed: Arc::clone(&self.closed),
        };
        live.add_update_consumer_with_current(OTEL_DATA_REGISTRY_ENABLED, move |active| {
            tracing::info!(active, "Registry flag updated");
            guard.activate(registry.as_ref(), active);
        })
        .map_err(|e| PluginError::ConstructionFailure(e.to_string()))?;

        Ok(())
    }

    fn on_close(&self) -> Result<(), PluginError> {
        let registry = self.registry.get()?;
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Plugin already closed");
            return Ok(());
        }
        registry.close();
        Ok(())
    }

    fn exposed_config_keys(&self) -> Vec<SettingDescriptor> {
        vec![OTEL_DATA_REGISTRY_ENABLED.descriptor()]
    }
}

/// State shared between the controller and its flag consumer.
#[derive(Debug, Clone, Default)]
struct ActivationGuard {
    initialized: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl ActivationGuard {
    fn activate<R: TemplateRegistry>(&self, registry: &R, active: bool) {
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(active, "Plugin closed, ignoring registry flag");
            return;
        }
        registry.set_enabled(active);
        if active
            && !self.closed.load(Ordering::Acquire)
            && !self.initialized.swap(true, Ordering::AcqRel)
        {
            registry.initialize();
        }
    }
}
