//! Node assembly.
//!
//! # Responsibilities
//! - Register built-in and plugin settings with the live store
//! - Validate startup settings before anything is built
//! - Call the plugin hooks in order and route live settings updates
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The live settings watcher starts only after `on_start` succeeded

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::{broadcast, mpsc};

use crate::cluster::PluginServices;
use crate::config::gate::OTEL_DATA_ENABLED;
use crate::config::live::LiveSettings;
use crate::config::loader::load_settings;
use crate::config::validation::validate_settings;
use crate::config::watcher::SettingsWatcher;
use crate::config::{NodeConfig, SettingDescriptor, Settings};
use crate::error::{NodeError, PluginError};
use crate::lifecycle::plugin::Plugin;
use crate::lifecycle::shutdown::Shutdown;

/// A running node hosting one plugin.
pub struct Node {
    config: NodeConfig,
    live: Arc<LiveSettings>,
    plugin: Box<dyn Plugin>,
    shutdown: Shutdown,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.config.node.name)
            .field("plugin", &self.plugin.name())
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Settings the node itself owns.
    pub fn builtin_settings() -> Vec<SettingDescriptor> {
        vec![OTEL_DATA_ENABLED.descriptor()]
    }

    /// Assemble the node and start its plugin.
    ///
    /// `services` carries the cluster handles; the node adds the startup
    /// settings and the live settings store before handing it over.
    pub fn start(
        config: NodeConfig,
        services: PluginServices,
        plugin: Box<dyn Plugin>,
    ) -> Result<Self, NodeError> {
        let settings = config.settings();
        let live = Arc::new(LiveSettings::new(settings.clone()));
        for descriptor in Self::builtin_settings()
            .into_iter()
            .chain(plugin.exposed_config_keys())
        {
            live.register(descriptor);
        }

        validate_settings(&settings, &live.registered()).map_err(NodeError::Settings)?;

        let services = services
            .with_settings(settings)
            .with_live_settings(Arc::clone(&live));
        plugin.on_start(&services)?;

        tracing::info!(
            node = %config.node.name,
            plugin = plugin.name(),
            "Node started"
        );

        Ok(Self {
            config,
            live,
            plugin,
            shutdown: Shutdown::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn live_settings(&self) -> &Arc<LiveSettings> {
        &self.live
    }

    /// Apply a live settings snapshot directly.
    pub fn apply_settings(&self, update: Settings) {
        apply_snapshot(&self.live, update);
    }

    /// Load `path` once, then watch it and apply every change.
    ///
    /// Must be called inside a tokio runtime. Keep the returned watcher alive.
    pub fn watch_live_settings(&self, path: &Path) -> Result<RecommendedWatcher, NodeError> {
        if path.exists() {
            self.apply_settings(load_settings(path)?);
        }

        let poll_interval = Duration::from_secs(self.config.live_settings.poll_interval_secs);
        let (watcher, updates) = SettingsWatcher::new(path, poll_interval);
        let handle = watcher.run()?;

        tokio::spawn(apply_updates(
            Arc::clone(&self.live),
            updates,
            self.shutdown.subscribe(),
        ));
        Ok(handle)
    }

    /// Stop background tasks and close the plugin.
    pub fn close(self) -> Result<(), PluginError> {
        self.shutdown.trigger();
        self.plugin.on_close()?;
        tracing::info!(node = %self.config.node.name, "Node closed");
        Ok(())
    }
}

async fn apply_updates(
    live: Arc<LiveSettings>,
    mut updates: mpsc::UnboundedReceiver<Settings>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => apply_snapshot(&live, update),
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Live settings updates stopped");
}

fn apply_snapshot(live: &LiveSettings, update: Settings) {
    let report = live.apply(update);
    if !report.rejected.is_empty() {
        tracing::warn!(
            rejected = report.rejected.len(),
            "Some live settings were rejected"
        );
    }
    tracing::debug!(changed = ?report.changed, "Applied live settings");
}

/// Wait for Ctrl-C.
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    Ok(())
}
