//! Host lifecycle interface.

use crate::cluster::PluginServices;
use crate::config::SettingDescriptor;
use crate::error::PluginError;

/// Hooks a node host calls on each of its plugins.
///
/// Ordering is the host's responsibility: `exposed_config_keys` before
/// `on_start`, `on_start` exactly once, `on_close` exactly once at shutdown.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Assemble the plugin's components against the cluster handles.
    fn on_start(&self, services: &PluginServices) -> Result<(), PluginError>;

    /// Release everything `on_start` created.
    fn on_close(&self) -> Result<(), PluginError>;

    /// Settings the host must register for validation and dynamic updates.
    fn exposed_config_keys(&self) -> Vec<SettingDescriptor>;
}
