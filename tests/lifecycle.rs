//! Lifecycle controller behaviour against a recording registry.

use std::sync::Arc;

use otel_data::config::Settings;
use otel_data::error::PluginError;
use otel_data::lifecycle::{OTelPlugin, Plugin};
use otel_data::registry::TemplateRegistry;

mod common;

use common::{registry_flag, services, RecordingFactory};

fn plugin(static_flag: bool) -> (OTelPlugin<RecordingFactory>, RecordingFactory) {
    let factory = RecordingFactory::default();
    let settings = Settings::new().with("xpack.otel_data.enabled", static_flag.to_string());
    (OTelPlugin::with_factory(&settings, factory.clone()), factory)
}

#[tokio::test]
async fn test_disabled_plugin_constructs_but_never_initializes() {
    let (plugin, factory) = plugin(false);
    let cluster = common::cluster();
    let (services, live) = services(&cluster, registry_flag(true));

    plugin.on_start(&services).unwrap();

    let registry = plugin.registry().unwrap();
    assert_eq!(factory.created(), 1);
    assert!(!registry.is_enabled());
    assert_eq!(registry.initialize_count(), 0);

    // The registry flag has no effect while the plugin is disabled.
    live.apply(registry_flag(false));
    live.apply(registry_flag(true));
    assert!(!registry.is_enabled());
    assert_eq!(registry.initialize_count(), 0);
    assert!(registry.enabled_history().is_empty());

    plugin.on_close().unwrap();
    assert_eq!(registry.close_count(), 1);
}

#[tokio::test]
async fn test_enabled_and_active_initializes_once() {
    let (plugin, factory) = plugin(true);
    let cluster = common::cluster();
    let (services, _live) = services(&cluster, registry_flag(true));

    plugin.on_start(&services).unwrap();

    let registry = plugin.registry().unwrap();
    assert_eq!(factory.created(), 1);
    assert!(registry.is_enabled());
    assert_eq!(registry.initialize_count(), 1);

    plugin.on_close().unwrap();
    assert_eq!(registry.close_count(), 1);
}

#[tokio::test]
async fn test_enabled_but_inactive_initializes_on_first_activation() {
    let (plugin, factory) = plugin(true);
    let cluster = common::cluster();
    let (services, live) = services(&cluster, Settings::new());

    plugin.on_start(&services).unwrap();

    let before = plugin.registry().unwrap();
    assert!(!before.is_enabled());
    assert_eq!(before.initialize_count(), 0);
    assert_eq!(before.enabled_history(), vec![false]);

    live.apply(registry_flag(true));

    let after = plugin.registry().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.is_enabled());
    assert_eq!(after.initialize_count(), 1);
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn test_rapid_toggles_only_change_active_state() {
    let (plugin, factory) = plugin(true);
    let cluster = common::cluster();
    let (services, live) = services(&cluster, registry_flag(true));

    plugin.on_start(&services).unwrap();
    let registry = plugin.registry().unwrap();

    for _ in 0..10 {
        live.apply(registry_flag(false));
        live.apply(registry_flag(true));
    }

    assert_eq!(factory.created(), 1);
    assert_eq!(registry.initialize_count(), 1);
    assert!(registry.is_enabled());
    assert_eq!(registry.enabled_history().len(), 21);
    assert!(Arc::ptr_eq(&registry, &plugin.registry().unwrap()));
}

#[tokio::test]
async fn test_malformed_flag_keeps_active_state() {
    let (plugin, _factory) = plugin(true);
    let cluster = common::cluster();
    let (services, live) = services(&cluster, registry_flag(true));

    plugin.on_start(&services).unwrap();
    let registry = plugin.registry().unwrap();

    let report = live.apply(Settings::new().with("xpack.otel_data.registry.enabled", "enabled"));
    assert_eq!(report.rejected.len(), 1);
    assert!(registry.is_enabled());
    assert_eq!(registry.enabled_history(), vec![true]);
}

#[tokio::test]
async fn test_double_start_is_rejected_without_second_construction() {
    for static_flag in [false, true] {
        let (plugin, factory) = plugin(static_flag);
        let cluster = common::cluster();
        let (services, _live) = services(&cluster, Settings::new());

        plugin.on_start(&services).unwrap();
        assert_eq!(
            plugin.on_start(&services),
            Err(PluginError::DoubleInitialization)
        );
        assert_eq!(factory.created(), 1);
    }
}

#[tokio::test]
async fn test_close_before_start_is_uninitialized_state() {
    let (plugin, factory) = plugin(true);
    assert_eq!(plugin.on_close(), Err(PluginError::UninitializedState));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_close_runs_once_regardless_of_active_state() {
    for (static_flag, dynamic_flag) in [(false, false), (true, false), (true, true)] {
        let (plugin, _factory) = plugin(static_flag);
        let cluster = common::cluster();
        let (services, _live) = services(&cluster, registry_flag(dynamic_flag));

        plugin.on_start(&services).unwrap();
        plugin.on_close().unwrap();
        plugin.on_close().unwrap();

        assert_eq!(plugin.registry().unwrap().close_count(), 1);
    }
}

#[tokio::test]
async fn test_missing_handle_fails_startup() {
    let (plugin, factory) = plugin(true);
    let cluster = common::cluster();
    let services = otel_data::cluster::PluginServices::new().with_client(cluster);

    assert!(matches!(
        plugin.on_start(&services),
        Err(PluginError::ConstructionFailure(_))
    ));
    assert_eq!(factory.created(), 0);
    assert_eq!(plugin.on_close(), Err(PluginError::UninitializedState));
}

#[tokio::test]
async fn test_missing_live_settings_fails_enabled_startup() {
    let (plugin, _factory) = plugin(true);
    let cluster = common::cluster();

    assert!(matches!(
        plugin.on_start(&common::handles(&cluster)),
        Err(PluginError::ConstructionFailure(_))
    ));
}

#[tokio::test]
async fn test_updates_after_close_are_ignored() {
    let (plugin, _factory) = plugin(true);
    let cluster = common::cluster();
    let (services, live) = services(&cluster, Settings::new());

    plugin.on_start(&services).unwrap();
    plugin.on_close().unwrap();

    live.apply(registry_flag(true));
    live.apply(registry_flag(false));

    let registry = plugin.registry().unwrap();
    assert!(!registry.is_enabled());
    assert_eq!(registry.initialize_count(), 0);
    assert_eq!(registry.enabled_history(), vec![false]);
    assert_eq!(registry.close_count(), 1);
}
