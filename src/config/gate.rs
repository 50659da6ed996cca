//! Config gate for the OTel data plugin.
//!
//! Two independent flags decide whether the template registry does work:
//! - `xpack.otel_data.enabled`: static, read once when the plugin is built
//! - `xpack.otel_data.registry.enabled`: dynamic, may flip at runtime

use crate::config::live::LiveSettings;
use crate::config::setting::{BoolSetting, Property, Settings};

/// Static node flag enabling the OTel data feature.
pub const OTEL_DATA_ENABLED: BoolSetting = BoolSetting::new(
    "xpack.otel_data.enabled",
    true,
    &[Property::NodeScope],
    "Enables the OTel data feature on this node.",
);

/// Dynamic flag enabling the OTel index template registry.
///
/// Ignored while `xpack.otel_data.enabled` is false. Opt-in, so staged
/// rollouts can switch it on node group by node group.
pub const OTEL_DATA_REGISTRY_ENABLED: BoolSetting = BoolSetting::new(
    "xpack.otel_data.registry.enabled",
    false,
    &[Property::NodeScope, Property::Dynamic],
    "Enables the OTel index template registry. Ignored if xpack.otel_data.enabled is false.",
);

/// Resolve the static feature flag from startup settings.
///
/// Absent or malformed values resolve to the default; malformed startup
/// values are rejected by validation before the plugin is assembled.
pub fn resolve_static_flag(settings: &Settings) -> bool {
    OTEL_DATA_ENABLED.get_or_default(settings)
}

/// Resolve the most recently applied value of the dynamic registry flag.
pub fn resolve_dynamic_flag(live: &LiveSettings) -> bool {
    live.get_bool(&OTEL_DATA_REGISTRY_ENABLED)
}
