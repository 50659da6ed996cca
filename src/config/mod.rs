//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! node config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NodeConfig, [settings] flattened into Settings
//!     → gate.rs reads the static feature flag
//!
//! live settings file (TOML):
//!     watcher.rs detects change
//!     → loader.rs loads the snapshot
//!     → live.rs validates and swaps overrides atomically
//!     → consumers of changed dynamic settings are notified
//! ```
//!
//! # Design Decisions
//! - Static settings are fixed for the process lifetime
//! - Dynamic settings are opt-in per descriptor (`Property::Dynamic`)
//! - A rejected live value never replaces the last known-good one

pub mod gate;
pub mod live;
pub mod loader;
pub mod schema;
pub mod setting;
pub mod validation;
pub mod watcher;

pub use gate::{OTEL_DATA_ENABLED, OTEL_DATA_REGISTRY_ENABLED};
pub use live::LiveSettings;
pub use schema::{NodeConfig, ObservabilityConfig, RegistryConfig};
pub use setting::{BoolSetting, Property, SettingDescriptor, Settings};
