//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Register settings → Validate → Plugin::on_start → Watch live settings
//!
//! Runtime:
//!     Live settings change → consumer → registry active state
//!
//! Shutdown (startup.rs, shutdown.rs):
//!     Ctrl-C → stop live updates → Plugin::on_close → registry close
//! ```
//!
//! # Design Decisions
//! - The registry slot is write-once; double start and close-before-start
//!   are host contract violations and surface as errors
//! - Shutdown is idempotent

pub mod controller;
pub mod plugin;
pub mod shutdown;
pub mod slot;
pub mod startup;

pub use controller::OTelPlugin;
pub use plugin::Plugin;
pub use shutdown::Shutdown;
pub use slot::SetOnce;
pub use startup::Node;
