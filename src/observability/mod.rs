//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (logging.rs installs the subscriber)
//!     → metrics.rs (registry state, template pushes, settings updates)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
