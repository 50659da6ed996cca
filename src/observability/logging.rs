//! Structured logging.
//!
//! # Design Decisions
//! - Uses the tracing crate; subscriber installed once by the binary
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

fn default_directives(level: &str) -> String {
    format!("otel_data={level},otel_data_node={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("otel_data=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
