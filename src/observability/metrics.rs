//! Metrics collection and exposition.
//!
//! # Metrics
//! - `otel_registry_active` (gauge): 1 while the template registry is active
//! - `otel_registry_template_push_total` (counter): template installs by template, outcome
//! - `otel_settings_update_total` (counter): live settings updates by key, outcome
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_registry_active(active: bool) {
    metrics::gauge!("otel_registry_active").set(if active { 1.0 } else { 0.0 });
}

pub fn record_template_push(template: &'static str, outcome: &'static str) {
    metrics::counter!(
        "otel_registry_template_push_total",
        "template" => template,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_settings_update(key: &str, outcome: &'static str) {
    metrics::counter!(
        "otel_settings_update_total",
        "key" => key.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
