//! Metrics collection and exposition.
//!
//! # Metrics
//! - `geo_gate_decisions_total` (counter): decisions by `result` and matching `provider`
//! - `geo_gate_extraction_failures_total` (counter): requests without a usable client address
//! - `geo_gate_prefixes` (gauge): canonical prefix count per `provider`
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::filter::FilterChain;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record an allow (with the matching provider) or a deny.
pub fn record_decision(provider: Option<&'static str>) {
    let (result, provider) = match provider {
        Some(p) => ("allowed", p),
        None => ("denied", "none"),
    };
    metrics::counter!("geo_gate_decisions_total", "result" => result, "provider" => provider).increment(1);
}

pub fn record_extraction_failure() {
    metrics::counter!("geo_gate_extraction_failures_total").increment(1);
}

/// Publish the size of every provider's prefix pool.
pub fn record_chain(chain: &FilterChain) {
    for provider in chain.providers() {
        metrics::gauge!("geo_gate_prefixes", "provider" => provider.provider())
            .set(provider.prefix_count() as f64);
    }
}
