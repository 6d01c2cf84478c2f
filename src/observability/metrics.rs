//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by method, status
//! - `proxy_request_duration_seconds` (histogram): inbound latency
//! - `cache_lookups_total` (counter): lookups by result (hit, miss)
//! - `cache_entries` (gauge): entries in the cache store
//! - `cache_waiters_total` (counter): callers that joined a running fetch
//! - `cache_refresh_skipped_total` (counter): background refreshes not started
//! - `upstream_fetches_total` (counter): fetches by outcome (ok, error)
//! - `upstream_fetch_duration_seconds` (histogram): fetch + patch latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder (tests) every call is a no-op
//! - The Prometheus exporter serves its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("cache_entries").set(entries as f64);
}

pub fn record_waiter() {
    counter!("cache_waiters_total").increment(1);
}

pub fn record_refresh_skipped() {
    counter!("cache_refresh_skipped_total").increment(1);
}

pub fn record_upstream_fetch(ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("upstream_fetches_total", "outcome" => outcome).increment(1);
    histogram!("upstream_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}
