//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ezstub_requests_total` (counter): requests by method, status, outcome
//! - `ezstub_request_duration_seconds` (histogram): handling latency
//! - `ezstub_routes` (gauge): number of configured paths
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is optional and bound to its own address
//! - Extension methods share one `OTHER` label to keep series bounded

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &Method, status: u16, outcome: &'static str, start: Instant) {
    let method = method_label(method);
    let status = status.to_string();
    metrics::counter!(
        "ezstub_requests_total",
        "method" => method,
        "status" => status.clone(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "ezstub_request_duration_seconds",
        "method" => method,
        "status" => status,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the size of the route table.
pub fn record_routes(count: usize) {
    metrics::gauge!("ezstub_routes").set(count as f64);
}

fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "PATCH" => "PATCH",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}
