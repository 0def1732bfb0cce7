//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_requests_total` (counter): dispatched requests by method, outcome
//! - `breaker_request_duration_seconds` (histogram): transport latency by method
//! - `breaker_short_circuits_total` (counter): requests denied by an open circuit
//! - `breaker_transitions_total` (counter): status changes by destination status
//! - `breaker_open` (gauge): 1=open or half-open, 0=closed
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder every call
//!   is a no-op, so library users pay nothing unless they opt in
//! - Labels carry the breaker's base URL, never the full request path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::state::CircuitStatus;
use crate::resilience::window::Outcome;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request and its latency.
pub fn record_request(target: &str, method: &str, outcome: Outcome, start: Instant) {
    metrics::counter!(
        "breaker_requests_total",
        "target" => target.to_string(),
        "method" => method.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(
        "breaker_request_duration_seconds",
        "target" => target.to_string(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request denied without calling the transport.
pub fn record_short_circuit(target: &str, method: &str) {
    metrics::counter!(
        "breaker_short_circuits_total",
        "target" => target.to_string(),
        "method" => method.to_string()
    )
    .increment(1);
}

/// Record a status change.
pub fn record_transition(target: &str, to: CircuitStatus) {
    metrics::counter!(
        "breaker_transitions_total",
        "target" => target.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Publish whether the circuit currently denies ordinary traffic.
pub fn record_circuit_open(target: &str, open: bool) {
    metrics::gauge!("breaker_open", "target" => target.to_string()).set(if open { 1.0 } else { 0.0 });
}
