//! Prometheus metrics for monitoring server health.
//!
//! Room-level counters (active rooms, games started and finished, bluff
//! calls, persistence failures) are recorded by the room actors in the
//! library. This module installs the exporter and records the transport-side
//! metrics.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bm_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connection_opened();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record a new WebSocket connection.
pub fn websocket_connection_opened() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record a closed WebSocket connection.
pub fn websocket_connection_closed() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages received counter.
pub fn websocket_message_received(kind: &'static str) {
    metrics::counter!("websocket_messages_received", "type" => kind).increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_message_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(limit: &'static str) {
    metrics::counter!("rate_limit_hits_total", "limit" => limit).increment(1);
}
