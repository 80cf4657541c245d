//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `init` installs a
//! `tracing-subscriber` that also captures those records, so engine and
//! server lines end up in one stream.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var (default `info`).
///
/// # Example
///
/// ```no_run
/// use bm_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    // `try_init` so tests that spin up several servers don't panic.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!("Structured logging initialized");
}

/// Log a completed HTTP request
///
/// # Arguments
///
/// * `request_id` - Correlation id of the request
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if duration_ms > 1000 {
        tracing::warn!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Slow request"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Request completed"
        );
    }
}

/// Log a connection that tripped a rate limit
pub fn log_rate_limited(connection: &str, limit: &str) {
    tracing::warn!(
        connection = connection,
        limit = limit,
        "Rate limit exceeded, dropping frame"
    );
}
