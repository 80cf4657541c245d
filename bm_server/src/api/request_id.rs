//! Request ID middleware for log correlation.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::logging;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuse the caller's request ID, or mint one
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware to add a request ID to all requests and responses
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use bm_server::api::request_id::request_id_middleware;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "Hello" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// ```
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        "Request started"
    );

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    logging::log_api_request(
        &request_id,
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_millis() as u64,
    );

    response
}

/// Request ID stored in request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
