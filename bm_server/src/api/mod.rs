//! HTTP/WebSocket API for the Bluffmaster server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: Middleware for CORS and request ids
//! - **Actor Model**: Room state is owned by one actor task per room
//!
//! # Modules
//!
//! - [`websocket`]: The game protocol; every game action travels over it
//! - [`rooms`]: Read-only room listing and lookup
//! - [`rate_limiter`]: Per-connection inbound frame limits
//! - [`request_id`]: Request correlation ids
//!
//! # Endpoints Overview
//!
//! ```text
//! GET /health                  - Server health status
//! GET /ws                      - WebSocket game connection
//! GET /api/v1/rooms            - List live rooms
//! GET /api/v1/rooms/{code}     - Public state of one room
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; browsers connect from wherever the client
//! is served.

pub mod rate_limiter;
pub mod request_id;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use bluffmaster::RoomManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request (cheap due to the Arc wrapper).
#[derive(Clone)]
pub struct AppState {
    pub room_manager: Arc<RoomManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use bm_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{code}", get(rooms::get_room));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"1.0.0","rooms":{"active_count":2},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.room_manager.active_room_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": {
            "active_count": active_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
