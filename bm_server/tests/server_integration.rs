//! Integration tests for the HTTP endpoints.
//!
//! Requests are driven through the router with `oneshot`, no socket needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bluffmaster::{MemoryRoomRepository, RoomConfig, RoomManager};
use bm_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

/// Helper to create a test router over an in-memory store
fn create_test_server() -> (axum::Router, Arc<RoomManager>) {
    let room_manager = Arc::new(RoomManager::new(
        Arc::new(MemoryRoomRepository::default()),
        RoomConfig::default(),
    ));
    let app = create_router(AppState {
        room_manager: room_manager.clone(),
    });
    (app, room_manager)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_server();
    let (status, headers, json) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["rooms"]["active_count"], 0);
    assert!(json["timestamp"].is_string());
    assert!(headers.contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = create_test_server();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(REQUEST_ID_HEADER, "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "trace-me"
    );
}

#[tokio::test]
async fn test_list_rooms_empty() {
    let (app, _) = create_test_server();
    let (status, _, json) = get(app, "/api/v1/rooms").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_unknown_room_is_404() {
    let (app, _) = create_test_server();
    let (status, headers, json) = get(app, "/api/v1/rooms/NOPE").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "room not found");
    assert!(headers.contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_room_endpoints_show_live_room() {
    let (app, manager) = create_test_server();
    let (tx, _rx) = mpsc::channel(32);
    let host = Uuid::new_v4();
    manager
        .join_room("ABCD", "alice", host, tx.clone())
        .await
        .unwrap();
    manager.add_bot("ABCD", host).await.unwrap();

    let (status, _, rooms) = get(app.clone(), "/api/v1/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms[0]["code"], "ABCD");
    assert_eq!(rooms[0]["playerCount"], 2);
    assert_eq!(rooms[0]["phase"], "waiting");

    let (status, _, view) = get(app.clone(), "/api/v1/rooms/ABCD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["started"], false);
    assert_eq!(view["players"].as_array().unwrap().len(), 2);
    assert_eq!(view["players"][0]["isHost"], true);
    assert_eq!(view["players"][1]["isBot"], true);

    let (_, _, health) = get(app, "/health").await;
    assert_eq!(health["rooms"]["active_count"], 1);
}

#[tokio::test]
async fn test_room_view_never_exposes_hands() {
    let (app, manager) = create_test_server();
    let (tx, _rx) = mpsc::channel(32);
    let host = Uuid::new_v4();
    manager
        .join_room("HIDE", "alice", host, tx.clone())
        .await
        .unwrap();
    manager
        .join_room("HIDE", "bob", Uuid::new_v4(), tx)
        .await
        .unwrap();
    manager.start_game("HIDE", host).await.unwrap();

    let (status, _, view) = get(app, "/api/v1/rooms/HIDE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["started"], true);
    assert_eq!(view["players"][0]["cardCount"], 26);
    assert!(view["players"][0].get("hand").is_none());
    assert!(!view.to_string().contains("\"hand\""));
}
