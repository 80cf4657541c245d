//! Read-only room endpoints.
//!
//! Everything that changes a room goes through the WebSocket; these handlers
//! only expose what any player in the room could already see.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use bluffmaster::{GameError, GameStateView, room::RoomSummary};
use serde_json::{Value, json};

use super::{AppState, request_id::RequestId};

/// List live rooms.
///
/// # Response
///
/// ```json
/// [{"code": "ABCD", "playerCount": 3, "maxPlayers": 10, "phase": "waiting", "updatedAt": "..."}]
/// ```
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.room_manager.list_rooms().await)
}

/// Get the public state of one room.
///
/// Returns the same payload as a `game-state` event, or `404 Not Found` if no
/// live room has that code.
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<GameStateView>, (StatusCode, Json<Value>)> {
    match state.room_manager.get_room_state(&code).await {
        Some(view) => Ok(Json(view)),
        None => {
            tracing::debug!(request_id = request_id.as_str(), code = %code, "Room lookup missed");
            Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "error": GameError::RoomNotFound.to_string() })),
            ))
        }
    }
}
