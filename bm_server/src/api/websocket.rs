//! WebSocket handler carrying the game protocol.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws` and is assigned a fresh connection id
//! 2. Server spawns a send task forwarding room events to the socket
//! 3. Incoming frames are rate limited, parsed and forwarded to the room
//!    manager; rejections come back as `error` events to this socket only
//! 4. On disconnect the connection leaves every room it joined
//!
//! # Client Messages
//!
//! ```json
//! {"type": "join", "roomCode": "ABCD", "playerName": "alice"}
//! {"type": "add-bot", "roomCode": "ABCD"}
//! {"type": "start-game", "roomCode": "ABCD"}
//! {"type": "play-cards", "roomCode": "ABCD", "cards": ["AH", "AS"], "claimedRank": "A"}
//! {"type": "call-bluff", "roomCode": "ABCD"}
//! {"type": "pass", "roomCode": "ABCD"}
//! {"type": "rejoin", "roomCode": "ABCD", "playerId": "…", "rejoinToken": "…"}
//! ```
//!
//! # Server Messages
//!
//! Every frame is `{"event": "<name>", "data": {...}}`, e.g.
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.onopen = () => ws.send(JSON.stringify({type: "join", roomCode: "ABCD", playerName: "alice"}));
//! ws.onmessage = (frame) => {
//!   const {event, data} = JSON.parse(frame.data);
//!   if (event === "game-state") render(data);
//! };
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bluffmaster::{Card, GameError, GameResult, PlayerId, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{AppState, rate_limiter::ConnectionLimiter};
use crate::{logging, metrics};

/// Events buffered per connection before room actors start dropping them
const EVENT_BUFFER: usize = 256;

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Take a seat, creating the room if needed
    Join {
        room_code: String,
        #[serde(default)]
        player_name: String,
    },
    /// Seat a bot (host only)
    AddBot { room_code: String },
    /// Deal and start (host only)
    StartGame { room_code: String },
    /// Surrender cards face down under a declared rank
    PlayCards {
        room_code: String,
        cards: Vec<String>,
        #[serde(default)]
        claimed_rank: Option<String>,
    },
    /// Challenge the latest play
    CallBluff { room_code: String },
    /// Decline to play into the open round
    Pass { room_code: String },
    /// Reclaim a seat after reconnecting, proving ownership with the token
    /// from the seat's `player-id` event
    Rejoin {
        room_code: String,
        player_id: PlayerId,
        rejoin_token: String,
    },
}

impl ClientMessage {
    /// Wire name, used as a metrics label
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::AddBot { .. } => "add-bot",
            Self::StartGame { .. } => "start-game",
            Self::PlayCards { .. } => "play-cards",
            Self::CallBluff { .. } => "call-bluff",
            Self::Pass { .. } => "pass",
            Self::Rejoin { .. } => "rejoin",
        }
    }
}

/// Upgrade HTTP connection to WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Room actors push events into this connection's channel; the send task
/// serializes them onto the socket in order.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: connection={}", connection);
    metrics::websocket_connection_opened();

    let mut limiter = ConnectionLimiter::default();
    let mut joined: HashSet<String> = HashSet::new();
    let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(EVENT_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize {} event: {}", event.name(), e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_message_sent();
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(limit) = limiter.admit() {
                    logging::log_rate_limited(&connection.to_string(), limit.as_str());
                    metrics::rate_limit_hits_total(limit.as_str());
                    if event_tx.send(ServerEvent::error(limit.message())).await.is_err() {
                        break;
                    }
                    continue;
                }

                let result = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        debug!(
                            "Received {} from connection {}",
                            client_msg.name(),
                            connection
                        );
                        metrics::websocket_message_received(client_msg.name());
                        handle_client_message(client_msg, connection, &event_tx, &state, &mut joined)
                            .await
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        Err("Invalid message format".to_string())
                    }
                };

                if let Err(message) = result
                    && event_tx.send(ServerEvent::error(message)).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: connection={}", connection);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Leave every room this connection sat in.
    for code in &joined {
        match state.room_manager.disconnect(code, connection).await {
            Ok(()) => info!("Connection {} left room {}", connection, code),
            Err(GameError::RoomNotFound | GameError::NotInRoom) => {}
            Err(e) => warn!(
                "Failed to remove connection {} from room {}: {}",
                connection, code, e
            ),
        }
    }

    send_task.abort();
    metrics::websocket_connection_closed();
    info!("WebSocket disconnected: connection={}", connection);
}

/// Forward one client message to the room manager.
///
/// # Returns
///
/// * `GameResult<()>` - The rejection to report back, if any
async fn handle_client_message(
    msg: ClientMessage,
    connection: Uuid,
    events: &mpsc::Sender<ServerEvent>,
    state: &AppState,
    joined: &mut HashSet<String>,
) -> GameResult<()> {
    let manager = &state.room_manager;

    match msg {
        ClientMessage::Join {
            room_code,
            player_name,
        } => {
            manager
                .join_room(&room_code, &player_name, connection, events.clone())
                .await?;
            joined.insert(room_code.trim().to_string());
        }

        ClientMessage::Rejoin {
            room_code,
            player_id,
            rejoin_token,
        } => {
            manager
                .rejoin_room(
                    &room_code,
                    &player_id,
                    &rejoin_token,
                    connection,
                    events.clone(),
                )
                .await?;
            joined.insert(room_code.trim().to_string());
        }

        ClientMessage::AddBot { room_code } => manager.add_bot(&room_code, connection).await?,

        ClientMessage::StartGame { room_code } => {
            manager.start_game(&room_code, connection).await?
        }

        ClientMessage::PlayCards {
            room_code,
            cards,
            claimed_rank,
        } => {
            let cards = Card::parse_selection(&cards)?;
            manager
                .play_cards(&room_code, connection, cards, claimed_rank)
                .await?
        }

        ClientMessage::CallBluff { room_code } => {
            manager.call_bluff(&room_code, connection).await?
        }

        ClientMessage::Pass { room_code } => manager.pass(&room_code, connection).await?,
    }

    Ok(())
}
