//! WebSocket integration tests against a live server.
//!
//! Each test binds the router to an ephemeral port and talks to it with
//! tokio-tungstenite, exactly like a browser client would.

use bluffmaster::{MemoryRoomRepository, RoomConfig, RoomManager};
use bm_server::api::{AppState, create_router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper to start a server on an ephemeral port
async fn start_server() -> (SocketAddr, Arc<RoomManager>) {
    let room_manager = Arc::new(RoomManager::new(
        Arc::new(MemoryRoomRepository::default()),
        RoomConfig {
            bot_delay: Duration::ZERO,
            seed: Some(5),
            ..RoomConfig::default()
        },
    ));
    let app = create_router(AppState {
        room_manager: room_manager.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, room_manager)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("WebSocket handshake failed");
    client
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame parsed as JSON
async fn next_frame(client: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until `event` arrives and return its data
async fn wait_for(client: &mut Client, event: &str) -> Value {
    loop {
        let frame = next_frame(client).await;
        if frame["event"] == event {
            return frame["data"].clone();
        }
    }
}

#[tokio::test]
async fn test_join_reports_player_id() {
    let (addr, manager) = start_server().await;
    let mut client = connect(addr).await;

    send(
        &mut client,
        json!({"type": "join", "roomCode": "WS1", "playerName": "alice"}),
    )
    .await;

    let data = wait_for(&mut client, "player-id").await;
    assert!(data["playerId"].is_string());
    let token = data["rejoinToken"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let joined = wait_for(&mut client, "room-joined").await;
    assert_eq!(joined["players"][0]["name"], "alice");
    assert_eq!(joined["players"][0]["isHost"], true);
    assert!(!joined.to_string().contains(&token));

    assert_eq!(manager.active_room_count().await, 1);
}

#[tokio::test]
async fn test_rejoin_with_public_id_rejected() {
    let (addr, _) = start_server().await;
    let mut alice = connect(addr).await;
    let mut stranger = connect(addr).await;

    send(
        &mut alice,
        json!({"type": "join", "roomCode": "SEAT", "playerName": "alice"}),
    )
    .await;
    let data = wait_for(&mut alice, "player-id").await;
    let alice_id = data["playerId"].clone();

    send(
        &mut stranger,
        json!({"type": "rejoin", "roomCode": "SEAT", "playerId": alice_id, "rejoinToken": alice_id}),
    )
    .await;
    let frame = next_frame(&mut stranger).await;
    assert_eq!(frame["event"], "error");
    assert_eq!(frame["data"]["message"], "rejoin token rejected");
}

#[tokio::test]
async fn test_join_and_start_flow() {
    let (addr, _) = start_server().await;
    let mut host = connect(addr).await;
    let mut guest = connect(addr).await;

    send(
        &mut host,
        json!({"type": "join", "roomCode": "FLOW", "playerName": "host"}),
    )
    .await;
    wait_for(&mut host, "player-id").await;
    send(
        &mut guest,
        json!({"type": "join", "roomCode": "FLOW", "playerName": "guest"}),
    )
    .await;
    wait_for(&mut guest, "player-id").await;

    // Only the host may start.
    send(&mut guest, json!({"type": "start-game", "roomCode": "FLOW"})).await;
    let error = wait_for(&mut guest, "error").await;
    assert_eq!(error["message"], "only the host can do that");

    send(&mut host, json!({"type": "start-game", "roomCode": "FLOW"})).await;

    let host_cards = wait_for(&mut host, "your-cards").await;
    assert_eq!(host_cards["cards"].as_array().unwrap().len(), 26);
    wait_for(&mut host, "game-started").await;
    let state = wait_for(&mut host, "game-state").await;
    assert_eq!(state["started"], true);
    assert_eq!(state["currentPlayerIndex"], 0);

    let guest_cards = wait_for(&mut guest, "your-cards").await;
    let token = guest_cards["cards"][0].clone();

    // The guest is second in turn order.
    send(
        &mut guest,
        json!({"type": "play-cards", "roomCode": "FLOW", "cards": [token], "claimedRank": "A"}),
    )
    .await;
    let error = wait_for(&mut guest, "error").await;
    assert_eq!(error["message"], "not your turn");

    // The host opens the round and both sides see the play.
    let first = host_cards["cards"][0].clone();
    send(
        &mut host,
        json!({"type": "play-cards", "roomCode": "FLOW", "cards": [first], "claimedRank": "K"}),
    )
    .await;
    let play = wait_for(&mut guest, "play-made").await;
    assert_eq!(play["playerName"], "host");
    assert_eq!(play["count"], 1);
    assert_eq!(play["rank"], "K");
}

#[tokio::test]
async fn test_malformed_frame_returns_error() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr).await;

    client
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    let frame = next_frame(&mut client).await;
    assert_eq!(frame["event"], "error");
    assert_eq!(frame["data"]["message"], "Invalid message format");

    send(&mut client, json!({"type": "fold", "roomCode": "X"})).await;
    let frame = next_frame(&mut client).await;
    assert_eq!(frame["event"], "error");
}

#[tokio::test]
async fn test_burst_rate_limit() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr).await;

    for _ in 0..12 {
        client
            .send(Message::Text("{}".to_string().into()))
            .await
            .unwrap();
    }

    let mut rate_limited = 0;
    for _ in 0..12 {
        let frame = next_frame(&mut client).await;
        assert_eq!(frame["event"], "error");
        if frame["data"]["message"]
            .as_str()
            .unwrap()
            .contains("Rate limit")
        {
            rate_limited += 1;
        }
    }
    assert_eq!(rate_limited, 2);
}

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let (addr, manager) = start_server().await;
    let mut host = connect(addr).await;
    let mut guest = connect(addr).await;

    send(
        &mut host,
        json!({"type": "join", "roomCode": "GONE", "playerName": "host"}),
    )
    .await;
    wait_for(&mut host, "player-id").await;
    send(
        &mut guest,
        json!({"type": "join", "roomCode": "GONE", "playerName": "guest"}),
    )
    .await;
    wait_for(&mut guest, "player-id").await;

    guest.close(None).await.unwrap();

    let joined = loop {
        let players = wait_for(&mut host, "room-joined").await;
        if players["players"].as_array().unwrap().len() == 1 {
            break players;
        }
    };
    assert_eq!(joined["players"][0]["name"], "host");

    let state = manager.get_room_state("GONE").await.unwrap();
    assert_eq!(state.players.len(), 1);
}

#[tokio::test]
async fn test_add_bot_over_websocket() {
    let (addr, _) = start_server().await;
    let mut host = connect(addr).await;

    send(
        &mut host,
        json!({"type": "join", "roomCode": "SOLO", "playerName": "host"}),
    )
    .await;
    wait_for(&mut host, "player-id").await;
    send(&mut host, json!({"type": "add-bot", "roomCode": "SOLO"})).await;
    let joined = wait_for(&mut host, "room-joined").await;
    let players = joined["players"].as_array().unwrap();
    assert!(players.iter().any(|p| p["isBot"] == true && p["name"] == "Bot 1"));
}
