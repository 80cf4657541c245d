//! Room manager for spawning and addressing room actors.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    actor::{RoomActor, RoomHandle, RoomRegistry},
    config::RoomConfig,
    messages::{RoomMessage, RoomResponse, RoomSummary},
};
use crate::{
    game::{Card, ConnectionId, GameError, GameResult, GameStateView, PlayerId, ServerEvent},
    store::RoomRepository,
};

type Reply = oneshot::Sender<RoomResponse>;

/// Room manager owning the registry of live rooms.
///
/// Every room runs in its own actor task; the manager only maps codes to
/// actor handles, spawning an actor the first time a code is used. The
/// actor loads any stored snapshot itself, so no store I/O ever happens
/// under the registry lock.
pub struct RoomManager {
    /// Snapshot store shared by all actors
    store: Arc<dyn RoomRepository>,

    /// Configuration for new rooms
    config: RoomConfig,

    /// Active room handles
    rooms: RoomRegistry,

    /// Next actor instance number
    next_instance: AtomicU64,
}

impl RoomManager {
    /// Create a new room manager
    ///
    /// # Arguments
    ///
    /// * `store` - Snapshot store
    /// * `config` - Configuration applied to every room
    ///
    /// # Returns
    ///
    /// * `RoomManager` - New room manager instance
    pub fn new(store: Arc<dyn RoomRepository>, config: RoomConfig) -> Self {
        Self {
            store,
            config,
            rooms: Arc::new(RwLock::new(HashMap::new())),
            next_instance: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Get the handle of a live room
    pub async fn get_room(&self, code: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(code.trim()).filter(|h| !h.is_closed()).cloned()
    }

    /// Get the live room for `code`, spawning its actor if there is none
    async fn get_or_spawn(&self, code: &str) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(code).filter(|h| !h.is_closed()) {
            return handle.clone();
        }

        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);
        let (actor, handle) = RoomActor::new(
            code.to_string(),
            instance,
            self.config.clone(),
            self.store.clone(),
            self.rooms.clone(),
        );
        rooms.insert(code.to_string(), handle.clone());
        drop(rooms);

        tokio::spawn(actor.run());
        log::debug!("Spawned actor {} for room {}", instance, code);

        handle
    }

    /// Forget a handle whose actor stopped under us
    async fn evict(&self, handle: &RoomHandle) {
        let mut rooms = self.rooms.write().await;
        if rooms
            .get(handle.code())
            .is_some_and(|h| h.instance() == handle.instance())
        {
            rooms.remove(handle.code());
        }
    }

    /// Send a request to a room that may need to be spawned (or restored).
    ///
    /// A room that closes between lookup and delivery is evicted and the
    /// request retried once against a fresh actor.
    async fn request_spawning(
        &self,
        code: &str,
        build: impl Fn(Reply) -> RoomMessage,
    ) -> GameResult<RoomResponse> {
        let code = normalize_code(code)?;
        let mut last_error = GameError::RoomNotFound;
        for _ in 0..2 {
            let handle = self.get_or_spawn(&code).await;
            match handle.request(&build).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    log::debug!("Room {} closed during request, retrying", code);
                    self.evict(&handle).await;
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Send a request to a live room
    async fn request_existing(
        &self,
        code: &str,
        build: impl FnOnce(Reply) -> RoomMessage,
    ) -> GameResult<()> {
        let handle = self
            .get_room(code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        handle.request(build).await?.into_result().map(|_| ())
    }

    /// Join a room, creating it if needed
    ///
    /// # Arguments
    ///
    /// * `code` - Room code
    /// * `player_name` - Requested display name
    /// * `connection` - Joining connection
    /// * `sender` - Channel receiving this connection's events
    ///
    /// # Returns
    ///
    /// * `GameResult<PlayerId>` - The new player's id
    pub async fn join_room(
        &self,
        code: &str,
        player_name: &str,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> GameResult<PlayerId> {
        let response = self
            .request_spawning(code, |response| RoomMessage::Join {
                player_name: player_name.to_string(),
                connection,
                sender: sender.clone(),
                response,
            })
            .await?;
        joined(response)
    }

    /// Reclaim a seat from a new connection, restoring the room if needed.
    ///
    /// `rejoin_token` is the secret handed out in the seat's `player-id`
    /// event; the public player id alone is not enough.
    pub async fn rejoin_room(
        &self,
        code: &str,
        player_id: &PlayerId,
        rejoin_token: &str,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> GameResult<PlayerId> {
        let response = self
            .request_spawning(code, |response| RoomMessage::Rejoin {
                player_id: player_id.clone(),
                rejoin_token: rejoin_token.to_string(),
                connection,
                sender: sender.clone(),
                response,
            })
            .await?;
        joined(response)
    }

    /// Add a bot to a room
    pub async fn add_bot(&self, code: &str, connection: ConnectionId) -> GameResult<()> {
        self.request_existing(code, |response| RoomMessage::AddBot {
            connection,
            response,
        })
        .await
    }

    /// Start the match in a room
    pub async fn start_game(&self, code: &str, connection: ConnectionId) -> GameResult<()> {
        self.request_existing(code, |response| RoomMessage::StartGame {
            connection,
            response,
        })
        .await
    }

    /// Play cards under a declared rank
    pub async fn play_cards(
        &self,
        code: &str,
        connection: ConnectionId,
        cards: Vec<Card>,
        claimed_rank: Option<String>,
    ) -> GameResult<()> {
        self.request_existing(code, |response| RoomMessage::PlayCards {
            connection,
            cards,
            claimed_rank,
            response,
        })
        .await
    }

    /// Challenge the outstanding claim
    pub async fn call_bluff(&self, code: &str, connection: ConnectionId) -> GameResult<()> {
        self.request_existing(code, |response| RoomMessage::CallBluff {
            connection,
            response,
        })
        .await
    }

    /// Pass on the open round
    pub async fn pass(&self, code: &str, connection: ConnectionId) -> GameResult<()> {
        self.request_existing(code, |response| RoomMessage::Pass {
            connection,
            response,
        })
        .await
    }

    /// Remove a dropped connection from a room.
    ///
    /// A room parked in the store is restored first so the seat is really
    /// released.
    pub async fn disconnect(&self, code: &str, connection: ConnectionId) -> GameResult<()> {
        self.request_spawning(code, |response| RoomMessage::Disconnect {
            connection,
            response,
        })
        .await?
        .into_result()
        .map(|_| ())
    }

    /// Get the public state of a live room
    pub async fn get_room_state(&self, code: &str) -> Option<GameStateView> {
        let handle = self.get_room(code).await?;
        handle
            .request(|response| RoomMessage::GetState { response })
            .await
            .ok()
            .flatten()
    }

    /// List all live rooms
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(Some(summary)) = handle
                .request(|response| RoomMessage::GetSummary { response })
                .await
            {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    /// Get active room count
    pub async fn active_room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().filter(|h| !h.is_closed()).count()
    }

    /// Stop every room actor. Snapshots stay in the store so the rooms can
    /// be restored by a later process.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        let count = handles.len();
        for handle in handles {
            let _ = handle
                .request(|response| RoomMessage::Shutdown { response })
                .await;
        }
        log::info!("Shut down {} room(s)", count);
    }
}

fn normalize_code(code: &str) -> GameResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(GameError::RoomNotFound);
    }
    Ok(code.to_string())
}

fn joined(response: RoomResponse) -> GameResult<PlayerId> {
    response
        .into_result()?
        .ok_or(GameError::InternalState)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRoomRepository;
    use uuid::Uuid;

    fn manager() -> RoomManager {
        RoomManager::new(
            Arc::new(MemoryRoomRepository::default()),
            RoomConfig {
                bot_delay: std::time::Duration::ZERO,
                seed: Some(3),
                ..RoomConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_join_spawns_room() {
        let manager = manager();
        let (tx, _rx) = mpsc::channel(32);
        let connection = Uuid::new_v4();
        let id = manager
            .join_room("  ROOM1 ", "alice", connection, tx)
            .await
            .unwrap();
        assert_eq!(id, PlayerId::human(connection));
        assert_eq!(manager.active_room_count().await, 1);
        assert!(manager.get_room("ROOM1").await.is_some());

        let rooms = manager.list_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].code, "ROOM1");
        assert_eq!(rooms[0].player_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_room_operations_fail() {
        let manager = manager();
        assert_eq!(
            manager.start_game("NOPE", Uuid::new_v4()).await,
            Err(GameError::RoomNotFound)
        );
        assert!(manager.get_room_state("NOPE").await.is_none());
        let (tx, _rx) = mpsc::channel(1);
        assert_eq!(
            manager.join_room("   ", "x", Uuid::new_v4(), tx).await,
            Err(GameError::RoomNotFound)
        );
    }

    #[tokio::test]
    async fn test_rejoin_without_snapshot_fails() {
        let manager = manager();
        let (tx, _rx) = mpsc::channel(8);
        let result = manager
            .rejoin_room("GHOST", &PlayerId::from("someone"), "token", Uuid::new_v4(), tx)
            .await;
        assert_eq!(result, Err(GameError::RoomNotFound));
    }
}
