//! Redis-backed snapshot store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;

use super::{RoomRepository, StoreResult, room_key};
use crate::game::Room;

/// Snapshots stored as JSON strings under `room:{code}` with `SET EX`.
///
/// The connection manager reconnects on its own; every operation works on a
/// cheap clone of it.
#[derive(Clone)]
pub struct RedisRoomRepository {
    connection: ConnectionManager,
    ttl: Duration,
}

impl RedisRoomRepository {
    /// Connect to Redis
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL, e.g. `redis://127.0.0.1/`
    /// * `ttl` - Snapshot expiry
    ///
    /// # Errors
    ///
    /// * `StoreError::Redis` - Invalid URL or the initial connection failed
    pub async fn connect(url: &str, ttl: Duration) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        log::info!("Connected to Redis snapshot store");
        Ok(Self { connection, ttl })
    }
}

#[async_trait]
impl RoomRepository for RedisRoomRepository {
    async fn save(&self, room: &Room) -> StoreResult<()> {
        let payload = serde_json::to_string(room)?;
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(room_key(&room.code), payload, self.ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn load(&self, code: &str) -> StoreResult<Option<Room>> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn.get(room_key(code)).await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, code: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(room_key(code)).await?;
        Ok(())
    }
}
