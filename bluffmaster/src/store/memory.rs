//! In-process snapshot store, used when no Redis URL is configured.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use super::{DEFAULT_SNAPSHOT_TTL, RoomRepository, StoreResult, room_key};
use crate::game::Room;

/// Keeps serialized snapshots in a map, honouring the same expiry as Redis.
///
/// Snapshots go through JSON like the Redis store does, so serialization
/// problems show up here too.
pub struct MemoryRoomRepository {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl Default for MemoryRoomRepository {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_TTL)
    }
}

impl MemoryRoomRepository {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Whether an unexpired snapshot exists for `code`
    pub async fn contains(&self, code: &str) -> bool {
        self.entries
            .read()
            .await
            .get(&room_key(code))
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }

    /// Number of stored snapshots, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn save(&self, room: &Room) -> StoreResult<()> {
        let payload = serde_json::to_string(room)?;
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .write()
            .await
            .insert(room_key(&room.code), (payload, expires_at));
        Ok(())
    }

    async fn load(&self, code: &str) -> StoreResult<Option<Room>> {
        let key = room_key(code);
        let mut entries = self.entries.write().await;
        let expired = entries
            .get(&key)
            .is_some_and(|(_, expires_at)| *expires_at <= Instant::now());
        if expired {
            entries.remove(&key);
            return Ok(None);
        }
        match entries.get(&key) {
            Some((payload, _)) => Ok(Some(serde_json::from_str(payload)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, code: &str) -> StoreResult<()> {
        self.entries.write().await.remove(&room_key(code));
        Ok(())
    }
}
