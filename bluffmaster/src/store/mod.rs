//! Room snapshot persistence.
//!
//! Rooms live in memory inside their actor. After every transition the actor
//! writes a JSON snapshot through a [`RoomRepository`] so a room can be
//! reconstructed after a process restart. Snapshots expire on their own after
//! a day; there are no consistency guarantees beyond that.

pub mod errors;
pub mod memory;
pub mod redis_store;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryRoomRepository;
pub use redis_store::RedisRoomRepository;

use async_trait::async_trait;
use std::time::Duration;

use crate::game::Room;

/// How long a snapshot survives without being rewritten.
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Storage key of a room snapshot.
pub fn room_key(code: &str) -> String {
    format!("room:{code}")
}

/// Trait for room snapshot storage
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Write (or overwrite) the snapshot of `room`, resetting its expiry
    async fn save(&self, room: &Room) -> StoreResult<()>;

    /// Read the snapshot for `code`, if one exists and hasn't expired
    async fn load(&self, code: &str) -> StoreResult<Option<Room>>;

    /// Remove the snapshot for `code`
    async fn delete(&self, code: &str) -> StoreResult<()>;
}
