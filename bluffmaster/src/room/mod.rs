//! Room module providing per-room actors and the manager that addresses them.
//!
//! This module implements:
//! - RoomActor: Async actor owning a single room's state
//! - RoomManager: Registry mapping room codes to actor handles
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each room runs in a separate Tokio task with an mpsc message inbox, so all
//! events for one room are applied in arrival order while different rooms
//! proceed independently. After every transition the actor pushes the
//! resulting events to subscribed connections, saves a snapshot, and if a bot
//! now holds the turn, schedules that bot's move back into its own inbox.
//!
//! ## Example
//!
//! ```no_run
//! use bluffmaster::room::{RoomConfig, RoomManager};
//! use bluffmaster::store::MemoryRoomRepository;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RoomManager::new(
//!         Arc::new(MemoryRoomRepository::default()),
//!         RoomConfig::default(),
//!     );
//!
//!     let (events, mut inbox) = mpsc::channel(64);
//!     let connection = Uuid::new_v4();
//!     let player = manager.join_room("ABCD", "alice", connection, events).await.unwrap();
//!     println!("joined as {player}");
//!
//!     while let Some(event) = inbox.recv().await {
//!         println!("{}", event.name());
//!     }
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle, RoomRegistry};
pub use config::RoomConfig;
pub use manager::RoomManager;
pub use messages::{RoomMessage, RoomResponse, RoomSummary};
