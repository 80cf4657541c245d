//! # Bluffmaster
//!
//! Authoritative engine for a multiplayer bluffing card game.
//!
//! Players take turns surrendering cards face down while declaring a rank.
//! Anyone may call bluff on the latest play; whoever turns out to be wrong
//! picks up the whole pile. Emptying your hand finishes you, and the last
//! player holding cards loses.
//!
//! ## Architecture
//!
//! A match moves through three phases:
//!
//! - **Waiting**: players and bots take seats, the host starts the match
//! - **InProgress**: turns, claims, challenges and round resets
//! - **Ended**: standings are frozen and the room expires shortly after
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, room state, transitions and events
//! - [`bot`]: Heuristic bot players
//! - [`store`]: Snapshot persistence (Redis or in-memory)
//! - [`room`]: Per-room actors and the room manager
//!
//! ## Example
//!
//! ```
//! use bluffmaster::game::Room;
//! use rand::{SeedableRng, rngs::StdRng};
//! use uuid::Uuid;
//!
//! let mut room = Room::with_default_capacity("ABCD");
//! let (host, _) = room.join(Uuid::new_v4(), "alice").unwrap();
//! room.join(Uuid::new_v4(), "bob").unwrap();
//! room.start(&host, &mut StdRng::seed_from_u64(7)).unwrap();
//! assert_eq!(room.total_cards(), 52);
//! ```

/// Heuristic bot players.
pub mod bot;

/// Core game logic, entities, and transitions.
pub mod game;
pub use game::{
    Card, GameError, GameResult, GameStateView, PlayerId, Rank, Room, RoomPhase, ServerEvent,
    Suit, constants,
};

/// Per-room actors and the room manager.
pub mod room;
pub use room::{RoomConfig, RoomManager};

/// Room snapshot persistence.
pub mod store;
pub use store::{MemoryRoomRepository, RedisRoomRepository, RoomRepository, StoreError};
