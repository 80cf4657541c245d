//! Bluffing card game engine.
//!
//! This module provides the rules of the game as pure state transitions:
//! - Cards, deck construction, shuffling and dealing
//! - The [`Room`] data model holding one match
//! - Transitions (join, add bot, start, play, pass, call bluff, disconnect, rejoin)
//! - Events and public views produced by those transitions

pub mod constants;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod events;
pub mod state;

pub use entities::{
    Card, Claim, ConnectionId, ControllerKind, Player, PlayerId, Rank, Suit, deal, new_deck,
    rank_of, shuffle,
};
pub use errors::{GameError, GameResult};
pub use events::{
    GameStateView, LastPlaySummary, LeaderboardEntry, Outbound, PlayerInfo, Recipient,
    ServerEvent,
};
pub use state::{Room, RoomPhase};
