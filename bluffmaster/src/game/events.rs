//! Events emitted by room transitions and the public views they carry.
//!
//! Every event serializes as `{"event": "<kebab-case name>", "data": {...}}`
//! with camelCase field names, which is exactly what goes over the wire.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, PlayerId, Rank},
    state::RoomPhase,
};

/// Public information about one seat. Never includes the hand itself.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub card_count: usize,
    pub finished: bool,
    pub is_bot: bool,
    pub is_host: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPlaySummary {
    pub player_id: PlayerId,
    pub player_name: String,
    pub count: usize,
    pub rank: Rank,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub place: usize,
    pub player_id: PlayerId,
    pub name: String,
}

/// Snapshot of a room as any participant may see it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub code: String,
    pub phase: RoomPhase,
    pub started: bool,
    pub players: Vec<PlayerInfo>,
    pub current_player_index: usize,
    pub current_player_id: Option<PlayerId>,
    pub current_rank: Option<Rank>,
    pub pile_count: usize,
    pub last_play: Option<LastPlaySummary>,
    pub can_call_bluff: bool,
    pub can_pass: bool,
    pub round_ended: bool,
    pub winner: Option<LeaderboardEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent only to the seat's own connection; the token reclaims the seat
    /// after a reconnect.
    PlayerId {
        player_id: PlayerId,
        rejoin_token: String,
    },
    RoomJoined {
        players: Vec<PlayerInfo>,
    },
    GameState(GameStateView),
    YourCards {
        cards: Vec<Card>,
    },
    GameStarted,
    PlayMade {
        player_id: PlayerId,
        player_name: String,
        count: usize,
        /// The rank declared with this play; the round may be bound to a
        /// different one.
        rank: Rank,
    },
    PlayerPassed {
        player_id: PlayerId,
        player_name: String,
    },
    RoundEnded {
        starter_id: PlayerId,
        starter_name: String,
    },
    BluffCalled {
        caller_name: String,
        last_player_name: String,
        was_bluff: bool,
        penalized_player_name: String,
        revealed: Vec<Card>,
    },
    PlayerFinished {
        player_id: PlayerId,
        player_name: String,
        position: usize,
    },
    GameOver {
        winner: Option<LeaderboardEntry>,
        leaderboard: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// Wire name of the event, handy for logging and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerId { .. } => "player-id",
            Self::RoomJoined { .. } => "room-joined",
            Self::GameState(_) => "game-state",
            Self::YourCards { .. } => "your-cards",
            Self::GameStarted => "game-started",
            Self::PlayMade { .. } => "play-made",
            Self::PlayerPassed { .. } => "player-passed",
            Self::RoundEnded { .. } => "round-ended",
            Self::BluffCalled { .. } => "bluff-called",
            Self::PlayerFinished { .. } => "player-finished",
            Self::GameOver { .. } => "game-over",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Recipient {
    /// Every connection subscribed to the room.
    Room,
    /// Only the connection currently bound to this player.
    Player(PlayerId),
}

/// An event together with who should receive it.
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn broadcast(event: ServerEvent) -> Self {
        Self {
            recipient: Recipient::Room,
            event,
        }
    }

    pub fn to(player_id: PlayerId, event: ServerEvent) -> Self {
        Self {
            recipient: Recipient::Player(player_id),
            event,
        }
    }
}
