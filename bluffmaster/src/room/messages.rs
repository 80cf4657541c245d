//! Room actor message types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    Card, ConnectionId, GameError, GameResult, GameStateView, PlayerId, RoomPhase, ServerEvent,
};

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Take a seat, creating the room if needed. `sender` receives every
    /// event addressed to this connection from now on.
    Join {
        player_name: String,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Reclaim an existing seat from a new connection
    Rejoin {
        player_id: PlayerId,
        rejoin_token: String,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Add a bot (host only)
    AddBot {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Deal and start the match (host only)
    StartGame {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Surrender cards face down under a declared rank
    PlayCards {
        connection: ConnectionId,
        cards: Vec<Card>,
        claimed_rank: Option<String>,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Challenge the outstanding claim
    CallBluff {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Decline to play into the open round
    Pass {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Connection dropped
    Disconnect {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Get the public game state
    GetState {
        response: oneshot::Sender<Option<GameStateView>>,
    },

    /// Get listing metadata
    GetSummary {
        response: oneshot::Sender<Option<RoomSummary>>,
    },

    /// Internal: a bot's turn, scheduled when the room was at `version`
    BotTurn { version: u64 },

    /// Internal: grace period after the match ended has elapsed
    Expire,

    /// Stop the actor, keeping the snapshot for a later restore
    Shutdown {
        response: oneshot::Sender<RoomResponse>,
    },
}

/// Response from room operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomResponse {
    /// Operation succeeded
    Success,

    /// Seat taken (or reclaimed) as this player
    Joined { player_id: PlayerId },

    /// Operation rejected
    Error(GameError),
}

impl RoomResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        !matches!(self, RoomResponse::Error(_))
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            RoomResponse::Error(e) => Some(e.to_string()),
            _ => None,
        }
    }

    pub fn into_result(self) -> GameResult<Option<PlayerId>> {
        match self {
            RoomResponse::Success => Ok(None),
            RoomResponse::Joined { player_id } => Ok(Some(player_id)),
            RoomResponse::Error(e) => Err(e),
        }
    }
}

impl From<GameResult<()>> for RoomResponse {
    fn from(result: GameResult<()>) -> Self {
        match result {
            Ok(()) => RoomResponse::Success,
            Err(e) => RoomResponse::Error(e),
        }
    }
}

/// Room listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: String,
    pub player_count: usize,
    pub max_players: usize,
    pub phase: RoomPhase,
    pub updated_at: DateTime<Utc>,
}
