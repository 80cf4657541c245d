use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections of a requested room transition. The room is left untouched
/// whenever one of these is returned; the message is only ever sent back to
/// the requesting connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,
    #[error("game already started")]
    AlreadyStarted,
    #[error("already joined this room")]
    DuplicateJoin,
    #[error("only the host can do that")]
    NotHost,
    #[error("need 2+ players to start")]
    InsufficientPlayers,
    #[error("not your turn")]
    NotYourTurn,
    #[error("must declare a rank to open a round")]
    RankRequired,
    #[error("invalid cards")]
    InvalidCards,
    #[error("no play to call bluff on")]
    NoActiveClaim,
    #[error("can't call bluff on your own play")]
    SelfChallengeForbidden,
    #[error("can't pass without an open round")]
    CannotPassNow,
    #[error("game is not in progress")]
    NotStarted,
    #[error("not a player in this room")]
    NotInRoom,
    #[error("rejoin token rejected")]
    RejoinDenied,
    #[error("invalid rank")]
    InvalidRank,
    #[error("room is full")]
    CapacityReached,
    #[error("internal game state error")]
    InternalState,
}

pub type GameResult<T> = Result<T, GameError>;
