//! Heuristic bot players.
//!
//! A bot seat is driven by [`BotDecisionMaker`], which looks at a room
//! snapshot and picks one of three moves:
//! - **Call bluff** on another player's claim, with odds from a simple
//!   heuristic (see [`ChallengeOdds`])
//! - **Play** the whole group of a rank when opening, or every matching card
//!   when following, otherwise bluff with its first card
//! - **Pass** when it holds no matching card and the pile is getting large
//!
//! The room actor applies the move after a short presentation delay so the
//! table doesn't flash past human players.

pub mod decision;
pub mod models;

pub use decision::BotDecisionMaker;
pub use models::{BotDecisionConfig, BotMove, ChallengeOdds};
