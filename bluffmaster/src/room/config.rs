//! Room runtime configuration.

use std::time::Duration;

use crate::{
    bot::BotDecisionConfig,
    game::constants::{DEFAULT_MAX_PLAYERS, MAX_PLAYERS, MIN_PLAYERS},
};

/// Configuration shared by every room actor a manager spawns
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Maximum seats per room, bots included (default: 10)
    pub max_players: usize,

    /// Pause before a bot acts, so humans can follow the table
    pub bot_delay: Duration,

    /// How long a finished match lingers before the room is destroyed
    pub end_grace: Duration,

    /// Capacity of each actor's inbox
    pub inbox_capacity: usize,

    /// Bot heuristics
    pub bot: BotDecisionConfig,

    /// Fixed seed for shuffling and bot decisions. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            bot_delay: Duration::from_millis(1000),
            end_grace: Duration::from_secs(5),
            inbox_capacity: 100,
            bot: BotDecisionConfig::default(),
            seed: None,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_players < MIN_PLAYERS || self.max_players > MAX_PLAYERS {
            return Err(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be positive".to_string());
        }

        Ok(())
    }
}
