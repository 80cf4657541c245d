//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bluffmaster::{
    RoomConfig,
    constants::{MAX_PLAYERS, MIN_PLAYERS},
    store::DEFAULT_SNAPSHOT_TTL,
};
use std::{net::SocketAddr, time::Duration};

/// Default bind address when neither CLI nor environment provide one
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Redis connection string; `None` keeps snapshots in memory
    pub redis_url: Option<String>,
    /// Prometheus listener address; `None` disables the exporter
    pub metrics_bind: Option<SocketAddr>,
    /// Snapshot expiry
    pub snapshot_ttl: Duration,
    /// Room defaults
    pub room: RoomDefaultsConfig,
}

/// Default room configuration
#[derive(Debug, Clone)]
pub struct RoomDefaultsConfig {
    /// Maximum players per room
    pub max_players: usize,
    /// Pause before a bot acts
    pub bot_delay: Duration,
    /// How long an ended match stays visible
    pub end_grace: Duration,
}

impl Default for RoomDefaultsConfig {
    fn default() -> Self {
        let room = RoomConfig::default();
        Self {
            max_players: room.max_players,
            bot_delay: room.bot_delay,
            end_grace: room.end_grace,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `redis_url_override` - Optional Redis URL override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a set variable cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        redis_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let redis_url = redis_url_override
            .or_else(|| std::env::var("REDIS_URL").ok())
            .filter(|url| !url.trim().is_empty());

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_value("METRICS_BIND", &raw)?),
            _ => None,
        };

        let defaults = RoomDefaultsConfig::default();
        let room = RoomDefaultsConfig {
            max_players: parse_env_or("ROOM_MAX_PLAYERS", &defaults.max_players.to_string())?,
            bot_delay: Duration::from_millis(parse_env_or(
                "BOT_DELAY_MS",
                &defaults.bot_delay.as_millis().to_string(),
            )?),
            end_grace: Duration::from_secs(parse_env_or(
                "END_GRACE_SECS",
                &defaults.end_grace.as_secs().to_string(),
            )?),
        };

        let snapshot_ttl = Duration::from_secs(parse_env_or(
            "SNAPSHOT_TTL_SECS",
            &DEFAULT_SNAPSHOT_TTL.as_secs().to_string(),
        )?);

        Ok(ServerConfig {
            bind,
            redis_url,
            metrics_bind,
            snapshot_ttl,
            room,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room.max_players < MIN_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "ROOM_MAX_PLAYERS".to_string(),
                reason: format!("Must be at least {}", MIN_PLAYERS),
            });
        }

        if self.room.max_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "ROOM_MAX_PLAYERS".to_string(),
                reason: format!("Must be at most {} (one card each)", MAX_PLAYERS),
            });
        }

        if self.snapshot_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SNAPSHOT_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Room configuration handed to the room manager
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            max_players: self.room.max_players,
            bot_delay: self.room.bot_delay,
            end_grace: self.room.end_grace,
            ..RoomConfig::default()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable, falling back to `default` when unset
fn parse_env_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, &raw)
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("{:?} is not valid: {}", raw, e),
    })
}
