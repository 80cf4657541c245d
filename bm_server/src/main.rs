//! Bluffmaster server using the async room actor model.
//!
//! Each room runs in its own actor managed by a RoomManager; snapshots go to
//! Redis when `REDIS_URL` is set and stay in memory otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use bluffmaster::{MemoryRoomRepository, RedisRoomRepository, RoomManager, RoomRepository};
use bm_server::{api, config::ServerConfig, logging, metrics};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run a Bluffmaster game server

USAGE:
  bm_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --redis-url  URL         Redis connection string     [default: env REDIS_URL, in-memory if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  REDIS_URL                Redis connection string for room snapshots
  METRICS_BIND             Prometheus listener address (disabled if unset)
  ROOM_MAX_PLAYERS         Seats per room, bots included [default: 10]
  BOT_DELAY_MS             Pause before a bot acts [default: 1000]
  END_GRACE_SECS           How long a finished match stays up [default: 5]
  SNAPSHOT_TTL_SECS        Snapshot expiry [default: 86400]
  RUST_LOG                 Log filter [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        redis_url: pargs.opt_value_from_str("--redis-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.redis_url)?;
    config.validate()?;
    info!("Starting Bluffmaster server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics exposed on http://{}/metrics", addr),
            Err(e) => warn!("{}", e),
        }
    }

    let store: Arc<dyn RoomRepository> = match &config.redis_url {
        Some(url) => {
            info!("Connecting to Redis");
            let store = RedisRoomRepository::connect(url, config.snapshot_ttl)
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis connected successfully");
            Arc::new(store)
        }
        None => {
            warn!("REDIS_URL not set; room snapshots are kept in memory only");
            Arc::new(MemoryRoomRepository::new(config.snapshot_ttl))
        }
    };

    let room_manager = Arc::new(RoomManager::new(store, config.room_config()));

    let app = api::create_router(api::AppState {
        room_manager: room_manager.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    room_manager.shutdown().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
