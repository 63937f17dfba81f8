//! battlenet console observer - main entry point.
//!
//! Connects to the battle server's realtime layer, initializes subscriptions
//! from a games descriptor file, and logs room, countdown, leaderboard, and
//! redirect traffic until the connection drops or ctrl-c.

mod cli;
mod logging;
mod settings;

use anyhow::{Context, Result};
use battlenet_client::{GameDescriptor, RealtimeService, StreamRecvError};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = settings::load_config(&args)
        .await
        .context("failed to load configuration")?;
    logging::setup_logging(args.debug, config.logging.as_ref())?;

    info!("Starting battlenet console observer");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config.display());

    let mut client_config = config.client.clone();
    if let Some(url) = &args.url {
        client_config.connection.url = url.clone();
    }

    let games_path = args
        .games
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.games.file));
    let games = load_games(&games_path)
        .await
        .with_context(|| format!("failed to load games from {}", games_path.display()))?;
    info!(
        "Loaded {} game descriptors from {}",
        games.len(),
        games_path.display()
    );

    let service = Arc::new(
        RealtimeService::connect(&client_config)
            .await
            .with_context(|| format!("failed to connect to {}", client_config.connection.url))?,
    );
    service.init(&games);

    if let Some(event) = &args.emit {
        match &args.options {
            Some(raw) => {
                let options =
                    serde_json::from_str(raw).context("--options is not valid JSON")?;
                service.emit_with_options(event, options);
            }
            None => service.emit(event),
        }
        info!("Emitted '{}'", event);
    }

    watch_streams(service).await;
    info!("Console observer stopped");
    Ok(())
}

/// Reads the games descriptor list the REST collaborator would normally serve.
async fn load_games(path: &Path) -> Result<Vec<GameDescriptor>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Logs stream traffic until the connection terminates or ctrl-c arrives.
async fn watch_streams(service: Arc<RealtimeService>) {
    let mut rooms = service.rooms().subscribe();
    let mut countdown = service.countdown().subscribe();
    let mut leaderboard = service.leaderboard().subscribe();

    // Redirects are one-shot waits, so give them their own sequential loop.
    let redirect_service = service.clone();
    tokio::spawn(async move {
        loop {
            match redirect_service.redirect_url().await {
                Ok(url) => info!("Server redirect: {}", url),
                Err(_) => break,
            }
        }
    });

    loop {
        tokio::select! {
            snapshot = rooms.recv() => match snapshot {
                Ok(snapshot) => info!("Rooms update: {} rooms", snapshot.len()),
                Err(StreamRecvError::Lagged(missed)) => {
                    warn!("Rooms stream lagged, {} updates missed", missed)
                }
                Err(StreamRecvError::Closed) => break,
            },
            distance = countdown.recv() => match distance {
                Ok(distance) => info!("Countdown: {}", distance),
                Err(StreamRecvError::Lagged(missed)) => {
                    warn!("Countdown stream lagged, {} ticks missed", missed)
                }
                Err(StreamRecvError::Closed) => break,
            },
            game = leaderboard.recv() => match game {
                Ok(game) => info!("Leaderboard changed for '{}'", game),
                Err(StreamRecvError::Lagged(missed)) => {
                    warn!("Leaderboard stream lagged, {} updates missed", missed)
                }
                Err(StreamRecvError::Closed) => break,
            },
            state = service.connection().wait_closed() => {
                warn!("Connection terminated: {:?}", state);
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
}
