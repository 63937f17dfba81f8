//! The realtime service: subscription coordination, typed output streams,
//! command emission, and the one-shot redirect request.
//!
//! This is the surface application code talks to. It owns the connection and
//! exposes three independent streams fed exclusively by the coordinator's
//! channel bindings:
//!
//! - [`rooms`](RealtimeService::rooms): room snapshots for any initialized game
//! - [`countdown`](RealtimeService::countdown): countdown ticks
//! - [`leaderboard`](RealtimeService::leaderboard): which game's board changed

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionState};
use crate::error::ClientError;
use crate::protocol::{REDIRECT_CHANNEL, UPDATE_LEADERS_CHANNEL};
use crate::types::{GameDescriptor, RoomInfo};
use battlenet_event_system::{create_channel_registry, BindingId, EventStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Client facade over the realtime event-distribution layer.
pub struct RealtimeService {
    connection: Arc<Connection>,
    rooms: EventStream<Vec<RoomInfo>>,
    countdown: EventStream<f64>,
    leaderboard: EventStream<String>,
    /// Bindings created by the last `init`, retracted on the next one.
    held: Mutex<Vec<BindingId>>,
}

impl RealtimeService {
    /// Connects to the configured server and wraps the connection.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let registry = create_channel_registry();
        let connection = Connection::connect(&config.connection.url, registry).await?;
        Ok(Self::new(Arc::new(connection), config.streams.capacity))
    }

    /// Wraps an already-established connection.
    pub fn new(connection: Arc<Connection>, stream_capacity: usize) -> Self {
        Self {
            connection,
            rooms: EventStream::new(stream_capacity),
            countdown: EventStream::new(stream_capacity),
            leaderboard: EventStream::new(stream_capacity),
            held: Mutex::new(Vec::new()),
        }
    }

    /// Binds every descriptor's channels to the output streams, plus the one
    /// shared `updateLeaders` binding.
    ///
    /// Idempotent: bindings created by a previous `init` are retracted first,
    /// so re-initializing with a fresh games list replaces the subscription
    /// set instead of duplicating deliveries.
    pub fn init(&self, games: &[GameDescriptor]) {
        let registry = self.connection.registry();
        let mut held = self.held.lock().expect("binding set lock poisoned");

        let retired = held.len();
        for binding in held.drain(..) {
            registry.remove(&binding);
        }
        if retired > 0 {
            debug!("Retired {} bindings from a previous init", retired);
        }

        for game in games {
            let rooms = self.rooms.clone();
            held.push(registry.on(
                &game.update_rooms_info_event_name,
                move |snapshot: Vec<RoomInfo>| {
                    rooms.publish(snapshot);
                    Ok(())
                },
            ));

            let countdown = self.countdown.clone();
            held.push(registry.on(&game.notify_countdown, move |distance: f64| {
                countdown.publish(distance);
                Ok(())
            }));
        }

        let leaderboard = self.leaderboard.clone();
        held.push(registry.on(UPDATE_LEADERS_CHANNEL, move |game_name: String| {
            leaderboard.publish(game_name);
            Ok(())
        }));

        info!("Subscribed to channels for {} games", games.len());
    }

    /// Retracts every coordinator binding. Pending redirect waits are not
    /// affected; they hold their own one-shot bindings.
    pub fn reset(&self) {
        let registry = self.connection.registry();
        let mut held = self.held.lock().expect("binding set lock poisoned");
        for binding in held.drain(..) {
            registry.remove(&binding);
        }
        debug!("Coordinator bindings retracted");
    }

    /// Room snapshots for every initialized game, in arrival order.
    pub fn rooms(&self) -> &EventStream<Vec<RoomInfo>> {
        &self.rooms
    }

    /// Countdown ticks for every initialized game.
    pub fn countdown(&self) -> &EventStream<f64> {
        &self.countdown
    }

    /// Names of games whose leaderboard changed.
    pub fn leaderboard(&self) -> &EventStream<String> {
        &self.leaderboard
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Sends a named command with no payload, fire-and-forget.
    pub fn emit(&self, event: &str) {
        self.connection.send(event, None);
    }

    /// Sends a named command with a payload, fire-and-forget.
    pub fn emit_with_options(&self, event: &str, options: serde_json::Value) {
        self.connection.send(event, Some(options));
    }

    fn register_redirect_waiter(&self) -> (BindingId, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let binding = self
            .connection
            .registry()
            .once(REDIRECT_CHANNEL, move |url: String| {
                if let Some(tx) = slot.lock().expect("redirect slot lock poisoned").take() {
                    let _ = tx.send(url);
                }
                Ok(())
            });
        (binding, rx)
    }

    /// Waits for the next `redirect` message and resolves with its URL.
    ///
    /// Each call arms its own one-shot binding, so concurrent callers all
    /// resolve with the same (first) payload. The binding retracts itself on
    /// delivery. If the server never redirects, this future never resolves;
    /// use [`redirect_url_timeout`](Self::redirect_url_timeout) for a bound.
    pub async fn redirect_url(&self) -> Result<String, ClientError> {
        let (_binding, rx) = self.register_redirect_waiter();
        rx.await.map_err(|_| ClientError::RedirectAborted)
    }

    /// Bounded variant of [`redirect_url`](Self::redirect_url). On timeout
    /// the waiting binding is retracted so nothing is left armed.
    pub async fn redirect_url_timeout(&self, wait: Duration) -> Result<String, ClientError> {
        let (binding, rx) = self.register_redirect_waiter();
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(url)) => Ok(url),
            Ok(Err(_)) => Err(ClientError::RedirectAborted),
            Err(_) => {
                self.connection.registry().remove(&binding);
                Err(ClientError::RedirectTimeout(wait))
            }
        }
    }
}

impl std::fmt::Debug for RealtimeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeService")
            .field("state", &self.connection.state())
            .finish()
    }
}
