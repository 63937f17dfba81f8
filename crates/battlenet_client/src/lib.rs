//! Realtime client for the battlenet lobby.
//!
//! Maintains one persistent websocket connection to the battle server,
//! subscribes to the per-game channels named by [`GameDescriptor`]s, and
//! exposes the pushed updates as three independent typed streams: room
//! snapshots, countdown ticks, and leaderboard changes. Outbound commands
//! are fire-and-forget; the one-shot `redirect` request resolves with the
//! first navigation instruction the server sends.
//!
//! # Overview
//!
//! ```no_run
//! use battlenet_client::{ClientConfig, GameDescriptor, RealtimeService};
//!
//! # async fn run() -> Result<(), battlenet_client::ClientError> {
//! let service = RealtimeService::connect(&ClientConfig::default()).await?;
//!
//! // Games arrive from the REST collaborator; hand them to the coordinator.
//! let games: Vec<GameDescriptor> = vec![/* loaded elsewhere */];
//! service.init(&games);
//!
//! let mut rooms = service.rooms().subscribe();
//! while let Ok(snapshot) = rooms.recv().await {
//!     println!("rooms update: {} rooms", snapshot.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod service;
pub mod types;

pub use battlenet_event_system::{
    BindingId, ChannelRegistry, EventError, EventStream, StreamRecvError, StreamSubscription,
};
pub use config::{ClientConfig, ConnectionSettings, StreamSettings};
pub use connection::{Connection, ConnectionState};
pub use error::ClientError;
pub use protocol::{WireMessage, REDIRECT_CHANNEL, UPDATE_LEADERS_CHANNEL};
pub use service::RealtimeService;
pub use types::{GameDescriptor, RoomInfo};
