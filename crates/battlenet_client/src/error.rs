//! Client error types.

use battlenet_event_system::EventError;
use std::time::Duration;

/// Errors surfaced by the realtime client.
///
/// Per-message problems (malformed frames, handler decode failures) are not
/// represented here; those are logged and dropped so one bad message cannot
/// take down the shared connection.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The websocket handshake or an underlying transport operation failed.
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A wire envelope could not be encoded or decoded.
    #[error("Wire format error: {0}")]
    WireFormat(#[from] serde_json::Error),

    /// An event-system operation failed.
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// The bounded redirect wait elapsed before a `redirect` arrived.
    #[error("No redirect received within {0:?}")]
    RedirectTimeout(Duration),

    /// The redirect listener was retracted before a `redirect` arrived,
    /// typically because the registry was reset or the connection torn down.
    #[error("Redirect wait aborted before a redirect arrived")]
    RedirectAborted,
}
