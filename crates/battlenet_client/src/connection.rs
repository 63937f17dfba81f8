//! Websocket connection management.
//!
//! One [`Connection`] owns one websocket to the battlenet server. Inbound
//! text frames are decoded into wire envelopes and dispatched to the shared
//! [`ChannelRegistry`] on a single read-loop task, so handler invocation
//! order always matches network arrival order. Outbound sends go through an
//! unbounded queue drained by a write-loop task and are fire-and-forget:
//! enqueueing never fails, even once the transport is gone.
//!
//! There is no reconnect policy here. When the transport drops, the state
//! moves to [`ConnectionState::Closed`] (or [`ConnectionState::Failed`] on a
//! transport error) and no further events arrive.

use crate::error::ClientError;
use crate::protocol::WireMessage;
use battlenet_event_system::{BindingId, ChannelRegistry, Event, EventError};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of the single transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Connected; events flow.
    Open,
    /// The server closed the connection or the stream ended.
    Closed,
    /// The transport reported an error and the connection is unusable.
    Failed,
}

/// An explicitly constructed, owned websocket connection.
///
/// Intended to be created once per process and shared via `Arc`; creating a
/// second one opens an independent socket.
pub struct Connection {
    registry: Arc<ChannelRegistry>,
    outbound: mpsc::UnboundedSender<WireMessage>,
    state: watch::Receiver<ConnectionState>,
}

impl Connection {
    /// Establishes the websocket connection and spawns its read/write loops.
    ///
    /// `registry` becomes the routing table for every inbound envelope; it is
    /// shared so the subscription coordinator can bind channels before or
    /// after messages start flowing.
    pub async fn connect(
        url: &str,
        registry: Arc<ChannelRegistry>,
    ) -> Result<Self, ClientError> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let (ws, _response) = connect_async(url).await?;
        info!("Connected to {}", url);
        let _ = state_tx.send(ConnectionState::Open);

        let (mut sink, mut stream) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<WireMessage>();

        // Write loop: drain the command queue until the sender side is
        // dropped or the transport rejects a frame.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Dropping unencodable outbound message '{}': {}", message.event, e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::text(text)).await {
                    warn!("Send of '{}' failed, write loop stopping: {}", message.event, e);
                    break;
                }
                trace!("Sent '{}'", message.event);
            }
        });

        // Read loop: every inbound frame is decoded and dispatched on this
        // one task, so delivery order matches arrival order.
        let dispatch_registry = registry.clone();
        tokio::spawn(async move {
            let final_state = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => match WireMessage::decode(text.as_str()) {
                        Ok(message) => {
                            let delivered =
                                dispatch_registry.dispatch(&message.event, &message.data).await;
                            trace!("'{}' delivered to {} bindings", message.event, delivered);
                        }
                        Err(e) => {
                            warn!("Dropping malformed frame: {}", e);
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!("Server closed the connection: {:?}", frame);
                        break ConnectionState::Closed;
                    }
                    Some(Ok(other)) => {
                        trace!("Ignoring non-text frame: {:?}", other);
                    }
                    Some(Err(e)) => {
                        error!("Transport error, connection failed: {}", e);
                        break ConnectionState::Failed;
                    }
                    None => {
                        info!("Connection stream ended");
                        break ConnectionState::Closed;
                    }
                }
            };
            let _ = state_tx.send(final_state);
        });

        Ok(Self {
            registry,
            outbound,
            state: state_rx,
        })
    }

    /// Sends a named message, fire-and-forget.
    ///
    /// Never fails synchronously: the envelope is queued for the write loop,
    /// and if the loop is already gone the message is quietly dropped. Any
    /// delivery guarantee beyond that is the transport's concern.
    pub fn send(&self, event: &str, data: Option<serde_json::Value>) {
        let message = match data {
            Some(data) => WireMessage::new(event, data),
            None => WireMessage::bare(event),
        };
        if self.outbound.send(message).is_err() {
            debug!("Connection closed, dropping outbound '{}'", event);
        }
    }

    /// Registers a typed handler invoked once per message on `event_name`.
    ///
    /// Any number of handlers may be registered per channel; they run in
    /// registration order.
    pub fn on<T, F>(&self, event_name: &str, handler: F) -> BindingId
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.registry.on(event_name, handler)
    }

    /// One-shot variant of [`on`](Self::on); the binding retracts itself
    /// after its first successful delivery.
    pub fn once<T, F>(&self, event_name: &str, handler: F) -> BindingId
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.registry.once(event_name, handler)
    }

    /// The registry routing this connection's inbound messages.
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Waits until the connection is [`Closed`](ConnectionState::Closed) or
    /// [`Failed`](ConnectionState::Failed) and returns the terminal state.
    pub async fn wait_closed(&self) -> ConnectionState {
        let mut state = self.state.clone();
        let result = state
            .wait_for(|s| matches!(s, ConnectionState::Closed | ConnectionState::Failed))
            .await;
        match result {
            Ok(terminal) => *terminal,
            // The loops never drop the sender without publishing a terminal
            // state first, but don't hang if that invariant ever breaks.
            Err(_) => ConnectionState::Closed,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .finish()
    }
}
