//! Event distribution primitives for the battlenet realtime layer.
//!
//! This crate is the leaf of the realtime stack: it knows nothing about the
//! transport. It provides the [`ChannelRegistry`] that maps server-defined
//! channel names to typed listener bindings, and the [`EventStream`] multicast
//! publish points that application code subscribes to.
//!
//! The connection layer decodes wire envelopes and calls
//! [`ChannelRegistry::dispatch`]; each binding decodes the payload to its
//! declared type and forwards it, typically into an [`EventStream`].

pub mod events;
pub mod registry;
pub mod stream;

pub use events::{Event, EventError, EventHandler, TypedEventHandler};
pub use registry::{create_channel_registry, BindingId, ChannelRegistry, RegistryStats};
pub use stream::{EventStream, StreamRecvError, StreamSubscription};
