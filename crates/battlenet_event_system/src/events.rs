//! Event traits and typed handler infrastructure.
//!
//! Channel payloads arrive as JSON values pulled out of the wire envelope.
//! Each binding declares its payload type at registration time and decoding
//! happens per delivery, so one malformed message never poisons a channel.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::any::Any;

/// Errors produced while encoding, decoding, or handling channel events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
}

/// A payload that can travel over a named channel.
///
/// Blanket-implemented for anything serde can move through JSON, so
/// application code never implements this by hand.
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    fn type_name() -> &'static str
    where
        Self: Sized;
    fn encode(&self) -> Result<serde_json::Value, EventError>;
    fn decode(data: &serde_json::Value) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self) -> Result<serde_json::Value, EventError> {
        serde_json::to_value(self).map_err(EventError::Serialization)
    }

    fn decode(data: &serde_json::Value) -> Result<Self, EventError> {
        serde_json::from_value(data.clone()).map_err(EventError::Deserialization)
    }
}

/// Object-safe handler invoked once per message delivered on its channel.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, data: &serde_json::Value) -> Result<(), EventError>;
    fn handler_name(&self) -> &str;
}

/// Wraps a typed closure so it can live in the registry as a trait object.
///
/// Decodes the payload to `T` before invoking the closure; a decode failure
/// is returned to the dispatcher, which logs and drops that delivery.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, data: &serde_json::Value) -> Result<(), EventError> {
        let event = T::decode(data)?;
        (self.handler)(event)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Probe {
        message: String,
    }

    #[test]
    fn blanket_event_round_trips_through_json() {
        let probe = Probe {
            message: "ready".to_string(),
        };
        let value = probe.encode().unwrap();
        let back = Probe::decode(&value).unwrap();
        assert_eq!(back, probe);
    }

    #[tokio::test]
    async fn typed_handler_decodes_before_invoking() {
        let handler = TypedEventHandler::new("probe".to_string(), |event: Probe| {
            assert_eq!(event.message, "hello");
            Ok(())
        });
        let data = serde_json::json!({ "message": "hello" });
        handler.handle(&data).await.unwrap();
    }

    #[tokio::test]
    async fn typed_handler_reports_decode_failure() {
        let handler =
            TypedEventHandler::new("probe".to_string(), |_event: Probe| -> Result<(), EventError> {
                panic!("handler must not run on decode failure");
            });
        let data = serde_json::json!(42);
        let err = handler.handle(&data).await.unwrap_err();
        assert!(matches!(err, EventError::Deserialization(_)));
    }
}
