//! Channel registry: named channels mapped to ordered listener bindings.
//!
//! The registry is the single routing table between the connection's inbound
//! message loop and application-facing streams. Bindings are identified by
//! [`BindingId`] so callers can retract them individually; re-initialization
//! replaces bindings instead of stacking duplicates.
//!
//! Dispatch invokes a channel's bindings sequentially in registration order.
//! A binding that fails to decode or handle a message is logged and skipped;
//! it never disables the channel, other bindings, or the connection.

use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};
use uuid::Uuid;

/// Handle to one registered listener binding.
///
/// Returned by [`ChannelRegistry::on`] and [`ChannelRegistry::once`]; pass it
/// back to [`ChannelRegistry::remove`] to retract the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingId {
    channel: String,
    id: Uuid,
}

impl BindingId {
    /// The channel this binding listens on.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[derive(Clone)]
struct Binding {
    id: Uuid,
    once: bool,
    handler: Arc<dyn EventHandler>,
}

/// Snapshot of registry usage, in the spirit of the connection counters the
/// server keeps for its own event hub.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Bindings currently registered across all channels.
    pub total_bindings: usize,
    /// Messages dispatched since the registry was created.
    pub events_dispatched: u64,
}

/// Thread-safe map of channel name to listener bindings.
#[derive(Default)]
pub struct ChannelRegistry {
    bindings: DashMap<String, Vec<Binding>>,
    dispatched: AtomicU64,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
            dispatched: AtomicU64::new(0),
        }
    }

    /// Registers a typed listener on `channel`.
    ///
    /// Listeners on the same channel are invoked in registration order.
    pub fn on<T, F>(&self, channel: &str, handler: F) -> BindingId
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register::<T, F>(channel, false, handler)
    }

    /// Registers a one-shot listener on `channel`.
    ///
    /// The binding is retracted automatically after its first successful
    /// delivery; a delivery that fails to decode leaves it armed.
    pub fn once<T, F>(&self, channel: &str, handler: F) -> BindingId
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register::<T, F>(channel, true, handler)
    }

    fn register<T, F>(&self, channel: &str, once: bool, handler: F) -> BindingId
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let handler_name = format!("{}::{}", channel, T::type_name());
        let typed_handler = TypedEventHandler::new(handler_name, handler);
        let binding = Binding {
            id,
            once,
            handler: Arc::new(typed_handler),
        };

        self.bindings
            .entry(channel.to_string())
            .or_default()
            .push(binding);

        debug!("Registered {} binding for '{}'", if once { "one-shot" } else { "listener" }, channel);
        BindingId {
            channel: channel.to_string(),
            id,
        }
    }

    /// Retracts a single binding. Returns `false` if it was already gone.
    pub fn remove(&self, binding: &BindingId) -> bool {
        let removed = match self.bindings.get_mut(&binding.channel) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|b| b.id != binding.id);
                before != entry.len()
            }
            None => false,
        };
        self.bindings
            .remove_if(&binding.channel, |_, bindings| bindings.is_empty());
        removed
    }

    /// Retracts every binding on `channel`, returning how many were dropped.
    pub fn clear_channel(&self, channel: &str) -> usize {
        match self.bindings.remove(channel) {
            Some((_, bindings)) => bindings.len(),
            None => 0,
        }
    }

    /// Retracts every binding on every channel.
    pub fn reset(&self) {
        self.bindings.clear();
    }

    /// Number of bindings currently registered on `channel`.
    pub fn binding_count(&self, channel: &str) -> usize {
        self.bindings
            .get(channel)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_bindings: self.bindings.iter().map(|entry| entry.len()).sum(),
            events_dispatched: self.dispatched.load(Ordering::Relaxed),
        }
    }

    /// Delivers `data` to every binding on `channel`, in registration order.
    ///
    /// Returns the number of bindings invoked. Binding failures are isolated:
    /// logged, then dispatch continues with the next binding. One-shot
    /// bindings that delivered successfully are retracted afterwards.
    pub async fn dispatch(&self, channel: &str, data: &serde_json::Value) -> usize {
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        // Snapshot the binding list so no shard lock is held across awaits;
        // bindings registered mid-dispatch see the next message.
        let bindings: Vec<Binding> = match self.bindings.get(channel) {
            Some(entry) => entry.value().clone(),
            None => {
                trace!("No bindings for channel '{}'", channel);
                return 0;
            }
        };

        let mut spent_once = Vec::new();
        for binding in &bindings {
            match binding.handler.handle(data).await {
                Ok(()) => {
                    if binding.once {
                        spent_once.push(binding.id);
                    }
                }
                Err(e) => {
                    error!(
                        "Handler {} failed on '{}': {}",
                        binding.handler.handler_name(),
                        channel,
                        e
                    );
                }
            }
        }

        if !spent_once.is_empty() {
            if let Some(mut entry) = self.bindings.get_mut(channel) {
                entry.retain(|b| !spent_once.contains(&b.id));
            }
            self.bindings
                .remove_if(channel, |_, bindings| bindings.is_empty());
        }

        bindings.len()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.bindings.len())
            .field("dispatched", &self.dispatched.load(Ordering::Relaxed))
            .finish()
    }
}

/// Creates a registry behind an `Arc`, ready to share with a connection.
pub fn create_channel_registry() -> Arc<ChannelRegistry> {
    Arc::new(ChannelRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(String) -> Result<(), EventError> + Send + Sync>) {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let log_for_factory = log.clone();
        let factory = move |tag: &str| {
            let log = log_for_factory.clone();
            let tag = tag.to_string();
            Box::new(move |value: String| {
                log.lock().unwrap().push(format!("{tag}:{value}"));
                Ok(())
            }) as Box<dyn Fn(String) -> Result<(), EventError> + Send + Sync>
        };
        (log, factory)
    }

    #[tokio::test]
    async fn dispatch_invokes_in_registration_order() {
        let registry = ChannelRegistry::new();
        let (log, handler) = recorder();
        registry.on("ch", handler("first"));
        registry.on("ch", handler("second"));

        let invoked = registry.dispatch("ch", &serde_json::json!("e1")).await;
        assert_eq!(invoked, 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:e1".to_string(), "second:e1".to_string()]
        );
    }

    #[tokio::test]
    async fn decode_failure_does_not_disable_other_bindings() {
        let registry = ChannelRegistry::new();
        let seen = Arc::new(Mutex::new(0u32));
        let seen_by_number = seen.clone();
        // First binding expects a number and will fail to decode strings.
        registry.on("ch", move |_value: u64| {
            *seen_by_number.lock().unwrap() += 100;
            Ok(())
        });
        let seen_by_string = seen.clone();
        registry.on("ch", move |_value: String| {
            *seen_by_string.lock().unwrap() += 1;
            Ok(())
        });

        registry.dispatch("ch", &serde_json::json!("text")).await;
        registry.dispatch("ch", &serde_json::json!("more")).await;
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn once_binding_fires_exactly_once_then_retracts() {
        let registry = ChannelRegistry::new();
        let count = Arc::new(Mutex::new(0u32));
        let count_clone = count.clone();
        registry.once("redirect", move |_url: String| {
            *count_clone.lock().unwrap() += 1;
            Ok(())
        });
        assert_eq!(registry.binding_count("redirect"), 1);

        registry.dispatch("redirect", &serde_json::json!("/a")).await;
        registry.dispatch("redirect", &serde_json::json!("/b")).await;

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(registry.binding_count("redirect"), 0);
    }

    #[tokio::test]
    async fn once_binding_survives_a_malformed_delivery() {
        let registry = ChannelRegistry::new();
        let count = Arc::new(Mutex::new(0u32));
        let count_clone = count.clone();
        registry.once("redirect", move |_url: String| {
            *count_clone.lock().unwrap() += 1;
            Ok(())
        });

        registry.dispatch("redirect", &serde_json::json!(17)).await;
        assert_eq!(registry.binding_count("redirect"), 1);

        registry.dispatch("redirect", &serde_json::json!("/lobby")).await;
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(registry.binding_count("redirect"), 0);
    }

    #[tokio::test]
    async fn remove_retracts_a_single_binding() {
        let registry = ChannelRegistry::new();
        let (log, handler) = recorder();
        let keep = registry.on("ch", handler("keep"));
        let drop_me = registry.on("ch", handler("drop"));

        assert!(registry.remove(&drop_me));
        assert!(!registry.remove(&drop_me));

        registry.dispatch("ch", &serde_json::json!("x")).await;
        assert_eq!(*log.lock().unwrap(), vec!["keep:x".to_string()]);
        assert!(registry.remove(&keep));
        assert_eq!(registry.binding_count("ch"), 0);
    }

    #[tokio::test]
    async fn reset_clears_every_channel() {
        let registry = ChannelRegistry::new();
        let (_log, handler) = recorder();
        registry.on("a", handler("a"));
        registry.on("b", handler("b"));
        assert_eq!(registry.stats().total_bindings, 2);

        registry.reset();
        assert_eq!(registry.stats().total_bindings, 0);
        assert_eq!(registry.dispatch("a", &serde_json::json!("x")).await, 0);
    }

    #[tokio::test]
    async fn stats_track_dispatches() {
        let registry = ChannelRegistry::new();
        let (_log, handler) = recorder();
        registry.on("ch", handler("h"));
        registry.dispatch("ch", &serde_json::json!("1")).await;
        registry.dispatch("other", &serde_json::json!("2")).await;

        let stats = registry.stats();
        assert_eq!(stats.total_bindings, 1);
        assert_eq!(stats.events_dispatched, 2);
    }
}
