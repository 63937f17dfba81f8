//! Typed multicast event streams.
//!
//! An [`EventStream`] is a replay-less publish point: every subscription
//! attached before an emission observes it, in emission order; a subscription
//! attached afterwards never sees it. Built on `tokio::sync::broadcast`, so a
//! subscriber that falls behind is skipped forward (with a [`StreamRecvError::Lagged`]
//! notice) instead of blocking the publisher.

use tokio::sync::broadcast;
use tracing::trace;

/// Error returned by [`StreamSubscription::recv`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreamRecvError {
    /// The stream's publisher was dropped; no further values will arrive.
    #[error("event stream closed")]
    Closed,
    /// The subscriber fell behind and `skipped` values were discarded.
    #[error("event stream lagged, {0} values skipped")]
    Lagged(u64),
}

/// A multicast, non-buffering publish point for one payload type.
pub struct EventStream<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> EventStream<T> {
    /// Creates a stream able to buffer `capacity` in-flight values per
    /// subscriber before lagging kicks in.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attaches a new independent subscriber.
    ///
    /// The subscription only observes values published after this call.
    /// Dropping it unsubscribes; other subscribers are unaffected.
    pub fn subscribe(&self) -> StreamSubscription<T> {
        StreamSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publishes a value to all current subscribers.
    ///
    /// Returns the number of subscribers that will observe it. Publishing
    /// with no subscribers is not an error; the value is simply lost.
    pub fn publish(&self, value: T) -> usize {
        match self.tx.send(value) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("published with no subscribers attached");
                0
            }
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

/// Handle held by one stream subscriber. Dropping it unsubscribes.
pub struct StreamSubscription<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone + Send + 'static> StreamSubscription<T> {
    /// Waits for the next value published after this subscription attached.
    pub async fn recv(&mut self) -> Result<T, StreamRecvError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => StreamRecvError::Closed,
            broadcast::error::RecvError::Lagged(skipped) => StreamRecvError::Lagged(skipped),
        })
    }

    /// Non-blocking variant of [`recv`](Self::recv); `Ok(None)` means no
    /// value is currently pending.
    pub fn try_recv(&mut self) -> Result<Option<T>, StreamRecvError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(StreamRecvError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                Err(StreamRecvError::Lagged(skipped))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_in_emission_order() {
        let stream = EventStream::new(8);
        let mut sub = stream.subscribe();
        stream.publish(1u32);
        stream.publish(2u32);

        assert_eq!(sub.recv().await.unwrap(), 1);
        assert_eq!(sub.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_emissions() {
        let stream = EventStream::new(8);
        let mut early = stream.subscribe();
        stream.publish("first".to_string());

        let mut late = stream.subscribe();
        stream.publish("second".to_string());

        assert_eq!(early.recv().await.unwrap(), "first");
        assert_eq!(early.recv().await.unwrap(), "second");
        assert_eq!(late.recv().await.unwrap(), "second");
        assert_eq!(late.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_are_independent() {
        let stream = EventStream::new(8);
        let mut a = stream.subscribe();
        let mut b = stream.subscribe();
        stream.publish(7u32);

        assert_eq!(a.recv().await.unwrap(), 7);
        assert_eq!(b.recv().await.unwrap(), 7);

        drop(a);
        assert_eq!(stream.publish(8u32), 1);
        assert_eq!(b.recv().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let stream: EventStream<u32> = EventStream::new(8);
        assert_eq!(stream.publish(1), 0);
        let mut sub = stream.subscribe();
        assert_eq!(sub.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag_instead_of_blocking() {
        let stream = EventStream::new(2);
        let mut slow = stream.subscribe();
        for i in 0..5u32 {
            stream.publish(i);
        }

        assert_eq!(slow.recv().await, Err(StreamRecvError::Lagged(3)));
        assert_eq!(slow.recv().await.unwrap(), 3);
        assert_eq!(slow.recv().await.unwrap(), 4);
    }
}
