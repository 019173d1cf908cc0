//! Queue event emitter port.
//!
//! This port abstracts notification delivery, allowing the queue manager to
//! publish job events without coupling to a transport (terminal, channel, UI).

use tokio::sync::broadcast;

use crate::download::QueueEvent;

/// Default capacity of a [`BroadcastEmitter`] channel.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Port for emitting queue events.
///
/// `emit` is called from worker tasks and from inside the engine's progress
/// hook, so it must not block.
pub trait QueueEventEmitterPort: Send + Sync {
    /// Emit a queue event.
    fn emit(&self, event: QueueEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn QueueEventEmitterPort>;
}

/// A no-op emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopQueueEmitter;

impl NoopQueueEmitter {
    /// Create a new no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueueEventEmitterPort for NoopQueueEmitter {
    fn emit(&self, _event: QueueEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn QueueEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Multi-consumer emitter backed by a `tokio::sync::broadcast` channel.
///
/// Each subscriber sees events in emission order. A subscriber that falls
/// more than the channel capacity behind observes `RecvError::Lagged` and
/// loses the oldest events; size the capacity for the slowest consumer.
#[derive(Clone)]
pub struct BroadcastEmitter {
    tx: broadcast::Sender<QueueEvent>,
}

impl BroadcastEmitter {
    /// Create an emitter with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new consumer. It only sees events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl QueueEventEmitterPort for BroadcastEmitter {
    fn emit(&self, event: QueueEvent) {
        // Err only means nobody is listening right now.
        if self.tx.send(event).is_err() {
            tracing::trace!(target: "vidfetch.queue", "Queue event dropped: no subscribers");
        }
    }

    fn clone_box(&self) -> Box<dyn QueueEventEmitterPort> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::JobId;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopQueueEmitter::new();
        emitter.emit(QueueEvent::completed(JobId::new()));
        let _boxed: Box<dyn QueueEventEmitterPort> = emitter.clone_box();
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_fail() {
        let emitter = BroadcastEmitter::new(4);
        emitter.emit(QueueEvent::completed(JobId::new()));
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_events_in_order() {
        let emitter = BroadcastEmitter::new(16);
        let mut a = emitter.subscribe();
        let mut b = emitter.subscribe();
        let id = JobId::new();

        let port: Box<dyn QueueEventEmitterPort> = emitter.clone_box();
        port.emit(QueueEvent::added(id, "https://example.com"));
        port.emit(QueueEvent::completed(id));

        for rx in [&mut a, &mut b] {
            assert!(matches!(rx.recv().await.unwrap(), QueueEvent::JobAdded { .. }));
            assert!(matches!(rx.recv().await.unwrap(), QueueEvent::JobCompleted { .. }));
        }
    }
}
