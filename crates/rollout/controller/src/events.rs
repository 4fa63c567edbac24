//! Event bus for rollout observers
//!
//! Transitions and automation decisions are published as
//! [`RolloutEventEnvelope`]s on a broadcast channel. Sending never fails the
//! caller; having no subscribers is fine.

use rollout_types::{RolloutEvent, RolloutEventEnvelope};
use tokio::sync::broadcast;
use tracing::debug;

/// Channel capacity for the event stream
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcast bus shared by the controller and the trend monitor
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RolloutEventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<RolloutEventEnvelope> {
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event
    pub fn emit(&self, event: RolloutEvent) {
        self.publish(RolloutEventEnvelope::new(event));
    }

    /// Publish an event attributed to an actor
    pub fn emit_by(&self, event: RolloutEvent, actor: &str) {
        self.publish(RolloutEventEnvelope::new(event).with_actor(actor));
    }

    fn publish(&self, envelope: RolloutEventEnvelope) {
        debug!(
            event_id = %envelope.id,
            severity = ?envelope.severity,
            "Publishing rollout event"
        );
        let _ = self.tx.send(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(RolloutEvent::AttemptsReset { previous: 2 });
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event, RolloutEvent::AttemptsReset { previous: 2 });
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(RolloutEvent::AttemptsReset { previous: 0 });
    }
}
