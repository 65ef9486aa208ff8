//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every event or
//! ticket mutation publishes a [`DomainEvent`] through the bus, and every
//! organizer WebSocket connection subscribes to it.

use tokio::sync::broadcast;

use super::DomainEvent;
use crate::config::EVENT_BUS_CAPACITY_RANGE;

/// Broadcast bus for [`DomainEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity, clamped
    /// to [`EVENT_BUS_CAPACITY_RANGE`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(
            *EVENT_BUS_CAPACITY_RANGE.start(),
            *EVENT_BUS_CAPACITY_RANGE.end(),
        );
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. With no
    /// receivers the event is dropped.
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventId, UserId};
    use chrono::Utc;

    fn make_event(event_id: EventId) -> DomainEvent {
        DomainEvent::PublishChanged {
            event_id,
            organizer_id: UserId::new(),
            is_published: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn extreme_capacities_are_clamped() {
        let tiny = EventBus::new(0);
        let huge = EventBus::new(usize::MAX);
        assert_eq!(tiny.receiver_count(), 0);
        assert_eq!(huge.receiver_count(), 0);
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event(EventId::new())), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let id = EventId::new();
        bus.publish(make_event(id));

        let Ok(event) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(event.event_id(), id);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(make_event(EventId::new())), 1);
    }
}
