//! Per-connection subscription manager.
//!
//! Tracks which event IDs an organizer connection follows. The owner
//! check happens before the subscription filter, so the wildcard never
//! reaches beyond the organizer's own events.

use std::collections::HashSet;

use crate::domain::{DomainEvent, EventId, UserId};

/// Subscriptions of a single organizer connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    organizer_id: UserId,
    event_ids: HashSet<EventId>,
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates an empty subscription set for `organizer_id`.
    #[must_use]
    pub fn new(organizer_id: UserId) -> Self {
        Self {
            organizer_id,
            event_ids: HashSet::new(),
            subscribe_all: false,
        }
    }

    /// Adds event IDs; `wildcard` follows every own event.
    pub fn subscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.event_ids.extend(ids.iter().copied());
    }

    /// Removes event IDs; `wildcard` clears the wildcard.
    pub fn unsubscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.event_ids.remove(id);
        }
    }

    /// Whether `event` should be forwarded on this connection.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        event.organizer_id() == self.organizer_id
            && (self.subscribe_all || self.event_ids.contains(&event.event_id()))
    }

    /// Number of explicitly subscribed event IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.event_ids.len()
    }

    /// Whether the wildcard is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn updated(event_id: EventId, organizer_id: UserId) -> DomainEvent {
        DomainEvent::EventUpdated {
            event_id,
            organizer_id,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let me = UserId::new();
        let mgr = SubscriptionManager::new(me);
        assert!(!mgr.matches(&updated(EventId::new(), me)));
    }

    #[test]
    fn specific_event_only() {
        let me = UserId::new();
        let mut mgr = SubscriptionManager::new(me);
        let id = EventId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(&updated(id, me)));
        assert!(!mgr.matches(&updated(EventId::new(), me)));
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn wildcard_is_limited_to_own_events() {
        let me = UserId::new();
        let mut mgr = SubscriptionManager::new(me);
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&updated(EventId::new(), me)));
        assert!(!mgr.matches(&updated(EventId::new(), UserId::new())));
    }

    #[test]
    fn foreign_event_never_matches_even_when_named() {
        let me = UserId::new();
        let mut mgr = SubscriptionManager::new(me);
        let foreign = EventId::new();
        mgr.subscribe(&[foreign], false);
        assert!(!mgr.matches(&updated(foreign, UserId::new())));
    }

    #[test]
    fn unsubscribe_clears_ids_and_wildcard() {
        let me = UserId::new();
        let mut mgr = SubscriptionManager::new(me);
        let id = EventId::new();
        mgr.subscribe(&[id], true);
        mgr.unsubscribe(&[id], true);
        assert!(!mgr.is_subscribed_all());
        assert!(!mgr.matches(&updated(id, me)));
    }
}
