//! Event service: organizer dashboard operations and public browsing.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::{DomainEvent, Event, EventBus, EventDetails, EventId, Profile, Ticket, UserId};
use crate::error::TixlyError;
use crate::persistence::{EventStore, TicketStore};

/// An organizer's events, split by publication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    /// Published events, latest date first.
    pub published: Vec<Event>,
    /// Drafts, latest date first.
    pub drafts: Vec<Event>,
}

/// Orchestration layer for event records.
///
/// Every mutation checks ownership, writes through the [`EventStore`],
/// emits a [`DomainEvent`] and returns.
#[derive(Debug, Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
    event_bus: EventBus,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        tickets: Arc<dyn TicketStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            events,
            tickets,
            event_bus,
        }
    }

    /// Creates a draft event owned by `organizer`.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::InvalidRequest`] on invalid details and
    /// [`TixlyError::Store`] on write failure.
    pub async fn create_event(
        &self,
        organizer: &Profile,
        details: EventDetails,
    ) -> Result<Event, TixlyError> {
        let event = Event::draft(organizer.user_id, details.validated()?);
        self.events.insert(&event).await?;

        let _ = self.event_bus.publish(DomainEvent::EventCreated {
            event_id: event.id,
            organizer_id: event.organizer_id,
            name: event.details.name.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %event.id, organizer_id = %event.organizer_id, "event created");
        Ok(event)
    }

    /// Overwrites the editable fields of an owned event. The published
    /// flag is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::EventNotFound`], [`TixlyError::NotEventOwner`],
    /// [`TixlyError::InvalidRequest`] or [`TixlyError::Store`].
    pub async fn update_event(
        &self,
        organizer: &Profile,
        id: EventId,
        details: EventDetails,
    ) -> Result<Event, TixlyError> {
        let details = details.validated()?;
        self.owned_event(organizer.user_id, id).await?;
        let event = self.events.update_details(id, &details).await?;

        let _ = self.event_bus.publish(DomainEvent::EventUpdated {
            event_id: id,
            organizer_id: event.organizer_id,
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %id, "event updated");
        Ok(event)
    }

    /// Sets the published flag of an owned event.
    ///
    /// Publishing needs no confirmation. Unpublishing hides the event
    /// from participants and requires `confirmed`.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::ConfirmationRequired`] when unpublishing
    /// without confirmation, plus the errors of ownership lookup and the
    /// store write.
    pub async fn set_published(
        &self,
        organizer: &Profile,
        id: EventId,
        publish: bool,
        confirmed: bool,
    ) -> Result<Event, TixlyError> {
        if !publish && !confirmed {
            return Err(TixlyError::ConfirmationRequired("unpublish this event"));
        }
        let mut event = self.owned_event(organizer.user_id, id).await?;
        self.events.set_published(id, publish).await?;
        event.is_published = publish;

        let _ = self.event_bus.publish(DomainEvent::PublishChanged {
            event_id: id,
            organizer_id: event.organizer_id,
            is_published: publish,
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %id, is_published = publish, "publish flag changed");
        Ok(event)
    }

    /// Hard-deletes an owned event. Its tickets are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::ConfirmationRequired`] without confirmation,
    /// plus the errors of ownership lookup and the store write.
    pub async fn delete_event(
        &self,
        organizer: &Profile,
        id: EventId,
        confirmed: bool,
    ) -> Result<(), TixlyError> {
        if !confirmed {
            return Err(TixlyError::ConfirmationRequired("delete this event"));
        }
        let event = self.owned_event(organizer.user_id, id).await?;
        self.events.delete(id).await?;

        let _ = self.event_bus.publish(DomainEvent::EventDeleted {
            event_id: id,
            organizer_id: event.organizer_id,
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Published events, earliest date first. A read failure yields an
    /// empty list.
    pub async fn list_published(&self) -> Vec<Event> {
        match self.events.find_by_published(true).await {
            Ok(mut events) => {
                events.sort_by_key(|e| (e.details.date, e.created_at));
                events
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load published events");
                Vec::new()
            }
        }
    }

    /// Loads one event. Drafts are visible only to their owner.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::EventNotFound`] for a missing event or a draft
    /// the viewer does not own.
    pub async fn get_event(
        &self,
        id: EventId,
        viewer: Option<&Profile>,
    ) -> Result<Event, TixlyError> {
        let event = self
            .events
            .get(id)
            .await?
            .ok_or(TixlyError::EventNotFound(id))?;
        if event.is_published || viewer.is_some_and(|v| event.is_owned_by(v.user_id)) {
            Ok(event)
        } else {
            Err(TixlyError::EventNotFound(id))
        }
    }

    /// The organizer's events partitioned into published and drafts, each
    /// latest date first. A read failure yields an empty dashboard.
    pub async fn dashboard(&self, organizer: &Profile) -> Dashboard {
        let events = match self.events.find_by_organizer(organizer.user_id).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(
                    organizer_id = %organizer.user_id,
                    error = %e,
                    "failed to load dashboard"
                );
                return Dashboard::default();
            }
        };

        let (mut published, mut drafts): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| e.is_published);
        published.sort_by_key(|e| Reverse((e.details.date, e.created_at)));
        drafts.sort_by_key(|e| Reverse((e.details.date, e.created_at)));
        Dashboard { published, drafts }
    }

    /// All tickets of an owned event, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::EventNotFound`] or
    /// [`TixlyError::NotEventOwner`]. A failed ticket read yields an empty
    /// list.
    pub async fn attendees(
        &self,
        organizer: &Profile,
        id: EventId,
    ) -> Result<(Event, Vec<Ticket>), TixlyError> {
        let event = self.owned_event(organizer.user_id, id).await?;
        let tickets = match self.tickets.find_by_event(id).await {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::error!(event_id = %id, error = %e, "failed to load attendees");
                Vec::new()
            }
        };
        Ok((event, tickets))
    }

    async fn owned_event(&self, organizer_id: UserId, id: EventId) -> Result<Event, TixlyError> {
        let event = self
            .events
            .get(id)
            .await?
            .ok_or(TixlyError::EventNotFound(id))?;
        if !event.is_owned_by(organizer_id) {
            tracing::warn!(event_id = %id, %organizer_id, "ownership check failed");
            return Err(TixlyError::NotEventOwner(id));
        }
        Ok(event)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Role;
    use crate::persistence::{MemoryEventStore, MemoryTicketStore, TicketStore};

    struct Fixture {
        service: EventService,
        tickets: Arc<MemoryTicketStore>,
        bus: EventBus,
        organizer: Profile,
    }

    fn fixture() -> Fixture {
        let tickets = Arc::new(MemoryTicketStore::new());
        let bus = EventBus::new(64);
        let service = EventService::new(
            Arc::new(MemoryEventStore::new()),
            Arc::clone(&tickets) as Arc<dyn TicketStore>,
            bus.clone(),
        );
        Fixture {
            service,
            tickets,
            bus,
            organizer: Profile::new(UserId::new(), "budi@example.com", "Budi", Role::Organizer),
        }
    }

    fn details(name: &str, day: u32) -> EventDetails {
        let Some(date) = NaiveDate::from_ymd_opt(2026, 12, day) else {
            panic!("valid date");
        };
        EventDetails {
            name: name.to_string(),
            date,
            location: "Jakarta".to_string(),
            price: 50_000,
            description: String::new(),
        }
    }

    async fn create(f: &Fixture, name: &str, day: u32) -> Event {
        let Ok(event) = f.service.create_event(&f.organizer, details(name, day)).await else {
            panic!("create failed");
        };
        event
    }

    #[tokio::test]
    async fn created_events_are_drafts() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        let event = create(&f, "Tech Meetup", 5).await;
        assert!(!event.is_published);
        assert_eq!(event.organizer_id, f.organizer.user_id);

        let Ok(DomainEvent::EventCreated { event_id, .. }) = rx.recv().await else {
            panic!("expected EventCreated");
        };
        assert_eq!(event_id, event.id);
    }

    #[tokio::test]
    async fn publish_toggle_changes_only_the_flag() {
        let f = fixture();
        let event = create(&f, "Tech Meetup", 5).await;

        let Ok(published) = f.service.set_published(&f.organizer, event.id, true, false).await
        else {
            panic!("publish failed");
        };
        assert!(published.is_published);
        let Ok(reloaded) = f.service.get_event(event.id, None).await else {
            panic!("published event should be visible");
        };
        assert_eq!(
            Event {
                is_published: false,
                ..reloaded.clone()
            },
            event
        );

        let unconfirmed = f.service.set_published(&f.organizer, event.id, false, false).await;
        assert!(matches!(unconfirmed, Err(TixlyError::ConfirmationRequired(_))));

        let Ok(unpublished) = f.service.set_published(&f.organizer, event.id, false, true).await
        else {
            panic!("unpublish failed");
        };
        assert_eq!(unpublished, event);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_others() {
        let f = fixture();
        let event = create(&f, "Secret Gig", 5).await;
        let stranger = Profile::new(UserId::new(), "x@example.com", "X", Role::Participant);

        assert!(f.service.get_event(event.id, Some(&f.organizer)).await.is_ok());
        assert!(matches!(
            f.service.get_event(event.id, Some(&stranger)).await,
            Err(TixlyError::EventNotFound(_))
        ));
        assert!(f.service.list_published().await.is_empty());
    }

    #[tokio::test]
    async fn only_the_owner_may_edit() {
        let f = fixture();
        let event = create(&f, "Tech Meetup", 5).await;
        let rival = Profile::new(UserId::new(), "c@example.com", "Citra", Role::Organizer);

        let result = f.service.update_event(&rival, event.id, details("Hijacked", 6)).await;
        assert!(matches!(result, Err(TixlyError::NotEventOwner(_))));

        let Ok(updated) = f
            .service
            .update_event(&f.organizer, event.id, details("Tech Meetup Vol. 2", 6))
            .await
        else {
            panic!("owner update failed");
        };
        assert_eq!(updated.details.name, "Tech Meetup Vol. 2");
        assert!(!updated.is_published);
    }

    #[tokio::test]
    async fn dashboard_partitions_and_sorts_descending() {
        let f = fixture();
        let early = create(&f, "Early", 1).await;
        let late = create(&f, "Late", 20).await;
        let draft_mid = create(&f, "Mid Draft", 10).await;
        let draft_late = create(&f, "Late Draft", 25).await;
        let _ = f.service.set_published(&f.organizer, early.id, true, false).await;
        let _ = f.service.set_published(&f.organizer, late.id, true, false).await;

        let dashboard = f.service.dashboard(&f.organizer).await;
        let published: Vec<_> = dashboard.published.iter().map(|e| e.id).collect();
        let drafts: Vec<_> = dashboard.drafts.iter().map(|e| e.id).collect();
        assert_eq!(published, vec![late.id, early.id]);
        assert_eq!(drafts, vec![draft_late.id, draft_mid.id]);
    }

    #[tokio::test]
    async fn browse_sorts_ascending() {
        let f = fixture();
        let later = create(&f, "Later", 20).await;
        let sooner = create(&f, "Sooner", 2).await;
        let _ = f.service.set_published(&f.organizer, later.id, true, false).await;
        let _ = f.service.set_published(&f.organizer, sooner.id, true, false).await;

        let ids: Vec<_> = f.service.list_published().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_keeps_tickets() {
        let f = fixture();
        let event = create(&f, "Tech Meetup", 5).await;
        let participant = Profile::new(UserId::new(), "a@example.com", "Ani", Role::Participant);
        let ticket = Ticket::issue(event.id, &participant, Utc::now());
        let _ = f.tickets.insert(&ticket).await;

        let unconfirmed = f.service.delete_event(&f.organizer, event.id, false).await;
        assert!(matches!(unconfirmed, Err(TixlyError::ConfirmationRequired(_))));

        assert!(f.service.delete_event(&f.organizer, event.id, true).await.is_ok());
        assert!(matches!(
            f.service.get_event(event.id, Some(&f.organizer)).await,
            Err(TixlyError::EventNotFound(_))
        ));
        let orphan = f.tickets.get(ticket.id).await.ok().flatten();
        assert_eq!(orphan.map(|t| t.event_id), Some(event.id));
    }

    #[tokio::test]
    async fn attendees_are_owner_only() {
        let f = fixture();
        let event = create(&f, "Tech Meetup", 5).await;
        let participant = Profile::new(UserId::new(), "a@example.com", "Ani", Role::Participant);
        let _ = f
            .tickets
            .insert(&Ticket::issue(event.id, &participant, Utc::now()))
            .await;

        let Ok((_, tickets)) = f.service.attendees(&f.organizer, event.id).await else {
            panic!("owner should see attendees");
        };
        assert_eq!(tickets.len(), 1);

        let rival = Profile::new(UserId::new(), "c@example.com", "Citra", Role::Organizer);
        assert!(matches!(
            f.service.attendees(&rival, event.id).await,
            Err(TixlyError::NotEventOwner(_))
        ));
    }
}
