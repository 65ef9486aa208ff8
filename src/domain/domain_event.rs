//! Domain events emitted after event and ticket mutations.
//!
//! Every mutation publishes a [`DomainEvent`] through the
//! [`super::EventBus`]. Organizers receive the events of their own
//! events over the WebSocket feed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, TicketId, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A draft event was created.
    EventCreated {
        /// Event identifier.
        event_id: EventId,
        /// Owning organizer.
        organizer_id: UserId,
        /// Event name.
        name: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Event details were edited.
    EventUpdated {
        /// Event identifier.
        event_id: EventId,
        /// Owning organizer.
        organizer_id: UserId,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The published flag changed.
    PublishChanged {
        /// Event identifier.
        event_id: EventId,
        /// Owning organizer.
        organizer_id: UserId,
        /// New value of the flag.
        is_published: bool,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An event was hard-deleted. Its tickets remain.
    EventDeleted {
        /// Event identifier.
        event_id: EventId,
        /// Owning organizer.
        organizer_id: UserId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A participant registered and received a ticket.
    TicketIssued {
        /// Event identifier.
        event_id: EventId,
        /// Owning organizer of the event.
        organizer_id: UserId,
        /// New ticket.
        ticket_id: TicketId,
        /// Participant name snapshot.
        participant_name: String,
        /// Issue timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the event id this notification concerns.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::EventCreated { event_id, .. }
            | Self::EventUpdated { event_id, .. }
            | Self::PublishChanged { event_id, .. }
            | Self::EventDeleted { event_id, .. }
            | Self::TicketIssued { event_id, .. } => *event_id,
        }
    }

    /// Returns the organizer who owns the event.
    #[must_use]
    pub fn organizer_id(&self) -> UserId {
        match self {
            Self::EventCreated { organizer_id, .. }
            | Self::EventUpdated { organizer_id, .. }
            | Self::PublishChanged { organizer_id, .. }
            | Self::EventDeleted { organizer_id, .. }
            | Self::TicketIssued { organizer_id, .. } => *organizer_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EventCreated { .. } => "event_created",
            Self::EventUpdated { .. } => "event_updated",
            Self::PublishChanged { .. } => "publish_changed",
            Self::EventDeleted { .. } => "event_deleted",
            Self::TicketIssued { .. } => "ticket_issued",
        }
    }
}
