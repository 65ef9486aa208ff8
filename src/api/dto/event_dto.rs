//! Event DTOs for organizer and participant endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ticket_dto::TicketDto;
use crate::domain::{Event, EventDetails, Ticket, TicketStatus};
use crate::service::Dashboard;

/// Request body for `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventRequest {
    /// Event name.
    pub name: String,
    /// Calendar date (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Venue.
    pub location: String,
    /// Ticket price in whole currency units.
    pub price: u64,
    /// Short description.
    #[serde(default)]
    pub description: String,
}

impl From<EventRequest> for EventDetails {
    fn from(r: EventRequest) -> Self {
        Self {
            name: r.name,
            date: r.date,
            location: r.location,
            price: r.price,
            description: r.description,
        }
    }
}

/// Event view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDto {
    /// Event id.
    pub id: Uuid,
    /// Event name.
    pub name: String,
    /// Calendar date.
    pub date: NaiveDate,
    /// Venue.
    pub location: String,
    /// Ticket price.
    pub price: u64,
    /// Short description.
    pub description: String,
    /// Owning organizer.
    pub organizer_id: Uuid,
    /// Publication flag.
    pub is_published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(e: Event) -> Self {
        Self {
            id: *e.id.as_uuid(),
            name: e.details.name,
            date: e.details.date,
            location: e.details.location,
            price: e.details.price,
            description: e.details.description,
            organizer_id: *e.organizer_id.as_uuid(),
            is_published: e.is_published,
            created_at: e.created_at,
        }
    }
}

/// Event list wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events in display order.
    pub data: Vec<EventDto>,
}

impl From<Vec<Event>> for EventListResponse {
    fn from(events: Vec<Event>) -> Self {
        Self {
            data: events.into_iter().map(EventDto::from).collect(),
        }
    }
}

/// Response body for `GET /organizer/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Published events, latest date first.
    pub published: Vec<EventDto>,
    /// Drafts, latest date first.
    pub drafts: Vec<EventDto>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            published: d.published.into_iter().map(EventDto::from).collect(),
            drafts: d.drafts.into_iter().map(EventDto::from).collect(),
        }
    }
}

/// One attendee row.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendeeDto {
    /// Ticket id.
    pub ticket_id: Uuid,
    /// Participant identity.
    pub user_id: Uuid,
    /// Participant name at registration time.
    pub participant_name: String,
    /// Participant email at registration time.
    pub participant_email: String,
    /// Ticket status.
    pub status: TicketStatus,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

impl From<Ticket> for AttendeeDto {
    fn from(t: Ticket) -> Self {
        Self {
            ticket_id: *t.id.as_uuid(),
            user_id: *t.user_id.as_uuid(),
            participant_name: t.participant_name,
            participant_email: t.participant_email,
            status: t.status,
            registered_at: t.created_at,
        }
    }
}

/// Response body for `GET /events/{id}/attendees`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendeesResponse {
    /// The event.
    pub event: EventDto,
    /// Number of attendees.
    pub total: usize,
    /// Attendees, unordered.
    pub attendees: Vec<AttendeeDto>,
}

/// Response body for `GET /events/{id}/registration`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationStatusResponse {
    /// Event id.
    pub event_id: Uuid,
    /// Whether the caller holds a ticket.
    pub registered: bool,
}

/// Response body for `POST /events/{id}/registration`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    /// `registered` or `already_registered`.
    pub status: &'static str,
    /// The issued or existing ticket.
    pub ticket: TicketDto,
    /// Where the caller's tickets are listed.
    pub tickets_path: &'static str,
}
