//! Ticket DTOs for participant and scan endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::event_dto::EventDto;
use crate::domain::{Ticket, TicketStatus};
use crate::service::{ScanResult, TicketWithEvent};

/// Ticket view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketDto {
    /// Ticket id.
    pub id: Uuid,
    /// Event id. May refer to a deleted event.
    pub event_id: Uuid,
    /// Participant identity.
    pub user_id: Uuid,
    /// Participant name at registration time.
    pub participant_name: String,
    /// Participant email at registration time.
    pub participant_email: String,
    /// Ticket status.
    pub status: TicketStatus,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
    /// Scan code encoded in the QR image.
    pub code: String,
}

impl From<Ticket> for TicketDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: *t.id.as_uuid(),
            event_id: *t.event_id.as_uuid(),
            user_id: *t.user_id.as_uuid(),
            participant_name: t.participant_name,
            participant_email: t.participant_email,
            status: t.status,
            created_at: t.created_at,
            code: t.code,
        }
    }
}

/// A ticket with its event, if the event still exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyTicketDto {
    /// Ticket.
    pub ticket: TicketDto,
    /// Event, absent once deleted.
    pub event: Option<EventDto>,
    /// Relative URL of the QR download.
    pub qr_path: String,
}

impl From<TicketWithEvent> for MyTicketDto {
    fn from(t: TicketWithEvent) -> Self {
        let qr_path = format!("/api/v1/tickets/{}/qr.png", t.ticket.id);
        Self {
            ticket: t.ticket.into(),
            event: t.event.map(EventDto::from),
            qr_path,
        }
    }
}

/// Response body for `GET /tickets`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyTicketsResponse {
    /// Tickets, newest first.
    pub data: Vec<MyTicketDto>,
}

/// Request body for `POST /tickets/scan`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Code read from the QR image.
    pub code: String,
}

/// Response body for `POST /tickets/scan`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    /// Whether the ticket admits entry.
    pub valid: bool,
    /// Matching ticket.
    pub ticket: TicketDto,
    /// Event the ticket admits to.
    pub event: EventDto,
}

impl From<ScanResult> for ScanResponse {
    fn from(s: ScanResult) -> Self {
        Self {
            valid: s.valid,
            ticket: s.ticket.into(),
            event: s.event.into(),
        }
    }
}
