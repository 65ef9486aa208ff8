//! Ticket service: participant ticket views, QR export and scanning.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Event, EventId, Profile, Ticket, TicketId};
use crate::error::TixlyError;
use crate::persistence::{EventStore, TicketStore};
use crate::render::{TicketRenderer, download_file_name};

/// A ticket joined with its event. The event is absent once deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketWithEvent {
    /// Ticket record.
    pub ticket: Ticket,
    /// Event record, if it still exists.
    pub event: Option<Event>,
}

/// Result of looking up a scanned code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Matching ticket.
    pub ticket: Ticket,
    /// Event the ticket admits to.
    pub event: Event,
    /// Whether the ticket admits entry.
    pub valid: bool,
}

/// Exported ticket image.
#[derive(Debug, Clone)]
pub struct QrExport {
    /// Suggested download file name.
    pub file_name: String,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// Read-side ticket operations.
#[derive(Debug, Clone)]
pub struct TicketService {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
    renderer: TicketRenderer,
}

impl TicketService {
    /// Creates a new `TicketService`.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        tickets: Arc<dyn TicketStore>,
        renderer: TicketRenderer,
    ) -> Self {
        Self {
            events,
            tickets,
            renderer,
        }
    }

    /// The participant's tickets joined with their events, newest first.
    /// A failed ticket read yields an empty list; a failed event read
    /// leaves that ticket's event absent.
    pub async fn my_tickets(&self, participant: &Profile) -> Vec<TicketWithEvent> {
        let mut tickets = match self.tickets.find_by_participant(participant.user_id).await {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::error!(
                    user_id = %participant.user_id,
                    error = %e,
                    "failed to load tickets"
                );
                return Vec::new();
            }
        };
        tickets.sort_by_key(|t| Reverse(t.created_at));

        let mut events: HashMap<EventId, Option<Event>> = HashMap::new();
        let mut joined = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let event = match events.get(&ticket.event_id) {
                Some(cached) => cached.clone(),
                None => {
                    let loaded = self.load_event(ticket.event_id).await;
                    events.insert(ticket.event_id, loaded.clone());
                    loaded
                }
            };
            joined.push(TicketWithEvent { ticket, event });
        }
        joined
    }

    /// Loads one of the participant's own tickets with its event.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::TicketNotFound`] if the ticket does not exist
    /// or belongs to someone else.
    pub async fn ticket_for_owner(
        &self,
        participant: &Profile,
        id: TicketId,
    ) -> Result<TicketWithEvent, TixlyError> {
        let ticket = self
            .tickets
            .get(id)
            .await?
            .filter(|t| t.user_id == participant.user_id)
            .ok_or(TixlyError::TicketNotFound)?;
        let event = self.load_event(ticket.event_id).await;
        Ok(TicketWithEvent { ticket, event })
    }

    /// Renders one of the participant's tickets as a padded PNG.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::TicketNotFound`] for a foreign or missing
    /// ticket and [`TixlyError::Render`] if encoding fails.
    pub async fn export_qr(
        &self,
        participant: &Profile,
        id: TicketId,
    ) -> Result<QrExport, TixlyError> {
        let TicketWithEvent { ticket, event } = self.ticket_for_owner(participant, id).await?;
        let png = self.renderer.export_png(&ticket.code)?;
        Ok(QrExport {
            file_name: download_file_name(event.as_ref().map(|e| e.details.name.as_str())),
            png,
        })
    }

    /// Looks up a scanned code for the organizer at the door. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::TicketNotFound`] for an unknown code or a
    /// ticket whose event is gone, and [`TixlyError::NotEventOwner`] when
    /// the ticket belongs to someone else's event.
    pub async fn scan(&self, organizer: &Profile, code: &str) -> Result<ScanResult, TixlyError> {
        let ticket = self
            .tickets
            .find_by_code(code.trim())
            .await?
            .ok_or(TixlyError::TicketNotFound)?;
        let event = self
            .events
            .get(ticket.event_id)
            .await?
            .ok_or(TixlyError::TicketNotFound)?;
        if !event.is_owned_by(organizer.user_id) {
            return Err(TixlyError::NotEventOwner(event.id));
        }

        let valid = ticket.is_valid_for_entry();
        tracing::info!(ticket_id = %ticket.id, event_id = %event.id, valid, "ticket scanned");
        Ok(ScanResult {
            ticket,
            event,
            valid,
        })
    }

    async fn load_event(&self, id: EventId) -> Option<Event> {
        match self.events.get(id).await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(event_id = %id, error = %e, "failed to load ticket event");
                None
            }
        }
    }
}
