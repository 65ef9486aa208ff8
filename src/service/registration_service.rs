//! Registration flow: check for an existing ticket, then issue one.

use std::sync::Arc;

use chrono::Utc;

use crate::config::IssuanceMode;
use crate::domain::{DomainEvent, EventBus, EventId, Profile, Ticket, UserId};
use crate::error::TixlyError;
use crate::persistence::{EventStore, InsertOutcome, TicketStore};

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new ticket was issued.
    Registered(Ticket),
    /// The participant already held a ticket for the event.
    AlreadyRegistered(Ticket),
}

impl RegistrationOutcome {
    /// The issued or pre-existing ticket.
    #[must_use]
    pub fn ticket(&self) -> &Ticket {
        match self {
            Self::Registered(t) | Self::AlreadyRegistered(t) => t,
        }
    }
}

/// Issues tickets to participants.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
    event_bus: EventBus,
    mode: IssuanceMode,
}

impl RegistrationService {
    /// Creates a new `RegistrationService` writing tickets in `mode`.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        tickets: Arc<dyn TicketStore>,
        event_bus: EventBus,
        mode: IssuanceMode,
    ) -> Self {
        Self {
            events,
            tickets,
            event_bus,
            mode,
        }
    }

    /// Configured issuance mode.
    #[must_use]
    pub const fn mode(&self) -> IssuanceMode {
        self.mode
    }

    /// Registers `participant` for the event.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::EventNotFound`] for a missing event,
    /// [`TixlyError::EventNotPublished`] for a draft and
    /// [`TixlyError::RegistrationFailed`] when the ticket lookup or any
    /// ticket write fails.
    pub async fn register(
        &self,
        participant: &Profile,
        event_id: EventId,
    ) -> Result<RegistrationOutcome, TixlyError> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(TixlyError::EventNotFound(event_id))?;
        if !event.is_published {
            return Err(TixlyError::EventNotPublished(event_id));
        }

        let user_id = participant.user_id;
        let existing = self
            .tickets
            .find_by_participant_and_event(user_id, event_id)
            .await
            .map_err(|e| {
                tracing::error!(%user_id, %event_id, error = %e, "ticket lookup failed");
                TixlyError::RegistrationFailed
            })?;
        if let Some(ticket) = existing {
            tracing::debug!(%user_id, %event_id, "already registered");
            return Ok(RegistrationOutcome::AlreadyRegistered(ticket));
        }

        let outcome = match self.mode {
            IssuanceMode::Atomic => self.issue_atomic(participant, event_id).await?,
            IssuanceMode::Legacy => self.issue_legacy(participant, event_id).await?,
        };

        if let RegistrationOutcome::Registered(ticket) = &outcome {
            let _ = self.event_bus.publish(DomainEvent::TicketIssued {
                event_id,
                organizer_id: event.organizer_id,
                ticket_id: ticket.id,
                participant_name: ticket.participant_name.clone(),
                timestamp: Utc::now(),
            });
            tracing::info!(ticket_id = %ticket.id, %user_id, %event_id, "ticket issued");
        }
        Ok(outcome)
    }

    /// Returns `true` if the participant holds a ticket for the event. A
    /// failed read counts as not registered.
    pub async fn is_registered(&self, user_id: UserId, event_id: EventId) -> bool {
        match self
            .tickets
            .find_by_participant_and_event(user_id, event_id)
            .await
        {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::error!(%user_id, %event_id, error = %e, "registration check failed");
                false
            }
        }
    }

    async fn issue_atomic(
        &self,
        participant: &Profile,
        event_id: EventId,
    ) -> Result<RegistrationOutcome, TixlyError> {
        let ticket = Ticket::issue(event_id, participant, Utc::now());
        match self.tickets.insert_unique(&ticket).await {
            Ok(InsertOutcome::Inserted(ticket)) => Ok(RegistrationOutcome::Registered(ticket)),
            Ok(InsertOutcome::Conflict(winner)) => {
                tracing::debug!(
                    user_id = %participant.user_id,
                    %event_id,
                    "lost registration race"
                );
                Ok(RegistrationOutcome::AlreadyRegistered(winner))
            }
            Err(e) => {
                tracing::error!(
                    user_id = %participant.user_id,
                    %event_id,
                    error = %e,
                    "ticket write failed"
                );
                Err(TixlyError::RegistrationFailed)
            }
        }
    }

    /// Two writes, no uniqueness guarantee beyond the pre-check and no
    /// rollback if the second write fails.
    async fn issue_legacy(
        &self,
        participant: &Profile,
        event_id: EventId,
    ) -> Result<RegistrationOutcome, TixlyError> {
        let mut ticket = Ticket::unstamped(event_id, participant, Utc::now());
        if let Err(e) = self.tickets.insert(&ticket).await {
            tracing::error!(
                user_id = %participant.user_id,
                %event_id,
                error = %e,
                "ticket write failed"
            );
            return Err(TixlyError::RegistrationFailed);
        }

        let code = ticket.id.to_string();
        if let Err(e) = self.tickets.set_code(ticket.id, &code).await {
            tracing::error!(ticket_id = %ticket.id, error = %e, "ticket code write failed");
            return Err(TixlyError::RegistrationFailed);
        }
        ticket.code = code;
        Ok(RegistrationOutcome::Registered(ticket))
    }
}
