//! Tickets linking one participant to one event.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, Profile, TicketId, UserId};

/// Ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued and valid for entry.
    Paid,
    /// Already used for entry.
    Used,
    /// Awaiting payment.
    Pending,
}

impl TicketStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Used => "used",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`TicketStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket status: {0}")]
pub struct UnknownTicketStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownTicketStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(Self::Paid),
            "used" => Ok(Self::Used),
            "pending" => Ok(Self::Pending),
            other => Err(UnknownTicketStatus(other.to_string())),
        }
    }
}

/// A ticket record.
///
/// `code` is the opaque string encoded into the QR code. Once issuance
/// completes it equals the ticket's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Record id.
    pub id: TicketId,
    /// Event the ticket admits to. May dangle after the event is deleted.
    pub event_id: EventId,
    /// Participant identity.
    pub user_id: UserId,
    /// Participant name at registration time.
    pub participant_name: String,
    /// Participant email at registration time.
    pub participant_email: String,
    /// Current status.
    pub status: TicketStatus,
    /// Server clock at issuance.
    pub created_at: DateTime<Utc>,
    /// Scan token.
    pub code: String,
}

impl Ticket {
    /// Builds a paid ticket whose code is already its own id.
    #[must_use]
    pub fn issue(event_id: EventId, participant: &Profile, now: DateTime<Utc>) -> Self {
        let id = TicketId::new();
        Self {
            id,
            event_id,
            user_id: participant.user_id,
            participant_name: participant.display_name.clone(),
            participant_email: participant.email.clone(),
            status: TicketStatus::Paid,
            created_at: now,
            code: id.to_string(),
        }
    }

    /// Builds a paid ticket with an empty code placeholder, to be stamped
    /// with its id by a second write.
    #[must_use]
    pub fn unstamped(event_id: EventId, participant: &Profile, now: DateTime<Utc>) -> Self {
        Self {
            code: String::new(),
            ..Self::issue(event_id, participant, now)
        }
    }

    /// Returns `true` once the code equals the ticket id.
    #[must_use]
    pub fn is_stamped(&self) -> bool {
        self.code == self.id.to_string()
    }

    /// Returns `true` if the ticket admits entry.
    #[must_use]
    pub fn is_valid_for_entry(&self) -> bool {
        self.status == TicketStatus::Paid && self.is_stamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn participant() -> Profile {
        Profile::new(UserId::new(), "ani@example.com", "Ani Lestari", Role::Participant)
    }

    #[test]
    fn issued_ticket_code_is_its_id() {
        let ticket = Ticket::issue(EventId::new(), &participant(), Utc::now());
        assert_eq!(ticket.code, ticket.id.to_string());
        assert!(ticket.is_stamped());
        assert!(ticket.is_valid_for_entry());
    }

    #[test]
    fn unstamped_ticket_has_empty_code() {
        let ticket = Ticket::unstamped(EventId::new(), &participant(), Utc::now());
        assert!(ticket.code.is_empty());
        assert!(!ticket.is_stamped());
        assert!(!ticket.is_valid_for_entry());
    }

    #[test]
    fn ticket_snapshots_participant() {
        let p = participant();
        let ticket = Ticket::issue(EventId::new(), &p, Utc::now());
        assert_eq!(ticket.user_id, p.user_id);
        assert_eq!(ticket.participant_name, "Ani Lestari");
        assert_eq!(ticket.participant_email, "ani@example.com");
        assert_eq!(ticket.status, TicketStatus::Paid);
    }

    #[test]
    fn used_ticket_is_not_valid() {
        let mut ticket = Ticket::issue(EventId::new(), &participant(), Utc::now());
        ticket.status = TicketStatus::Used;
        assert!(!ticket.is_valid_for_entry());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [TicketStatus::Paid, TicketStatus::Used, TicketStatus::Pending] {
            assert_eq!(status.as_str().parse::<TicketStatus>().ok(), Some(status));
        }
    }
}
