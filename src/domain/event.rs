//! Event records owned by organizers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, UserId};
use crate::error::TixlyError;

/// Maximum length of an event name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of the short description.
pub const MAX_DESCRIPTION_LEN: usize = 2_000;

/// Highest accepted ticket price. Prices are stored as signed 64-bit
/// integers.
pub const MAX_PRICE: u64 = i64::MAX.unsigned_abs();

/// Organizer-editable fields of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Event name.
    pub name: String,
    /// Calendar date the event takes place on.
    pub date: NaiveDate,
    /// Venue.
    pub location: String,
    /// Ticket price in whole currency units.
    pub price: u64,
    /// Short description.
    pub description: String,
}

impl EventDetails {
    /// Trims text fields and checks they are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::InvalidRequest`] when the name or location is
    /// empty, a field exceeds its maximum length, or the price is above
    /// [`MAX_PRICE`].
    pub fn validated(self) -> Result<Self, TixlyError> {
        let name = self.name.trim().to_string();
        let location = self.location.trim().to_string();
        let description = self.description.trim().to_string();

        if name.is_empty() {
            return Err(TixlyError::InvalidRequest("event name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TixlyError::InvalidRequest(format!(
                "event name exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if location.is_empty() {
            return Err(TixlyError::InvalidRequest("event location is required".to_string()));
        }
        if self.price > MAX_PRICE {
            return Err(TixlyError::InvalidRequest(format!("price exceeds {MAX_PRICE}")));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TixlyError::InvalidRequest(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        Ok(Self {
            name,
            date: self.date,
            location,
            price: self.price,
            description,
        })
    }
}

/// An event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Record id.
    pub id: EventId,
    /// Editable fields.
    #[serde(flatten)]
    pub details: EventDetails,
    /// Owning organizer.
    pub organizer_id: UserId,
    /// Draft until explicitly published.
    pub is_published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new draft owned by `organizer_id`.
    #[must_use]
    pub fn draft(organizer_id: UserId, details: EventDetails) -> Self {
        Self {
            id: EventId::new(),
            details,
            organizer_id,
            is_published: false,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if `user_id` owns this event.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.organizer_id == user_id
    }
}
